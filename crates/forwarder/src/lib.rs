// Domain-driven module structure for the pm2 log forwarder.

// Core
pub mod parser;
pub mod sink;

// Domain modules
pub mod conf;
pub mod service;
pub mod runtime;
