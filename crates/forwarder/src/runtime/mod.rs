//! Runtime module: process lifecycle: boot, chunk source, serve, shutdown.

pub mod boot;
pub mod source;
pub mod serve;
pub mod stop;
