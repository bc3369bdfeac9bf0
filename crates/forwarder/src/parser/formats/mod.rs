/// Per-application format handlers

pub mod broadcast;
pub mod live;
pub mod media;
pub mod plain;
pub mod red5;
pub mod web;

// Re-export handler implementations
pub use broadcast::BroadcasterHandler;
pub use live::LiveManagerHandler;
pub use media::MediaWorkerHandler;
pub use plain::PlainHandler;
pub use red5::Red5Handler;
pub use web::WebFrontHandler;
