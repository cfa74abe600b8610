pub mod api;
pub mod config;

pub use api::{AppState, create_router, cors_layer};
pub use config::ServerConfig;
