pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod tracker;
pub mod ws_api;

pub use backend::HttpGenerationBackend;
pub use config::GenerationClientConfig;
pub use error::{GenerationError, Result};
pub use events::{EventBroadcaster, EventStream, PollStopReason, TaskEvent};
pub use tracker::{TaskRecord, TaskTracker};
