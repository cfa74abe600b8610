mod case;
mod coordinates;
mod error;
mod game;
mod generation_backend;
mod ids;
mod map_size;
mod settings;
mod task_status;

pub use case::{camel_to_snake, snake_case_keys, snake_case_map};
pub use coordinates::Coordinates;
pub use error::DomainError;
pub use game::Game;
pub use generation_backend::{BackendError, GenerationBackend};
pub use ids::TaskId;
pub use map_size::MapSize;
pub use settings::{DEFAULT_DTM_CODE, GenerationPayload, UiSettings, preprocess};
pub use task_status::{TaskState, TaskStatus};
