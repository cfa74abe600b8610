use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid game code: {0}. expected FS22 or FS25")]
    InvalidGame(String),
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("invalid DTM provider code: {0:?}")]
    InvalidDtmCode(String),
    #[error("invalid map size: {0}")]
    InvalidSize(u32),
    #[error("invalid output size: {0}")]
    InvalidOutputSize(u32),
    #[error("invalid rotation: {0}. rotation must be in [0, 359]")]
    InvalidRotation(i32),
    #[error("custom OSM data is not an XML document")]
    InvalidCustomOsm,
    #[error("invalid {field}: {reason}")]
    InvalidSchema { field: &'static str, reason: String },
    #[error("invalid task id: {0:?}")]
    InvalidTaskId(String),
    #[error("unknown task state: {0:?}")]
    UnknownTaskState(String),
}
