use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed drag geometry: {0}")]
    MalformedGeometry(String),

    #[error("Trial setup failed: {0}")]
    Setup(String),

    #[error("No unassigned state names left in context {context}")]
    StatesExhausted { context: usize },

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExpResult<T> = Result<T, ExperimentError>;

pub(crate) fn invalid<T>(msg: impl Into<String>) -> ExpResult<T> {
    Err(ExperimentError::InvalidConfiguration(msg.into()))
}
