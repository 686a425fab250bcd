use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("Empty version constraint")]
    Empty,

    #[error("Invalid version constraint \"{0}\"")]
    Invalid(String),

    #[error("Invalid version \"{0}\"")]
    InvalidVersion(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Could not read update data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),
}
