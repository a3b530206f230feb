use thiserror::Error;

pub type PluginResult<T> = Result<T, PluginError>;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("query response contains no result sets")]
    MissingQueryResult,

    #[error("invalid form data: {0}")]
    InvalidFormData(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
