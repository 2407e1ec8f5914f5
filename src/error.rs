use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

/// Failures of the pure derivation functions. Deterministic, so never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Data integrity violation on contest {contest_id}: {detail}")]
    DataIntegrityViolation { contest_id: u64, detail: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed gateway reply: {0}")]
    Rpc(String),

    /// Revert reason or wallet rejection, passed through verbatim.
    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Derive(DeriveError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            AppError::Contract(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Http(_) | AppError::Rpc(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
