use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error {status}: {detail}")]
    Backend { status: u16, detail: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session has no questions")]
    EmptySession,

    #[error("Answer feedback is withheld in test mode")]
    FeedbackWithheld,

    #[error("Unknown quiz mode: {0}")]
    InvalidMode(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
