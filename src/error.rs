use thiserror::Error;

/// Errors returned by the AutoScout24 client
#[derive(Debug, Error)]
pub enum Auto24Error {
    /// Configuration rejected at construction time. Not retried.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// The site served an anti-bot challenge instead of content.
    #[error("reCAPTCHA required: the site served an anti-bot challenge")]
    ReCaptchaRequired,

    /// The initial-state payload was missing on every attempt.
    #[error("search data not found after {attempts} attempt(s)")]
    DataNotFound { attempts: u32 },

    /// The payload parsed but lacks the expected fields.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Auto24Error>;
