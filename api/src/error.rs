use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlidesError>;

#[derive(Debug, Error)]
pub enum SlidesError {
    /// The requested slide or shape does not exist in the presentation.
    #[error("not found: {0}")]
    NotFound(String),

    /// The presentation exists but its layout does not support the
    /// requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A non-2xx answer from the Slides API, decoded from Google's standard
    /// error envelope when possible.
    #[error("API error {code} ({status}): {message}")]
    Api {
        code: u16,
        message: String,
        status: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode API response: {0}")]
    Parse(String),

    #[error(transparent)]
    Auth(#[from] slides_writer_login::LoginError),
}

impl From<reqwest::Error> for SlidesError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SlidesError::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            SlidesError::Network(format!("connection failed: {e}"))
        } else {
            SlidesError::Network(e.to_string())
        }
    }
}
