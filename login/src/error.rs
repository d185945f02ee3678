use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("app credentials unreadable: {0}")]
    ConfigMissing(String),

    #[error("authorization failed: {0}")]
    AuthFailed(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("timed out waiting for the OAuth callback")]
    Timeout,

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
