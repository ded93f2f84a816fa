use lumen_client::api::ApiError;
use lumen_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session is shut down")]
    Closed,
}

impl SessionError {
    /// True when the server rejected the login session (HTTP 401).
    pub fn is_session_expired(&self) -> bool {
        matches!(self, SessionError::Api(err) if err.is_session_expired())
    }
}
