use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not authorized")]
    MissingToken,
    #[error("unauthorized")]
    InvalidToken,
    #[error("forbidden access")]
    Forbidden,
    #[error("token error: {0}")]
    TokenError(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::MissingToken => 1004,
            AuthError::InvalidToken => 1005,
            AuthError::Forbidden => 1006,
            AuthError::TokenError(_) => 1102,
        }
    }
}
