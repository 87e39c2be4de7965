use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    /// Parse a path id, reporting malformed input as a validation failure.
    pub fn parse_id(raw: &str) -> Result<uuid::Uuid, Self> {
        uuid::Uuid::parse_str(raw.trim()).map_err(|_| Self::Validation(format!("invalid id `{}`", raw)))
    }
}
