use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Entity already exists: {0}")]
    Uniqueness(String),
    #[error("Inconsistent state: {0}")]
    Consistency(String),
    #[error("Registration failed: {0}")]
    Registration(String),
    #[error("Activation email failed: {0}")]
    Email(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
