use async_trait::async_trait;

use crate::domain::{errors::DomainError, models::Account, value_objects::ActivationToken};

/// Registration collaborator. Issues the activation record for a freshly
/// created account; the activation step itself happens outside this crate.
#[async_trait]
pub trait RegistrationService: Send + Sync {
    async fn create_registration(&self, account: &Account) -> Result<ActivationToken, DomainError>;
}
