use async_trait::async_trait;

use crate::domain::{
    errors::DomainError,
    models::Account,
    value_objects::{ActivationToken, SiteContext},
};

/// Email collaborator. Delivery failures surface as
/// [`DomainError::Email`]; they are never swallowed.
#[async_trait]
pub trait ActivationMailer: Send + Sync {
    async fn send_activation_email(
        &self,
        account: &Account,
        token: &ActivationToken,
        site: &SiteContext,
    ) -> Result<(), DomainError>;
}
