use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    application::services::registration::RegistrationService,
    domain::{errors::DomainError, models::Account, value_objects::ActivationToken},
};

/// Keeps activation tokens in process memory. Stands in for the external
/// registration service in local runs and tests.
#[derive(Default)]
pub struct InMemoryRegistrationService {
    tokens: Arc<RwLock<HashMap<Uuid, ActivationToken>>>,
}

impl InMemoryRegistrationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn token_for(&self, account_id: &Uuid) -> Option<ActivationToken> {
        self.tokens.read().await.get(account_id).cloned()
    }
}

#[async_trait]
impl RegistrationService for InMemoryRegistrationService {
    async fn create_registration(&self, account: &Account) -> Result<ActivationToken, DomainError> {
        let token = ActivationToken {
            account_id: account.id,
            token: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
        };
        self.tokens.write().await.insert(account.id, token.clone());
        Ok(token)
    }
}
