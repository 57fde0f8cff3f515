use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{Account, BasketEntry, Profile, ViewEvent, Workspace};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persists an account together with its profile and personal workspace
    /// in one transaction: afterwards either all three records exist or none
    /// do. A duplicate username or email fails with
    /// [`DomainError::Uniqueness`] and nothing is persisted.
    async fn create_with_profile(
        &self,
        account: &Account,
        profile: &Profile,
        workspace: &Workspace,
    ) -> Result<(), DomainError>;

    async fn get(&self, id: &Uuid) -> Result<Option<Account>, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError>;
    async fn update(&self, account: &Account) -> Result<(), DomainError>;

    /// Cascade-deletes the profile along with its view events and basket
    /// entries; owned workspaces are kept with their owner cleared.
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_account(&self, account_id: &Uuid) -> Result<Option<Profile>, DomainError>;
    async fn update(&self, profile: &Profile) -> Result<(), DomainError>;
}

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> Result<Option<Workspace>, DomainError>;
    async fn update(&self, workspace: &Workspace) -> Result<(), DomainError>;
}

#[async_trait]
pub trait ViewEventRepository: Send + Sync {
    /// Inserts a view event stamped now and trims the profile's log down to
    /// the [`RECENT_VIEWS_LIMIT`](crate::domain::models::RECENT_VIEWS_LIMIT)
    /// newest entries as part of the same write.
    async fn record(&self, profile_id: &Uuid, item_id: &Uuid) -> Result<ViewEvent, DomainError>;

    /// Newest-first.
    async fn list_for_profile(&self, profile_id: &Uuid) -> Result<Vec<ViewEvent>, DomainError>;
}

#[async_trait]
pub trait BasketRepository: Send + Sync {
    /// Fails with [`DomainError::Uniqueness`] when the profile already has an
    /// entry for the question.
    async fn insert(&self, entry: &BasketEntry) -> Result<BasketEntry, DomainError>;

    /// Ordered by `qn_order` ascending.
    async fn list_for_profile(&self, profile_id: &Uuid) -> Result<Vec<BasketEntry>, DomainError>;
}
