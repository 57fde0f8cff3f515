use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    errors::DomainError,
    models::Account,
    repositories::{AccountRepository, ProfileRepository, WorkspaceRepository},
};

/// Saves changes to an existing account and keeps the personal workspace name
/// in sync with the account's first name.
pub struct UpdateAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
    profiles: Arc<dyn ProfileRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
}

impl UpdateAccountUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        profiles: Arc<dyn ProfileRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            workspaces,
        }
    }

    /// Provisioning creates the profile atomically with the account, so an
    /// account without one means the store is corrupt and the rename fails
    /// with [`DomainError::Consistency`] instead of silently skipping. A
    /// profile whose personal workspace has been removed is left alone.
    pub async fn execute(&self, mut account: Account) -> Result<Account, DomainError> {
        account.updated_at = Utc::now();
        self.accounts.update(&account).await?;

        let profile = self
            .profiles
            .find_by_account(&account.id)
            .await?
            .ok_or_else(|| {
                DomainError::Consistency(format!("account {} has no profile", account.id))
            })?;

        let Some(workspace_id) = profile.workspace_id else {
            return Ok(account);
        };
        let mut workspace = self.workspaces.get(&workspace_id).await?.ok_or_else(|| {
            DomainError::Consistency(format!(
                "workspace {workspace_id} referenced by profile {} is missing",
                profile.id
            ))
        })?;

        let name = account.personal_workspace_name();
        if workspace.name != name {
            workspace.name = name;
            workspace.updated_at = Utc::now();
            self.workspaces.update(&workspace).await?;
            tracing::info!(
                account_id = %account.id,
                workspace_id = %workspace.id,
                name = %workspace.name,
                "renamed personal workspace"
            );
        }

        Ok(account)
    }
}
