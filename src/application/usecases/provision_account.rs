use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    application::services::{mailer::ActivationMailer, registration::RegistrationService},
    domain::{
        errors::DomainError,
        models::{Account, Profile, Workspace},
        repositories::AccountRepository,
        value_objects::SiteContext,
    },
};

pub struct ProvisionAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
    registrations: Arc<dyn RegistrationService>,
    mailer: Arc<dyn ActivationMailer>,
}

pub struct ProvisionAccountRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Already hashed by the authentication layer.
    pub password_hash: String,
    pub site: SiteContext,
    pub notify: bool,
}

impl ProvisionAccountUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        registrations: Arc<dyn RegistrationService>,
        mailer: Arc<dyn ActivationMailer>,
    ) -> Self {
        Self {
            accounts,
            registrations,
            mailer,
        }
    }

    /// Creates an inactive account with its profile and personal workspace in
    /// one storage transaction, then registers an activation token and, when
    /// `notify` is set, emails the activation link.
    ///
    /// The registration and email collaborators sit outside the storage
    /// transaction, so their failures after the commit are surfaced to the
    /// caller while the account stays provisioned and inactive; notification
    /// can then be retried against the existing account.
    pub async fn execute(&self, request: ProvisionAccountRequest) -> Result<Account, DomainError> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash: request.password_hash,
            active: false,
            created_at: now,
            updated_at: now,
        };
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: account.personal_workspace_name(),
            owner_id: Some(account.id),
            created_at: now,
            updated_at: now,
        };
        let mut profile = Profile::new(account.id);
        profile.workspace_id = Some(workspace.id);

        self.accounts
            .create_with_profile(&account, &profile, &workspace)
            .await?;
        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "provisioned inactive account"
        );

        let token = self.registrations.create_registration(&account).await?;

        if request.notify {
            self.mailer
                .send_activation_email(&account, &token, &request.site)
                .await
                .inspect_err(|err| {
                    tracing::warn!(account_id = %account.id, %err, "activation email not sent");
                })?;
        }

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::value_objects::ActivationToken,
        infrastructure::{
            registration::InMemoryRegistrationService, repositories::in_memory::InMemoryStore,
        },
    };

    #[derive(Default)]
    struct RecordingMailer {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl ActivationMailer for RecordingMailer {
        async fn send_activation_email(
            &self,
            _account: &Account,
            _token: &ActivationToken,
            _site: &SiteContext,
        ) -> Result<(), DomainError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl ActivationMailer for FailingMailer {
        async fn send_activation_email(
            &self,
            _account: &Account,
            _token: &ActivationToken,
            _site: &SiteContext,
        ) -> Result<(), DomainError> {
            Err(DomainError::Email("gateway down".to_string()))
        }
    }

    fn site() -> SiteContext {
        SiteContext {
            scheme: "https".to_string(),
            domain: "editor.example".to_string(),
            name: "Question Editor".to_string(),
        }
    }

    fn request(username: &str, first_name: &str, notify: bool) -> ProvisionAccountRequest {
        ProvisionAccountRequest {
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: "Smith".to_string(),
            email: format!("{username}@x.com"),
            password_hash: "hashed".to_string(),
            site: site(),
            notify,
        }
    }

    #[tokio::test]
    async fn provisions_inactive_account_with_profile_and_workspace() {
        let store = InMemoryStore::new();
        let registrations = Arc::new(InMemoryRegistrationService::new());
        let mailer = Arc::new(RecordingMailer::default());
        let usecase =
            ProvisionAccountUseCase::new(store.accounts(), registrations.clone(), mailer.clone());

        let account = usecase
            .execute(request("alice", "Alice", true))
            .await
            .unwrap();

        assert!(!account.active);
        let profile = store
            .profiles()
            .find_by_account(&account.id)
            .await
            .unwrap()
            .expect("profile must exist as soon as the account does");
        let workspace = store
            .workspaces()
            .get(&profile.workspace_id.unwrap())
            .await
            .unwrap()
            .expect("workspace must exist as soon as the account does");
        assert_eq!(workspace.name, "Alice's workspace");
        assert_eq!(workspace.owner_id, Some(account.id));
        assert!(registrations.token_for(&account.id).await.is_some());
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_username_fails_and_persists_nothing() {
        let store = InMemoryStore::new();
        let registrations = Arc::new(InMemoryRegistrationService::new());
        let mailer = Arc::new(RecordingMailer::default());
        let usecase =
            ProvisionAccountUseCase::new(store.accounts(), registrations.clone(), mailer.clone());

        let first = usecase
            .execute(request("alice", "Alice", false))
            .await
            .unwrap();
        let err = usecase
            .execute(request("alice", "Another", false))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Uniqueness(_)));

        // only the first account's records exist
        let survivor = store
            .accounts()
            .find_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(survivor.id, first.id);
        assert_eq!(survivor.first_name, "Alice");
    }

    #[tokio::test]
    async fn duplicate_email_fails() {
        let store = InMemoryStore::new();
        let usecase = ProvisionAccountUseCase::new(
            store.accounts(),
            Arc::new(InMemoryRegistrationService::new()),
            Arc::new(RecordingMailer::default()),
        );

        usecase
            .execute(request("alice", "Alice", false))
            .await
            .unwrap();
        let mut other = request("bob", "Bob", false);
        other.email = "alice@x.com".to_string();
        let err = usecase.execute(other).await.unwrap_err();
        assert!(matches!(err, DomainError::Uniqueness(_)));
    }

    #[tokio::test]
    async fn email_failure_is_surfaced_but_account_stays_provisioned() {
        let store = InMemoryStore::new();
        let usecase = ProvisionAccountUseCase::new(
            store.accounts(),
            Arc::new(InMemoryRegistrationService::new()),
            Arc::new(FailingMailer),
        );

        let err = usecase
            .execute(request("alice", "Alice", true))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Email(_)));

        let account = store
            .accounts()
            .find_by_username("alice")
            .await
            .unwrap()
            .expect("account survives a failed notification");
        assert!(!account.active);
        assert!(
            store
                .profiles()
                .find_by_account(&account.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn notify_false_skips_email() {
        let store = InMemoryStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let usecase = ProvisionAccountUseCase::new(
            store.accounts(),
            Arc::new(InMemoryRegistrationService::new()),
            mailer.clone(),
        );

        usecase
            .execute(request("alice", "Alice", false))
            .await
            .unwrap();
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 0);
    }
}
