use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Account, BasketEntry, Profile, RECENT_VIEWS_LIMIT, ViewEvent, Workspace},
    repositories::{
        AccountRepository, BasketRepository, ProfileRepository, ViewEventRepository,
        WorkspaceRepository,
    },
};

#[derive(Default)]
struct StoreState {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, Profile>,
    workspaces: HashMap<Uuid, Workspace>,
    // seq disambiguates events stamped within the same clock tick
    views: HashMap<Uuid, (u64, ViewEvent)>,
    basket: HashMap<Uuid, BasketEntry>,
    view_seq: u64,
}

/// All repositories share one state behind one lock, so multi-record writes
/// (provisioning, insert-then-trim) are as atomic as the relational backend's
/// transactions.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self) -> Arc<dyn AccountRepository> {
        Arc::new(InMemoryAccountRepository {
            state: self.state.clone(),
        })
    }

    pub fn profiles(&self) -> Arc<dyn ProfileRepository> {
        Arc::new(InMemoryProfileRepository {
            state: self.state.clone(),
        })
    }

    pub fn workspaces(&self) -> Arc<dyn WorkspaceRepository> {
        Arc::new(InMemoryWorkspaceRepository {
            state: self.state.clone(),
        })
    }

    pub fn views(&self) -> Arc<dyn ViewEventRepository> {
        Arc::new(InMemoryViewEventRepository {
            state: self.state.clone(),
        })
    }

    pub fn baskets(&self) -> Arc<dyn BasketRepository> {
        Arc::new(InMemoryBasketRepository {
            state: self.state.clone(),
        })
    }
}

pub struct InMemoryAccountRepository {
    state: Arc<RwLock<StoreState>>,
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_with_profile(
        &self,
        account: &Account,
        profile: &Profile,
        workspace: &Workspace,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state
            .accounts
            .values()
            .any(|a| a.username == account.username)
        {
            return Err(DomainError::Uniqueness(format!(
                "username {} is taken",
                account.username
            )));
        }
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(DomainError::Uniqueness(format!(
                "email {} is taken",
                account.email
            )));
        }
        state.accounts.insert(account.id, account.clone());
        state.workspaces.insert(workspace.id, workspace.clone());
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Account>, DomainError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(&account.id) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound(format!("account {}", account.id))),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state.accounts.remove(id).is_none() {
            return Err(DomainError::NotFound(format!("account {id}")));
        }
        let profile_ids: Vec<Uuid> = state
            .profiles
            .values()
            .filter(|p| p.account_id == *id)
            .map(|p| p.id)
            .collect();
        state.profiles.retain(|_, p| p.account_id != *id);
        state
            .views
            .retain(|_, (_, v)| !profile_ids.contains(&v.profile_id));
        state
            .basket
            .retain(|_, b| !profile_ids.contains(&b.profile_id));
        for workspace in state.workspaces.values_mut() {
            if workspace.owner_id == Some(*id) {
                workspace.owner_id = None;
            }
        }
        Ok(())
    }
}

pub struct InMemoryProfileRepository {
    state: Arc<RwLock<StoreState>>,
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_account(&self, account_id: &Uuid) -> Result<Option<Profile>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .values()
            .find(|p| p.account_id == *account_id)
            .cloned())
    }

    async fn update(&self, profile: &Profile) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.profiles.get_mut(&profile.id) {
            Some(slot) => {
                *slot = profile.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound(format!("profile {}", profile.id))),
        }
    }
}

pub struct InMemoryWorkspaceRepository {
    state: Arc<RwLock<StoreState>>,
}

#[async_trait]
impl WorkspaceRepository for InMemoryWorkspaceRepository {
    async fn get(&self, id: &Uuid) -> Result<Option<Workspace>, DomainError> {
        let state = self.state.read().await;
        Ok(state.workspaces.get(id).cloned())
    }

    async fn update(&self, workspace: &Workspace) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.workspaces.get_mut(&workspace.id) {
            Some(slot) => {
                *slot = workspace.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound(format!(
                "workspace {}",
                workspace.id
            ))),
        }
    }
}

pub struct InMemoryViewEventRepository {
    state: Arc<RwLock<StoreState>>,
}

#[async_trait]
impl ViewEventRepository for InMemoryViewEventRepository {
    async fn record(&self, profile_id: &Uuid, item_id: &Uuid) -> Result<ViewEvent, DomainError> {
        let mut state = self.state.write().await;
        if !state.profiles.contains_key(profile_id) {
            return Err(DomainError::NotFound(format!("profile {profile_id}")));
        }

        let event = ViewEvent {
            id: Uuid::new_v4(),
            profile_id: *profile_id,
            item_id: *item_id,
            viewed_at: Utc::now(),
        };
        state.view_seq += 1;
        let seq = state.view_seq;
        state.views.insert(event.id, (seq, event.clone()));

        // trim to the newest entries under the same lock as the insert
        let mut entries: Vec<(u64, Uuid)> = state
            .views
            .values()
            .filter(|(_, v)| v.profile_id == *profile_id)
            .map(|(seq, v)| (*seq, v.id))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, stale) in entries.into_iter().skip(RECENT_VIEWS_LIMIT) {
            state.views.remove(&stale);
        }

        Ok(event)
    }

    async fn list_for_profile(&self, profile_id: &Uuid) -> Result<Vec<ViewEvent>, DomainError> {
        let state = self.state.read().await;
        let mut entries: Vec<(u64, ViewEvent)> = state
            .views
            .values()
            .filter(|(_, v)| v.profile_id == *profile_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, v)| v).collect())
    }
}

pub struct InMemoryBasketRepository {
    state: Arc<RwLock<StoreState>>,
}

#[async_trait]
impl BasketRepository for InMemoryBasketRepository {
    async fn insert(&self, entry: &BasketEntry) -> Result<BasketEntry, DomainError> {
        let mut state = self.state.write().await;
        if state
            .basket
            .values()
            .any(|b| b.profile_id == entry.profile_id && b.question_id == entry.question_id)
        {
            return Err(DomainError::Uniqueness(format!(
                "question {} is already in the basket of profile {}",
                entry.question_id, entry.profile_id
            )));
        }
        state.basket.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn list_for_profile(&self, profile_id: &Uuid) -> Result<Vec<BasketEntry>, DomainError> {
        let state = self.state.read().await;
        let mut entries: Vec<BasketEntry> = state
            .basket
            .values()
            .filter(|b| b.profile_id == *profile_id)
            .cloned()
            .collect();
        entries.sort_by_key(|b| b.qn_order);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(store: &InMemoryStore, username: &str) -> (Account, Profile, Workspace) {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@x.com"),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            password_hash: "hashed".to_string(),
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
        store
            .accounts()
            .create_with_profile(&account, &profile, &workspace)
            .await
            .unwrap();
        (account, profile, workspace)
    }

    #[tokio::test]
    async fn deleting_an_account_cascades_to_profile_views_and_basket() {
        let store = InMemoryStore::new();
        let (account, profile, workspace) = seed(&store, "alice").await;

        store
            .views()
            .record(&profile.id, &Uuid::new_v4())
            .await
            .unwrap();
        store
            .baskets()
            .insert(&BasketEntry {
                id: Uuid::new_v4(),
                profile_id: profile.id,
                question_id: Uuid::new_v4(),
                qn_order: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        store.accounts().delete(&account.id).await.unwrap();

        assert!(store.accounts().get(&account.id).await.unwrap().is_none());
        assert!(
            store
                .profiles()
                .find_by_account(&account.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .views()
                .list_for_profile(&profile.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .baskets()
                .list_for_profile(&profile.id)
                .await
                .unwrap()
                .is_empty()
        );

        // the workspace survives with its owner cleared
        let workspace = store
            .workspaces()
            .get(&workspace.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(workspace.owner_id, None);
        assert_eq!(workspace.name, "Alice's workspace");
    }

    #[tokio::test]
    async fn concurrent_recording_never_exceeds_the_bound() {
        let store = InMemoryStore::new();
        let (_, profile, _) = seed(&store, "alice").await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let views = store.views();
            let profile_id = profile.id;
            handles.push(tokio::spawn(async move {
                views.record(&profile_id, &Uuid::new_v4()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let remaining = store.views().list_for_profile(&profile.id).await.unwrap();
        assert_eq!(remaining.len(), RECENT_VIEWS_LIMIT);
    }

    #[tokio::test]
    async fn failed_provisioning_leaves_no_partial_records() {
        let store = InMemoryStore::new();
        let (_, first_profile, _) = seed(&store, "alice").await;

        let now = Utc::now();
        let dup = Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "other@x.com".to_string(),
            first_name: "Other".to_string(),
            last_name: "Smith".to_string(),
            password_hash: "hashed".to_string(),
            active: false,
            created_at: now,
            updated_at: now,
        };
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: dup.personal_workspace_name(),
            owner_id: Some(dup.id),
            created_at: now,
            updated_at: now,
        };
        let mut profile = Profile::new(dup.id);
        profile.workspace_id = Some(workspace.id);

        let err = store
            .accounts()
            .create_with_profile(&dup, &profile, &workspace)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Uniqueness(_)));

        assert!(store.accounts().get(&dup.id).await.unwrap().is_none());
        assert!(
            store
                .profiles()
                .find_by_account(&dup.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.workspaces().get(&workspace.id).await.unwrap().is_none());
        // the original profile is untouched
        let survivor = store
            .profiles()
            .find_by_account(&first_profile.account_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(survivor.id, first_profile.id);
    }
}
