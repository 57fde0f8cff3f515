use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Account, BasketEntry, Profile, RECENT_VIEWS_LIMIT, ViewEvent, Workspace},
    repositories::{
        AccountRepository, BasketRepository, ProfileRepository, ViewEventRepository,
        WorkspaceRepository,
    },
};

pub type PgPool = Pool<Postgres>;

const UNIQUE_VIOLATION: &str = "23505";

fn storage(err: sqlx::Error) -> DomainError {
    DomainError::Storage(err.into())
}

/// Maps a unique-constraint violation to the domain error the caller is
/// expected to handle; everything else stays a storage error.
fn insert_error(err: sqlx::Error, what: impl Into<String>) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return DomainError::Uniqueness(what.into());
        }
    }
    storage(err)
}

#[derive(Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_with_profile(
        &self,
        account: &Account,
        profile: &Profile,
        workspace: &Workspace,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, first_name, last_name, password_hash,
                active, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            insert_error(
                err,
                format!(
                    "account with username {} or email {}",
                    account.username, account.email
                ),
            )
        })?;

        // workspace first: the profile references it
        sqlx::query(
            r#"
            INSERT INTO workspaces (id, name, owner_id, created_at, updated_at)
            VALUES ($1,$2,$3,$4,$5)
            "#,
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(workspace.owner_id)
        .bind(workspace.created_at)
        .bind(workspace.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, account_id, language, bio, wrap_lines, mathjax_url,
                avatar, workspace_id, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            "#,
        )
        .bind(profile.id)
        .bind(profile.account_id)
        .bind(&profile.language)
        .bind(&profile.bio)
        .bind(profile.wrap_lines)
        .bind(&profile.mathjax_url)
        .bind(&profile.avatar)
        .bind(profile.workspace_id)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Account>, DomainError> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash,
                   active, created_at, updated_at
            FROM accounts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(record.map(Account::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash,
                   active, created_at, updated_at
            FROM accounts WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(record.map(Account::from))
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let done = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2,
                email = $3,
                first_name = $4,
                last_name = $5,
                password_hash = $6,
                active = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.active)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            insert_error(
                err,
                format!(
                    "account with username {} or email {}",
                    account.username, account.email
                ),
            )
        })?;
        if done.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("account {}", account.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        // profile, view events and basket entries cascade; workspaces are
        // owner-nulled by the schema
        let done = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("account {id}")));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_account(&self, account_id: &Uuid) -> Result<Option<Profile>, DomainError> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT id, account_id, language, bio, wrap_lines, mathjax_url,
                   avatar, workspace_id, created_at, updated_at
            FROM profiles WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(record.map(Profile::from))
    }

    async fn update(&self, profile: &Profile) -> Result<(), DomainError> {
        let done = sqlx::query(
            r#"
            UPDATE profiles
            SET language = $2,
                bio = $3,
                wrap_lines = $4,
                mathjax_url = $5,
                avatar = $6,
                workspace_id = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(profile.id)
        .bind(&profile.language)
        .bind(&profile.bio)
        .bind(profile.wrap_lines)
        .bind(&profile.mathjax_url)
        .bind(&profile.avatar)
        .bind(profile.workspace_id)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("profile {}", profile.id)));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresWorkspaceRepository {
    pool: PgPool,
}

impl PostgresWorkspaceRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl WorkspaceRepository for PostgresWorkspaceRepository {
    async fn get(&self, id: &Uuid) -> Result<Option<Workspace>, DomainError> {
        let record = sqlx::query_as::<_, WorkspaceRecord>(
            r#"
            SELECT id, name, owner_id, created_at, updated_at
            FROM workspaces WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(record.map(Workspace::from))
    }

    async fn update(&self, workspace: &Workspace) -> Result<(), DomainError> {
        let done = sqlx::query(
            r#"
            UPDATE workspaces
            SET name = $2,
                owner_id = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(workspace.owner_id)
        .bind(workspace.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("workspace {}", workspace.id)));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresViewEventRepository {
    pool: PgPool,
}

impl PostgresViewEventRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ViewEventRepository for PostgresViewEventRepository {
    async fn record(&self, profile_id: &Uuid, item_id: &Uuid) -> Result<ViewEvent, DomainError> {
        // insert and trim commit together, so the per-profile bound holds at
        // rest even under concurrent recording
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let record = sqlx::query_as::<_, ViewEventRecord>(
            r#"
            INSERT INTO view_events (id, profile_id, item_id, viewed_at)
            VALUES ($1,$2,$3,$4)
            RETURNING id, profile_id, item_id, viewed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(item_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
                DomainError::NotFound(format!("profile {profile_id}"))
            }
            _ => storage(err),
        })?;

        sqlx::query(
            r#"
            DELETE FROM view_events
            WHERE profile_id = $1
              AND id NOT IN (
                SELECT id FROM view_events
                WHERE profile_id = $1
                ORDER BY viewed_at DESC, id DESC
                LIMIT $2
              )
            "#,
        )
        .bind(profile_id)
        .bind(RECENT_VIEWS_LIMIT as i64)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(record.into())
    }

    async fn list_for_profile(&self, profile_id: &Uuid) -> Result<Vec<ViewEvent>, DomainError> {
        let rows = sqlx::query_as::<_, ViewEventRecord>(
            r#"
            SELECT id, profile_id, item_id, viewed_at
            FROM view_events
            WHERE profile_id = $1
            ORDER BY viewed_at DESC, id DESC
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(ViewEvent::from).collect())
    }
}

#[derive(Clone)]
pub struct PostgresBasketRepository {
    pool: PgPool,
}

impl PostgresBasketRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl BasketRepository for PostgresBasketRepository {
    async fn insert(&self, entry: &BasketEntry) -> Result<BasketEntry, DomainError> {
        let record = sqlx::query_as::<_, BasketEntryRecord>(
            r#"
            INSERT INTO basket_entries (id, profile_id, question_id, qn_order, created_at)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id, profile_id, question_id, qn_order, created_at
            "#,
        )
        .bind(entry.id)
        .bind(entry.profile_id)
        .bind(entry.question_id)
        .bind(i64::from(entry.qn_order))
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            insert_error(
                err,
                format!(
                    "basket entry for profile {} and question {}",
                    entry.profile_id, entry.question_id
                ),
            )
        })?;
        record.try_into()
    }

    async fn list_for_profile(&self, profile_id: &Uuid) -> Result<Vec<BasketEntry>, DomainError> {
        let rows = sqlx::query_as::<_, BasketEntryRecord>(
            r#"
            SELECT id, profile_id, question_id, qn_order, created_at
            FROM basket_entries
            WHERE profile_id = $1
            ORDER BY qn_order ASC
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(BasketEntry::try_from).collect()
    }
}

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(value: AccountRecord) -> Self {
        Self {
            id: value.id,
            username: value.username,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            password_hash: value.password_hash,
            active: value.active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    account_id: Uuid,
    language: String,
    bio: String,
    wrap_lines: bool,
    mathjax_url: String,
    avatar: Option<String>,
    workspace_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRecord> for Profile {
    fn from(value: ProfileRecord) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            language: value.language,
            bio: value.bio,
            wrap_lines: value.wrap_lines,
            mathjax_url: value.mathjax_url,
            avatar: value.avatar,
            workspace_id: value.workspace_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(FromRow)]
struct WorkspaceRecord {
    id: Uuid,
    name: String,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkspaceRecord> for Workspace {
    fn from(value: WorkspaceRecord) -> Self {
        Self {
            id: value.id,
            name: value.name,
            owner_id: value.owner_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ViewEventRecord {
    id: Uuid,
    profile_id: Uuid,
    item_id: Uuid,
    viewed_at: DateTime<Utc>,
}

impl From<ViewEventRecord> for ViewEvent {
    fn from(value: ViewEventRecord) -> Self {
        Self {
            id: value.id,
            profile_id: value.profile_id,
            item_id: value.item_id,
            viewed_at: value.viewed_at,
        }
    }
}

#[derive(FromRow)]
struct BasketEntryRecord {
    id: Uuid,
    profile_id: Uuid,
    question_id: Uuid,
    qn_order: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<BasketEntryRecord> for BasketEntry {
    type Error = DomainError;

    fn try_from(value: BasketEntryRecord) -> Result<Self, Self::Error> {
        let qn_order = u32::try_from(value.qn_order).map_err(|_| {
            DomainError::Consistency(format!(
                "basket entry {} has rank {} outside the valid range",
                value.id, value.qn_order
            ))
        })?;
        Ok(Self {
            id: value.id,
            profile_id: value.profile_id,
            question_id: value.question_id,
            qn_order,
            created_at: value.created_at,
        })
    }
}
