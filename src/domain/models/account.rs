use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Opaque credential produced by the authentication layer; never a raw
    /// password.
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Name of the personal workspace derived from the current first name.
    pub fn personal_workspace_name(&self) -> String {
        format!("{}'s workspace", self.first_name)
    }
}
