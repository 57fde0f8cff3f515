use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_LANGUAGE: &str = "en-GB";

/// Per-account preference record, 1:1 with an account. The bio is sanitized
/// and the avatar thumbnailed by upstream collaborators; both are stored
/// verbatim here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub language: String,
    pub bio: String,
    pub wrap_lines: bool,
    pub mathjax_url: String,
    pub avatar: Option<String>,
    pub workspace_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(account_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            language: DEFAULT_LANGUAGE.to_string(),
            bio: String::new(),
            wrap_lines: false,
            mathjax_url: String::new(),
            avatar: None,
            workspace_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
