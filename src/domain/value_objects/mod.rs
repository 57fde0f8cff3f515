use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Site branding used when building activation links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContext {
    pub scheme: String,
    pub domain: String,
    pub name: String,
}

impl SiteContext {
    pub fn activation_url(&self, token: &ActivationToken) -> String {
        format!("{}://{}/activate/{}", self.scheme, self.domain, token.token)
    }
}

/// Opaque activation record issued by the registration collaborator, keyed to
/// a freshly created account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationToken {
    pub account_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}
