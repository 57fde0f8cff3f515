use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most this many view events are kept per profile at rest.
pub const RECENT_VIEWS_LIMIT: usize = 5;

/// A profile viewed an item. Repeated views of the same item produce separate
/// events; only the per-profile count is bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEvent {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub item_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}
