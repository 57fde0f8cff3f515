use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ranked association between a profile and a question. Unique per
/// (profile, question); enumeration order is the externally assigned
/// `qn_order`, never insertion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketEntry {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub question_id: Uuid,
    pub qn_order: u32,
    pub created_at: DateTime<Utc>,
}
