use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError, models::ViewEvent, repositories::ViewEventRepository,
};

/// Bounded activity log: every recorded view trims the profile's history to
/// the newest five entries in the same write.
pub struct RecordViewUseCase {
    views: Arc<dyn ViewEventRepository>,
}

impl RecordViewUseCase {
    pub fn new(views: Arc<dyn ViewEventRepository>) -> Self {
        Self { views }
    }

    pub async fn execute(&self, profile_id: Uuid, item_id: Uuid) -> Result<ViewEvent, DomainError> {
        let event = self.views.record(&profile_id, &item_id).await?;
        tracing::debug!(%profile_id, %item_id, "recorded item view");
        Ok(event)
    }

    /// Newest-first, at most five entries.
    pub async fn recent(&self, profile_id: Uuid) -> Result<Vec<ViewEvent>, DomainError> {
        self.views.list_for_profile(&profile_id).await
    }
}
