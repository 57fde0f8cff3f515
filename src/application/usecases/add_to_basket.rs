use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    errors::DomainError, models::BasketEntry, repositories::BasketRepository,
};

pub struct AddToBasketUseCase {
    baskets: Arc<dyn BasketRepository>,
}

pub struct AddToBasketRequest {
    pub profile_id: Uuid,
    pub question_id: Uuid,
    /// Externally assigned rank; callers renumber, this component never does.
    pub qn_order: u32,
}

impl AddToBasketUseCase {
    pub fn new(baskets: Arc<dyn BasketRepository>) -> Self {
        Self { baskets }
    }

    pub async fn execute(&self, request: AddToBasketRequest) -> Result<BasketEntry, DomainError> {
        let entry = BasketEntry {
            id: Uuid::new_v4(),
            profile_id: request.profile_id,
            question_id: request.question_id,
            qn_order: request.qn_order,
            created_at: Utc::now(),
        };
        self.baskets.insert(&entry).await
    }

    /// By `qn_order` ascending.
    pub async fn list(&self, profile_id: Uuid) -> Result<Vec<BasketEntry>, DomainError> {
        self.baskets.list_for_profile(&profile_id).await
    }
}
