use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::DeliveryLedger;
use crate::error::{AppError, AppResult};
use crate::models::{BatchFilter, DeliveryResult, NewBatch, NotificationBatch, OverallStatus};
use crate::pagination::{OffsetPaginatedResponse, PageParams};

/// In-process ledger for tests and local runs without a database
#[derive(Default)]
pub struct MemoryLedger {
    batches: RwLock<HashMap<Uuid, NotificationBatch>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.batches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.batches.read().await.is_empty()
    }
}

fn pending_mut(
    batches: &mut HashMap<Uuid, NotificationBatch>,
    batch_id: Uuid,
) -> AppResult<&mut NotificationBatch> {
    let batch = batches
        .get_mut(&batch_id)
        .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", batch_id)))?;

    if batch.overall_status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Batch {} is already finalized as {}",
            batch_id, batch.overall_status
        )));
    }

    Ok(batch)
}

#[async_trait]
impl DeliveryLedger for MemoryLedger {
    async fn create(&self, batch: NewBatch) -> AppResult<NotificationBatch> {
        let batch = batch.into_batch();
        self.batches.write().await.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn append_result(&self, batch_id: Uuid, result: &DeliveryResult) -> AppResult<()> {
        let mut batches = self.batches.write().await;
        pending_mut(&mut batches, batch_id)?.results.push(result.clone());
        Ok(())
    }

    async fn finalize(
        &self,
        batch_id: Uuid,
        status: OverallStatus,
    ) -> AppResult<NotificationBatch> {
        if !status.is_terminal() {
            return Err(AppError::Validation(
                "A batch can only be finalized with a terminal status".to_string(),
            ));
        }

        let mut batches = self.batches.write().await;
        let batch = pending_mut(&mut batches, batch_id)?;
        batch.overall_status = status;
        batch.finalized_at = Some(Utc::now());

        Ok(batch.clone())
    }

    async fn get_by_id(&self, batch_id: Uuid) -> AppResult<NotificationBatch> {
        self.batches
            .read()
            .await
            .get(&batch_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", batch_id)))
    }

    async fn list(
        &self,
        filter: &BatchFilter,
        page: PageParams,
    ) -> AppResult<OffsetPaginatedResponse<NotificationBatch>> {
        let batches = self.batches.read().await;

        let mut matching: Vec<&NotificationBatch> =
            batches.values().filter(|b| filter.matches(b)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total_count = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset().max(0) as usize)
            .take(page.per_page.max(0) as usize)
            .cloned()
            .collect();

        Ok(OffsetPaginatedResponse::new(
            items,
            total_count,
            page.page,
            page.per_page,
        ))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
