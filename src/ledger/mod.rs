//! Delivery ledger: the persisted audit record of every notification batch.
//!
//! A batch is created `pending` before dispatch, grows one `DeliveryResult`
//! at a time, and becomes immutable once finalized with a terminal status.
//! Every mutation of a finalized batch fails with `AppError::Conflict`.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{BatchFilter, DeliveryResult, NewBatch, NotificationBatch, OverallStatus};
use crate::pagination::{OffsetPaginatedResponse, PageParams};

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

/// Storage for notification batches
#[async_trait]
pub trait DeliveryLedger: Send + Sync {
    /// Persists a new `pending` batch with no results
    async fn create(&self, batch: NewBatch) -> AppResult<NotificationBatch>;

    /// Atomically appends one result to a `pending` batch
    async fn append_result(&self, batch_id: Uuid, result: &DeliveryResult) -> AppResult<()>;

    /// Sets the terminal status; the batch is immutable afterwards
    async fn finalize(&self, batch_id: Uuid, status: OverallStatus)
        -> AppResult<NotificationBatch>;

    async fn get_by_id(&self, batch_id: Uuid) -> AppResult<NotificationBatch>;

    /// Lists batches newest first; `page` is used as given
    async fn list(
        &self,
        filter: &BatchFilter,
        page: PageParams,
    ) -> AppResult<OffsetPaginatedResponse<NotificationBatch>>;

    async fn health_check(&self) -> bool;
}

pub type DynDeliveryLedger = Arc<dyn DeliveryLedger>;
