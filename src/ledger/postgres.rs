use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DeliveryLedger;
use crate::error::{AppError, AppResult};
use crate::models::{
    BatchFilter, Channel, DeliveryResult, NewBatch, NotificationBatch, OverallStatus,
};
use crate::pagination::{OffsetPaginatedResponse, PageParams};

const BATCH_COLUMNS: &str = "id, channel, message, recipients, results, overall_status, \
                             submitted_by, created_at, finalized_at";

/// Row shape of `notification_batches`
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    channel: Channel,
    message: String,
    recipients: Vec<String>,
    results: Json<Vec<DeliveryResult>>,
    overall_status: OverallStatus,
    submitted_by: String,
    created_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

impl From<BatchRow> for NotificationBatch {
    fn from(row: BatchRow) -> Self {
        Self {
            id: row.id,
            channel: row.channel,
            message: row.message,
            recipients: row.recipients,
            results: row.results.0,
            overall_status: row.overall_status,
            submitted_by: row.submitted_by,
            created_at: row.created_at,
            finalized_at: row.finalized_at,
        }
    }
}

/// PostgreSQL-backed ledger
///
/// Results live in a JSONB array on the batch row. Appends are a single
/// guarded `UPDATE`, so concurrent appends never lose each other.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explains why a guarded update matched no row
    async fn not_pending_error(&self, batch_id: Uuid) -> AppError {
        let status = sqlx::query_scalar::<_, OverallStatus>(
            "SELECT overall_status FROM notification_batches WHERE id = $1",
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await;

        match status {
            Ok(Some(status)) => AppError::Conflict(format!(
                "Batch {} is already finalized as {}",
                batch_id, status
            )),
            Ok(None) => AppError::NotFound(format!("Batch {} not found", batch_id)),
            Err(e) => AppError::Database(e),
        }
    }
}

#[async_trait]
impl DeliveryLedger for PgLedger {
    async fn create(&self, batch: NewBatch) -> AppResult<NotificationBatch> {
        let batch = batch.into_batch();

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO notification_batches
                (id, channel, message, recipients, submitted_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(batch.id)
        .bind(batch.channel)
        .bind(&batch.message)
        .bind(&batch.recipients)
        .bind(&batch.submitted_by)
        .bind(batch.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn append_result(&self, batch_id: Uuid, result: &DeliveryResult) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE notification_batches
            SET results = results || jsonb_build_array($2::jsonb)
            WHERE id = $1 AND overall_status = 'pending'
            "#,
        )
        .bind(batch_id)
        .bind(Json(result))
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.not_pending_error(batch_id).await);
        }

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

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE notification_batches
            SET overall_status = $2, finalized_at = NOW()
            WHERE id = $1 AND overall_status = 'pending'
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(batch_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.not_pending_error(batch_id).await),
        }
    }

    async fn get_by_id(&self, batch_id: Uuid) -> AppResult<NotificationBatch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM notification_batches WHERE id = $1",
            BATCH_COLUMNS
        ))
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", batch_id)))?;

        Ok(row.into())
    }

    async fn list(
        &self,
        filter: &BatchFilter,
        page: PageParams,
    ) -> AppResult<OffsetPaginatedResponse<NotificationBatch>> {
        const WHERE_CLAUSE: &str = r#"
            WHERE ($1::varchar IS NULL OR channel = $1)
              AND ($2::varchar IS NULL OR overall_status = $2)
              AND ($3::varchar IS NULL OR submitted_by = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at < $5)
        "#;

        let channel = filter.channel.map(|c| c.as_str());
        let status = filter.status.map(|s| s.as_str());

        let total_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notification_batches {}",
            WHERE_CLAUSE
        ))
        .bind(channel)
        .bind(status)
        .bind(filter.submitted_by.as_deref())
        .bind(filter.created_after)
        .bind(filter.created_before)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {}
            FROM notification_batches
            {}
            ORDER BY created_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
            BATCH_COLUMNS, WHERE_CLAUSE
        ))
        .bind(channel)
        .bind(status)
        .bind(filter.submitted_by.as_deref())
        .bind(filter.created_after)
        .bind(filter.created_before)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(NotificationBatch::from).collect();

        Ok(OffsetPaginatedResponse::new(
            items,
            total_count,
            page.page,
            page.per_page,
        ))
    }

    async fn health_check(&self) -> bool {
        crate::db::health_check(&self.pool).await
    }
}
