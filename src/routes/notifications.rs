use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::BearerAuth;
use crate::error::AppResult;
use crate::models::{BatchFilter, BatchOutcome, Channel, CreateBatchRequest, OverallStatus};
use crate::pagination::{PageParams, PAGE_SIZE};
use crate::services::NotificationService;

/// Query parameters for listing batches
#[derive(Debug, Deserialize)]
pub struct ListBatchesQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Items per page (default: 20, max: 100)
    #[serde(default = "default_per_page")]
    pub per_page: i64,

    pub channel: Option<Channel>,
    pub status: Option<OverallStatus>,
    pub submitted_by: Option<String>,
    /// Inclusive lower bound on `created_at` (RFC 3339)
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at` (RFC 3339)
    pub created_before: Option<DateTime<Utc>>,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    PAGE_SIZE
}

impl ListBatchesQuery {
    fn split(self) -> (BatchFilter, PageParams) {
        let filter = BatchFilter {
            channel: self.channel,
            status: self.status,
            submitted_by: self.submitted_by.filter(|s| !s.trim().is_empty()),
            created_after: self.created_after,
            created_before: self.created_before,
        };
        let page = PageParams {
            page: self.page,
            per_page: self.per_page,
        };
        (filter, page)
    }
}

/// POST /api/notifications/batches - Submit and dispatch a batch
///
/// 201 means the batch was created and every recipient has a result;
/// individual deliveries may still have failed.
pub async fn create_batch(
    service: web::Data<NotificationService>,
    auth: BearerAuth,
    body: web::Json<CreateBatchRequest>,
) -> AppResult<HttpResponse> {
    let outcome: BatchOutcome = service.submit(body.into_inner(), auth.actor()).await?;

    Ok(HttpResponse::Created().json(outcome))
}

/// GET /api/notifications/batches - Batch history, newest first
pub async fn list_batches(
    service: web::Data<NotificationService>,
    _auth: BearerAuth,
    query: web::Query<ListBatchesQuery>,
) -> AppResult<HttpResponse> {
    let (filter, page) = query.into_inner().split();
    let batches = service.list_batches(&filter, page).await?;

    Ok(HttpResponse::Ok().json(batches))
}

/// GET /api/notifications/batches/{id} - Full batch record with results
pub async fn get_batch(
    service: web::Data<NotificationService>,
    _auth: BearerAuth,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let batch = service.get_batch(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(batch))
}

/// Configure notification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notifications/batches")
            .route("", web::post().to(create_batch))
            .route("", web::get().to(list_batches))
            .route("/{id}", web::get().to(get_batch)),
    );
}
