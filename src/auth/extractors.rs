use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::auth::is_valid_token_format;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::ApiToken;
use crate::services::ApiTokenService;

/// Extractor for Bearer API token authentication
///
/// The token's name is the actor recorded as `submitted_by` on batches.
///
/// ```ignore
/// async fn my_handler(auth: BearerAuth) -> HttpResponse {
///     let actor = auth.actor();
/// }
/// ```
pub struct BearerAuth {
    pub token: ApiToken,
}

impl BearerAuth {
    pub fn actor(&self) -> &str {
        &self.token.name
    }
}

impl FromRequest for BearerAuth {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = match req.app_data::<web::Data<DbPool>>().cloned() {
            Some(pool) => pool,
            None => {
                return Box::pin(async {
                    Err(AppError::Internal(
                        "Database pool not configured".to_string(),
                    ))
                });
            }
        };

        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        Box::pin(async move {
            let header = auth_header.ok_or_else(|| {
                AppError::Unauthorized("Missing Authorization header".to_string())
            })?;

            let token_str = header
                .strip_prefix("Bearer ")
                .map(str::trim)
                .ok_or_else(|| {
                    AppError::Unauthorized(
                        "Invalid Authorization header format, expected 'Bearer <token>'"
                            .to_string(),
                    )
                })?;

            if !is_valid_token_format(token_str) {
                return Err(AppError::Unauthorized(
                    "Malformed Bearer token, must be 40 lowercase hex chars".to_string(),
                ));
            }

            let token = ApiTokenService::get_by_token(pool.get_ref(), token_str)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid Bearer token".to_string()))?;

            // Fire and forget
            let pool_clone = pool.clone();
            let token_id = token.id;
            tokio::spawn(async move {
                if let Err(e) =
                    ApiTokenService::update_last_used(pool_clone.get_ref(), token_id).await
                {
                    log::debug!("Failed to update last_used_at for token {}: {}", token_id, e);
                }
            });

            Ok(BearerAuth { token })
        })
    }
}
