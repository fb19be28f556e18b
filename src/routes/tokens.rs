use actix_web::{web, HttpResponse};

use crate::auth::BearerAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::CreateApiToken;
use crate::services::ApiTokenService;

/// GET /api/tokens - List all tokens (masked)
pub async fn list_tokens(pool: web::Data<DbPool>, _auth: BearerAuth) -> AppResult<HttpResponse> {
    let tokens = ApiTokenService::list(pool.get_ref()).await?;
    let responses: Vec<_> = tokens.iter().map(|t| t.to_response()).collect();

    Ok(HttpResponse::Ok().json(responses))
}

/// POST /api/tokens - Create a new token
pub async fn create_token(
    pool: web::Data<DbPool>,
    auth: BearerAuth,
    body: web::Json<CreateApiToken>,
) -> AppResult<HttpResponse> {
    let token = ApiTokenService::create(pool.get_ref(), body.into_inner()).await?;
    log::info!("API token '{}' created by {}", token.name, auth.actor());

    // Only time the full token is visible
    Ok(HttpResponse::Created().json(token.to_created_response()))
}

/// DELETE /api/tokens/{id} - Revoke a token
pub async fn delete_token(
    pool: web::Data<DbPool>,
    auth: BearerAuth,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    ApiTokenService::delete(pool.get_ref(), id).await?;
    log::info!("API token {} revoked by {}", id, auth.actor());

    Ok(HttpResponse::NoContent().finish())
}

/// Configure token routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tokens")
            .route("", web::get().to(list_tokens))
            .route("", web::post().to(create_token))
            .route("/{id}", web::delete().to(delete_token)),
    );
}
