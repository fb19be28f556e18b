use log::{error, info};
use sqlx::PgPool;
use std::env;

use crate::models::CreateApiToken;
use crate::services::ApiTokenService;

/// Creates the first API token when BOOTSTRAP_API_TOKEN is set and none exist.
/// The token is printed once to stderr.
pub async fn create_api_token_if_needed(pool: &PgPool) {
    match env::var("BOOTSTRAP_API_TOKEN") {
        Ok(val) if !val.trim().is_empty() => {}
        _ => return,
    }

    match ApiTokenService::has_any_token(pool).await {
        Ok(true) => {
            info!("API tokens already exist, skipping bootstrap");
        }
        Ok(false) => {
            let input = CreateApiToken {
                name: "bootstrap".to_string(),
            };

            match ApiTokenService::create(pool, input).await {
                Ok(token) => {
                    // stderr, not the log, so the token stays out of log aggregators
                    eprintln!();
                    eprintln!("==============================================");
                    eprintln!("BOOTSTRAP API TOKEN CREATED - SAVE THIS NOW!");
                    eprintln!("Token: {}", token.token);
                    eprintln!("This token will NOT be shown again.");
                    eprintln!("==============================================");
                    eprintln!();
                    info!("Bootstrap API token created");
                }
                Err(e) => {
                    error!("Failed to create bootstrap API token: {}", e);
                }
            }
        }
        Err(e) => {
            error!("Failed to check for existing API tokens: {}", e);
        }
    }
}
