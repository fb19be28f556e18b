use sqlx::PgPool;

use crate::auth::generate_token;
use crate::error::{AppError, AppResult};
use crate::models::{ApiToken, CreateApiToken};

pub struct ApiTokenService;

impl ApiTokenService {
    /// Lists all tokens, newest first
    pub async fn list(pool: &PgPool) -> AppResult<Vec<ApiToken>> {
        let tokens = sqlx::query_as::<_, ApiToken>(
            r#"
            SELECT id, token, name, created_at, last_used_at
            FROM api_tokens
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tokens)
    }

    /// Gets a token by token string (for authentication)
    pub async fn get_by_token(pool: &PgPool, token: &str) -> AppResult<Option<ApiToken>> {
        let result = sqlx::query_as::<_, ApiToken>(
            r#"
            SELECT id, token, name, created_at, last_used_at
            FROM api_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(result)
    }

    /// Creates a new token for a named actor
    pub async fn create(pool: &PgPool, input: CreateApiToken) -> AppResult<ApiToken> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Token name is required".to_string()));
        }
        if name.chars().count() > 255 {
            return Err(AppError::Validation(
                "Token name must be at most 255 characters".to_string(),
            ));
        }

        let token = sqlx::query_as::<_, ApiToken>(
            r#"
            INSERT INTO api_tokens (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_used_at
            "#,
        )
        .bind(generate_token())
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Deletes a token (revoke)
    pub async fn delete(pool: &PgPool, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Token with id {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Updates last_used_at timestamp
    pub async fn update_last_used(pool: &PgPool, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE api_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Checks if any tokens exist (for bootstrap check)
    pub async fn has_any_token(pool: &PgPool) -> AppResult<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM api_tokens")
            .fetch_one(pool)
            .await?;

        Ok(count.0 > 0)
    }
}
