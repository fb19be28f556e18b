use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// ApiToken model - identifies who submits notification batches
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApiToken {
    pub id: i32,
    pub token: String,
    /// Recorded as `submitted_by` on every batch sent with this token
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// DTO for creating a new token
#[derive(Debug, Deserialize)]
pub struct CreateApiToken {
    pub name: String,
}

/// Response that includes the full token (only on creation)
#[derive(Debug, Serialize)]
pub struct ApiTokenCreatedResponse {
    pub id: i32,
    pub token: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Response for listing (token is masked)
#[derive(Debug, Serialize)]
pub struct ApiTokenResponse {
    pub id: i32,
    pub token_prefix: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    /// Mask the token for display (show first 8 chars)
    pub fn to_response(&self) -> ApiTokenResponse {
        let prefix: String = self.token.chars().take(8).collect();
        ApiTokenResponse {
            id: self.id,
            token_prefix: format!("{}...", prefix),
            name: self.name.clone(),
            created_at: self.created_at,
            last_used_at: self.last_used_at,
        }
    }

    /// Full response with token (only for creation)
    pub fn to_created_response(&self) -> ApiTokenCreatedResponse {
        ApiTokenCreatedResponse {
            id: self.id,
            token: self.token.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}
