//! Contact lookups backing `student:<id>` and `staff:<id>` recipient entries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ContactCard, EntityKind, EntityRef};

/// Read-only source of stored contact addresses
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Returns `None` when the entity does not exist
    async fn lookup(&self, entity: EntityRef) -> AppResult<Option<ContactCard>>;
}

pub type DynContactDirectory = Arc<dyn ContactDirectory>;

/// Directory over the `students` and `staff` tables
#[derive(Clone)]
pub struct PgContactDirectory {
    pool: PgPool,
}

impl PgContactDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactDirectory for PgContactDirectory {
    async fn lookup(&self, entity: EntityRef) -> AppResult<Option<ContactCard>> {
        // Students without a phone of their own are reached through their guardian
        let sql = match entity.kind {
            EntityKind::Student => {
                r#"
                SELECT COALESCE(NULLIF(TRIM(phone), ''), guardian_phone) AS phone, email
                FROM students
                WHERE id = $1
                "#
            }
            EntityKind::Staff => {
                r#"
                SELECT phone, email
                FROM staff
                WHERE id = $1
                "#
            }
        };

        let card = sqlx::query_as::<_, ContactCard>(sql)
            .bind(entity.id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(card)
    }
}

/// In-process directory for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    entries: HashMap<EntityRef, ContactCard>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_student(mut self, id: Uuid, card: ContactCard) -> Self {
        self.entries.insert(
            EntityRef {
                kind: EntityKind::Student,
                id,
            },
            card,
        );
        self
    }

    pub fn with_staff(mut self, id: Uuid, card: ContactCard) -> Self {
        self.entries.insert(
            EntityRef {
                kind: EntityKind::Staff,
                id,
            },
            card,
        );
        self
    }
}

#[async_trait]
impl ContactDirectory for MemoryDirectory {
    async fn lookup(&self, entity: EntityRef) -> AppResult<Option<ContactCard>> {
        Ok(self.entries.get(&entity).cloned())
    }
}
