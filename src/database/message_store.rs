use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::message_record::{MessageRecord, MessageRecordChanges, NewMessageRecord};

/// Persistence for the document-style message records behind `/api/messages`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn list(&self) -> Result<Vec<MessageRecord>>;
    async fn insert(&self, record: NewMessageRecord) -> Result<MessageRecord>;
    async fn find(&self, id: Uuid) -> Result<Option<MessageRecord>>;
    /// Applies only the supplied fields. `None` when the id does not resolve.
    async fn update(&self, id: Uuid, changes: MessageRecordChanges)
        -> Result<Option<MessageRecord>>;
    /// Returns the number of removed records; zero is not an error.
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn list(&self) -> Result<Vec<MessageRecord>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, text_received, response_by_bot, botid, created_at, updated_at
            FROM message_responders
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn insert(&self, record: NewMessageRecord) -> Result<MessageRecord> {
        let created = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO message_responders (text_received, response_by_bot, botid)
            VALUES ($1, $2, $3)
            RETURNING id, text_received, response_by_bot, botid, created_at, updated_at
            "#,
        )
        .bind(&record.text_received)
        .bind(&record.response_by_bot)
        .bind(&record.bot_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<MessageRecord>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, text_received, response_by_bot, botid, created_at, updated_at
            FROM message_responders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: MessageRecordChanges,
    ) -> Result<Option<MessageRecord>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            UPDATE message_responders
            SET
                text_received = COALESCE($2, text_received),
                response_by_bot = COALESCE($3, response_by_bot),
                botid = COALESCE($4, botid),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, text_received, response_by_bot, botid, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.text_received)
        .bind(changes.response_by_bot)
        .bind(changes.bot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let res = sqlx::query("DELETE FROM message_responders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }
}
