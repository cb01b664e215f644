use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::database::message_store::MessageStore;
use crate::dto::message_dto::{CreateMessagePayload, UpdateMessagePayload};
use crate::error::{Error, Result};
use crate::models::message_record::{MessageRecord, MessageRecordChanges};

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Every record, unpaginated.
    pub async fn list(&self) -> Result<Vec<MessageRecord>> {
        self.store.list().await
    }

    pub async fn create(&self, payload: CreateMessagePayload) -> Result<MessageRecord> {
        payload.validate()?;
        let record = self.store.insert(payload.into()).await?;
        tracing::info!(message_id = %record.id, bot_id = %record.bot_id, "message record created");
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<MessageRecord> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| Error::NotFound("Message not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, payload: UpdateMessagePayload) -> Result<MessageRecord> {
        payload.validate()?;
        let changes: MessageRecordChanges = payload.into();
        let record = self
            .store
            .update(id, changes)
            .await?
            .ok_or_else(|| Error::NotFound("Message not found".to_string()))?;
        tracing::info!(message_id = %id, "message record updated");
        Ok(record)
    }

    /// Succeeds whether or not the id existed.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self.store.delete(id).await?;
        tracing::info!(message_id = %id, removed, "message record delete");
        Ok(())
    }
}

pub fn parse_message_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::BadRequest(format!("Invalid message id: {}", raw)))
}
