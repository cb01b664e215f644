use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A logged bot interaction as exposed by the JSON API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageRecord {
    pub id: Uuid,
    pub text_received: String,
    pub response_by_bot: String,
    #[sqlx(rename = "botid")]
    #[serde(rename = "botid")]
    pub bot_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessageRecord {
    pub text_received: String,
    pub response_by_bot: String,
    pub bot_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct MessageRecordChanges {
    pub text_received: Option<String>,
    pub response_by_bot: Option<String>,
    pub bot_id: Option<String>,
}

impl MessageRecordChanges {
    pub fn is_empty(&self) -> bool {
        self.text_received.is_none() && self.response_by_bot.is_none() && self.bot_id.is_none()
    }
}
