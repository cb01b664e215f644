use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::message_record::{MessageRecord, MessageRecordChanges, NewMessageRecord};

/// Accepts a bot identifier sent either as a JSON string or a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMessagePayload {
    #[validate(
        required(message = "text_received is required"),
        length(min = 1, message = "text_received is required")
    )]
    pub text_received: Option<String>,
    #[validate(
        required(message = "response_by_bot is required"),
        length(min = 1, message = "response_by_bot is required")
    )]
    pub response_by_bot: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(
        required(message = "botid is required"),
        length(min = 1, message = "botid is required")
    )]
    #[schema(value_type = Option<String>)]
    pub botid: Option<String>,
}

impl From<CreateMessagePayload> for NewMessageRecord {
    fn from(value: CreateMessagePayload) -> Self {
        Self {
            text_received: value.text_received.unwrap_or_default(),
            response_by_bot: value.response_by_bot.unwrap_or_default(),
            bot_id: value.botid.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMessagePayload {
    #[validate(length(min = 1, message = "text_received cannot be empty"))]
    pub text_received: Option<String>,
    #[validate(length(min = 1, message = "response_by_bot cannot be empty"))]
    pub response_by_bot: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(length(min = 1, message = "botid cannot be empty"))]
    #[schema(value_type = Option<String>)]
    pub botid: Option<String>,
}

impl From<UpdateMessagePayload> for MessageRecordChanges {
    fn from(value: UpdateMessagePayload) -> Self {
        Self {
            text_received: value.text_received,
            response_by_bot: value.response_by_bot,
            bot_id: value.botid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub text_received: String,
    pub response_by_bot: String,
    pub botid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MessageRecord> for MessageResponse {
    fn from(value: MessageRecord) -> Self {
        Self {
            id: value.id,
            text_received: value.text_received,
            response_by_bot: value.response_by_bot,
            botid: value.bot_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteMessageResponse {
    pub message: String,
}
