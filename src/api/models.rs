use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatError, Result};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub content: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub group_name: Option<i64>,
}

/// Client -> server envelope.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    SingleMessage { message: String },
    /// Asks the room for its recent history; answered with an `all_message` delivery.
    FetchMessages { message: String },
}

impl ClientEnvelope {
    pub fn single(text: impl Into<String>) -> Self {
        ClientEnvelope::SingleMessage { message: text.into() }
    }

    pub fn fetch_history() -> Self {
        ClientEnvelope::FetchMessages { message: String::new() }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// A single live message broadcast to the room.
    Live,
    /// Batch of recent messages, oldest first.
    History,
    Generic,
}

impl DeliveryKind {
    fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "chat_message" => Some(DeliveryKind::Live),
            "all_message" => Some(DeliveryKind::History),
            "message" => Some(DeliveryKind::Generic),
            _ => None,
        }
    }
}

/// Server -> client envelope after schema validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Delivery {
        kind: DeliveryKind,
        messages: Vec<ChatMessage>,
    },
    Unknown {
        kind: String,
    },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    // Absent and `null` must stay distinguishable.
    #[serde(default, deserialize_with = "present")]
    message: Option<Value>,
}

fn present<'de, D>(de: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(de).map(Some)
}

impl ServerEvent {
    pub fn decode(raw: &str) -> Result<Self> {
        let env: RawEnvelope = serde_json::from_str(raw)?;
        let Some(kind) = DeliveryKind::from_type(&env.kind) else {
            return Ok(ServerEvent::Unknown { kind: env.kind });
        };
        let messages = match env.message {
            None => {
                return Err(ChatError::Decode(format!(
                    "`{}` envelope without a message field",
                    env.kind
                )));
            }
            Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<ChatMessage>>(value)?,
        };
        Ok(ServerEvent::Delivery { kind, messages })
    }
}
