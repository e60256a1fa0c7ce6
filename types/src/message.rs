//! Chats, messages and the real-time envelope.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChatId, MessageId, Role, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Direct,
    Broadcast,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public descriptor of a user as it appears on messages and chats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Participant,
    #[serde(default)]
    pub chat: Option<ChatId>,
    #[serde(default)]
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_seen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub participant1: Option<Participant>,
    #[serde(default)]
    pub participant2: Option<Participant>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Oldest first once loaded through the store. The server sends `null`
    /// unless details were requested.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub last_message_timestamp: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ChatMessage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ChatMessage>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A broadcast as held by the messaging store: keyed by the server message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEntry {
    pub id: MessageId,
    pub sender: Participant,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_seen: bool,
}

impl From<ChatMessage> for BroadcastEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            sender: message.sender,
            content: message.content,
            timestamp: message.timestamp,
            is_seen: message.is_seen,
        }
    }
}

/// Response of `GET api/messages/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageHistory {
    #[serde(default)]
    pub received_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub sent_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub unseen_count: u64,
}

/// Body of `POST api/messages/send/`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: Option<ChatId>,
    pub content: String,
    pub message_type: MessageType,
    pub receivers: Vec<UserId>,
}

/// Frame the chat socket pushes to subscribers: `{"message": {...}}` for chat
/// traffic, `{"success": ...}` / `{"error": ...}` acknowledgements otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketEnvelope {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Frame a client writes to the chat socket.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingFrame {
    pub message_type: MessageType,
    pub content: String,
    pub receivers: Vec<UserId>,
}

/// Entry of `GET api/users/list/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_message_parses_server_serializer_shape() {
        let frame = serde_json::json!({
            "message": {
                "id": 5,
                "sender": {"id": 2, "name": "Bo", "profile_picture": null, "role": "advisor"},
                "receivers": [],
                "chat": 9,
                "message_type": "direct",
                "content": "hello",
                "timestamp": "2024-12-01T10:00:00.123456Z",
                "is_seen": false
            }
        });
        let envelope: SocketEnvelope = serde_json::from_value(frame).unwrap();
        let message = envelope.message.unwrap();
        assert_eq!(message.chat, Some(ChatId::new(9)));
        assert_eq!(message.sender.role, Some(Role::Advisor));
        assert_eq!(message.message_type, MessageType::Direct);
    }

    #[test]
    fn acknowledgement_envelope_has_no_message() {
        let envelope: SocketEnvelope =
            serde_json::from_str(r#"{"success": "Message sent successfully."}"#).unwrap();
        assert!(envelope.message.is_none());
        assert!(envelope.success.is_some());
    }

    #[test]
    fn chat_without_details_has_empty_messages() {
        let chat: Chat = serde_json::from_value(serde_json::json!({
            "id": 1,
            "participant1": {"id": 1, "name": "A"},
            "participant2": {"id": 2, "name": "B"},
            "created_at": "2024-11-30T09:00:00Z",
            "messages": null
        }))
        .unwrap();
        assert!(chat.messages.is_empty());
    }
}
