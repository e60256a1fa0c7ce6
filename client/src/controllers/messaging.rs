use visitdesk_types::{Chat, ChatId, ChatMessage, Contact, MessageHistory, MessageId, SendMessage, UserId};

use crate::{ApiClient, ApiError};

/// `{"message": "...", "data": {...}}` acknowledgement wrapper.
#[derive(serde::Deserialize)]
struct Ack<T> {
    data: T,
}

pub struct Messaging<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Messaging<'_> {
    pub async fn chats_for_user(&self, user: UserId) -> Result<Vec<Chat>, ApiError> {
        self.client.get(&format!("api/chats/{user}/")).await
    }

    pub async fn chat_details(&self, chat: ChatId) -> Result<Chat, ApiError> {
        self.client.get(&format!("api/chats/{chat}/details/")).await
    }

    pub async fn send(&self, message: &SendMessage) -> Result<(), ApiError> {
        let _: serde_json::Value = self.client.post("api/messages/send/", message).await?;
        Ok(())
    }

    pub async fn create_chat(&self, contact: UserId) -> Result<Chat, ApiError> {
        self.client
            .post("api/chats/", &serde_json::json!({ "contact_id": contact }))
            .await
    }

    pub async fn edit(&self, message: MessageId, content: &str) -> Result<ChatMessage, ApiError> {
        let ack: Ack<ChatMessage> = self
            .client
            .put(
                &format!("api/messages/{message}/edit/"),
                &serde_json::json!({ "content": content }),
            )
            .await?;
        Ok(ack.data)
    }

    pub async fn delete(&self, message: MessageId) -> Result<(), ApiError> {
        self.client
            .delete(&format!("api/messages/{message}/delete/"))
            .await
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>, ApiError> {
        self.client.get("api/users/list/").await
    }

    /// Everything the user sent and received, across chats and broadcasts.
    pub async fn messages(&self) -> Result<MessageHistory, ApiError> {
        self.client.get("api/messages/").await
    }

    pub async fn mark_read(&self, chat: ChatId) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .client
            .post_empty(&format!("api/chats/{chat}/mark-read/"))
            .await?;
        Ok(())
    }
}
