//! Chats and broadcasts: the state both the socket task and REST calls write to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use visitdesk_client::{ApiClient, ApiError};
use visitdesk_types::{
    BroadcastEntry, Chat, ChatId, ChatMessage, Contact, MessageId, MessageType, SendMessage,
    UserId,
};

#[derive(Debug, Default)]
pub struct MessagingState {
    /// Open chats. Incoming messages for unknown chats synthesize one at the front.
    pub chats: Vec<Chat>,
    /// Newest first, unique by id.
    pub broadcasts: Vec<BroadcastEntry>,
    pub contacts: Vec<Contact>,
    pub active_chat: Option<ChatId>,
    pub active_broadcast: Option<MessageId>,
    self_id: Option<UserId>,
}

impl MessagingState {
    /// The signed-in user; their own messages never raise a notification.
    pub fn set_self(&mut self, user: Option<UserId>) {
        self.self_id = user;
    }

    #[must_use]
    pub fn self_id(&self) -> Option<UserId> {
        self.self_id
    }

    #[must_use]
    pub fn chat(&self, id: ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == id)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Route a pushed message into chats or broadcasts. Returns the
    /// notification text when someone else sent a direct message.
    pub fn apply_incoming(&mut self, message: ChatMessage) -> Option<String> {
        match message.message_type {
            MessageType::Broadcast => {
                self.upsert_broadcast(message);
                None
            }
            MessageType::Direct => {
                let notification = (self.self_id != Some(message.sender.id))
                    .then(|| format!("New message from {}", message.sender.name));
                self.append_direct(message);
                notification
            }
        }
    }

    fn upsert_broadcast(&mut self, message: ChatMessage) {
        match self.broadcasts.iter_mut().find(|entry| entry.id == message.id) {
            Some(existing) => {
                existing.content = message.content;
                existing.timestamp = message.timestamp;
                existing.is_seen = message.is_seen;
            }
            None => self.broadcasts.insert(0, BroadcastEntry::from(message)),
        }
    }

    fn append_direct(&mut self, message: ChatMessage) {
        let Some(chat_id) = message.chat else {
            tracing::warn!(message = %message.id, "Direct message without a chat id");
            return;
        };
        let timestamp = message.timestamp;

        if let Some(chat) = self.chats.iter_mut().find(|chat| chat.id == chat_id) {
            chat.messages.push(message);
            chat.last_message_timestamp = Some(timestamp);
            return;
        }

        let participant1 =
            (self.self_id != Some(message.sender.id)).then(|| message.sender.clone());
        self.chats.insert(
            0,
            Chat {
                id: chat_id,
                participant1,
                participant2: None,
                created_at: None,
                messages: vec![message],
                last_message_timestamp: Some(timestamp),
            },
        );
    }
}

/// Handle shared between the socket task and [`MessagingStore`].
#[derive(Debug, Clone, Default)]
pub struct SharedMessaging(Arc<Mutex<MessagingState>>);

impl SharedMessaging {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, MessagingState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// REST side of messaging. Every call fetches first and then patches the
/// shared state.
#[derive(Debug, Clone)]
pub struct MessagingStore {
    client: ApiClient,
    state: SharedMessaging,
}

impl MessagingStore {
    #[must_use]
    pub fn new(client: ApiClient, state: SharedMessaging) -> Self {
        Self { client, state }
    }

    #[must_use]
    pub fn state(&self) -> &SharedMessaging {
        &self.state
    }

    pub async fn fetch_chats_for_user(&self, user: UserId) -> Result<(), ApiError> {
        let chats = self.client.messaging().chats_for_user(user).await?;
        self.state.lock().chats = chats;
        Ok(())
    }

    /// Broadcasts the user received or sent, newest first.
    pub async fn fetch_broadcast_messages(&self) -> Result<(), ApiError> {
        let history = self.client.messaging().messages().await?;
        let mut broadcasts: Vec<ChatMessage> = history
            .received_messages
            .into_iter()
            .chain(history.sent_messages)
            .filter(|message| message.message_type == MessageType::Broadcast)
            .collect();
        broadcasts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        self.state.lock().broadcasts = broadcasts.into_iter().map(BroadcastEntry::from).collect();
        Ok(())
    }

    /// Reload one chat's messages, oldest first. Chats not in the list are left alone.
    pub async fn fetch_messages(&self, chat_id: ChatId) -> Result<(), ApiError> {
        let mut details = self.client.messaging().chat_details(chat_id).await?;
        details.messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut state = self.state.lock();
        if let Some(chat) = state.chats.iter_mut().find(|chat| chat.id == chat_id) {
            chat.messages = details.messages;
        }
        Ok(())
    }

    pub async fn fetch_contacts(&self) -> Result<(), ApiError> {
        let contacts = self.client.messaging().contacts().await?;
        self.state.lock().contacts = contacts;
        Ok(())
    }

    /// Open a chat with `contact`, append it and make it active.
    pub async fn create_chat(&self, contact: UserId) -> Result<Chat, ApiError> {
        let chat = self.client.messaging().create_chat(contact).await?;
        self.state.lock().chats.push(chat.clone());
        self.set_active_chat(chat.id).await?;
        Ok(chat)
    }

    pub async fn send_message(
        &self,
        chat_id: Option<ChatId>,
        content: &str,
        message_type: MessageType,
        receivers: Vec<UserId>,
    ) -> Result<(), ApiError> {
        let request = SendMessage {
            chat_id,
            content: content.to_string(),
            message_type,
            receivers,
        };
        self.client.messaging().send(&request).await?;

        match (message_type, chat_id) {
            (MessageType::Direct, Some(chat_id)) => self.fetch_messages(chat_id).await,
            (MessageType::Direct, None) => Ok(()),
            (MessageType::Broadcast, _) => self.fetch_broadcast_messages().await,
        }
    }

    pub async fn set_active_chat(&self, chat_id: ChatId) -> Result<(), ApiError> {
        {
            let mut state = self.state.lock();
            state.active_chat = Some(chat_id);
            state.active_broadcast = None;
        }
        self.fetch_messages(chat_id).await
    }

    pub async fn set_active_broadcast(&self, id: MessageId) -> Result<(), ApiError> {
        {
            let mut state = self.state.lock();
            state.active_broadcast = Some(id);
            state.active_chat = None;
        }
        self.fetch_broadcast_messages().await
    }

    /// Mark everything the other participant sent in `chat_id` as seen.
    pub async fn mark_read(&self, chat_id: ChatId) -> Result<(), ApiError> {
        self.client.messaging().mark_read(chat_id).await?;

        let mut state = self.state.lock();
        let me = state.self_id();
        if let Some(chat) = state.chats.iter_mut().find(|chat| chat.id == chat_id) {
            for message in chat
                .messages
                .iter_mut()
                .filter(|message| Some(message.sender.id) != me)
            {
                message.is_seen = true;
            }
        }
        Ok(())
    }

    pub async fn edit_message(&self, id: MessageId, content: &str) -> Result<(), ApiError> {
        let edited = self.client.messaging().edit(id, content).await?;

        let mut state = self.state.lock();
        for chat in &mut state.chats {
            if let Some(message) = chat.messages.iter_mut().find(|message| message.id == id) {
                message.content.clone_from(&edited.content);
            }
        }
        if let Some(entry) = state.broadcasts.iter_mut().find(|entry| entry.id == id) {
            entry.content = edited.content;
        }
        Ok(())
    }

    pub async fn delete_message(&self, id: MessageId) -> Result<(), ApiError> {
        self.client.messaging().delete(id).await?;

        let mut state = self.state.lock();
        for chat in &mut state.chats {
            chat.messages.retain(|message| message.id != id);
        }
        state.broadcasts.retain(|entry| entry.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use visitdesk_config::Settings;
    use visitdesk_types::{AccessToken, Participant, RefreshToken, TokenPair};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn message(id: u64, sender: u64, kind: MessageType, chat: Option<u64>, secs: i64) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(id),
            sender: Participant {
                id: UserId::new(sender),
                name: format!("user{sender}"),
                profile_picture: None,
                role: None,
            },
            chat: chat.map(ChatId::new),
            message_type: kind,
            content: format!("m{id}"),
            timestamp: at(secs),
            is_seen: false,
        }
    }

    #[test]
    fn broadcasts_are_deduplicated_by_id() {
        let mut state = MessagingState::default();
        state.apply_incoming(message(1, 2, MessageType::Broadcast, None, 10));
        state.apply_incoming(message(2, 2, MessageType::Broadcast, None, 20));

        let mut repeat = message(1, 2, MessageType::Broadcast, None, 30);
        repeat.content = "edited".into();
        repeat.is_seen = true;
        state.apply_incoming(repeat);

        assert_eq!(state.broadcasts.len(), 2);
        assert_eq!(state.broadcasts[0].id, MessageId::new(2));
        let first = &state.broadcasts[1];
        assert_eq!(first.content, "edited");
        assert_eq!(first.timestamp, at(30));
        assert!(first.is_seen);
    }

    #[test]
    fn direct_message_appends_to_open_chat() {
        let mut state = MessagingState::default();
        state.set_self(Some(UserId::new(1)));
        state.apply_incoming(message(1, 2, MessageType::Direct, Some(9), 10));
        let note = state.apply_incoming(message(2, 2, MessageType::Direct, Some(9), 20));

        assert_eq!(state.chats.len(), 1);
        let chat = state.chat(ChatId::new(9)).unwrap();
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.last_message_timestamp, Some(at(20)));
        assert_eq!(note.as_deref(), Some("New message from user2"));
    }

    #[test]
    fn unknown_chat_is_synthesized_at_the_front() {
        let mut state = MessagingState::default();
        state.set_self(Some(UserId::new(1)));
        state.apply_incoming(message(1, 2, MessageType::Direct, Some(9), 10));
        state.apply_incoming(message(2, 3, MessageType::Direct, Some(11), 20));

        assert_eq!(state.chats[0].id, ChatId::new(11));
        assert_eq!(
            state.chats[0].participant1.as_ref().map(|p| p.id),
            Some(UserId::new(3))
        );
    }

    #[test]
    fn own_messages_do_not_notify() {
        let mut state = MessagingState::default();
        state.set_self(Some(UserId::new(1)));
        assert!(
            state
                .apply_incoming(message(1, 1, MessageType::Direct, Some(9), 10))
                .is_none()
        );
        assert!(
            state
                .apply_incoming(message(2, 2, MessageType::Broadcast, None, 10))
                .is_none()
        );
    }

    fn store_for(server: &MockServer) -> MessagingStore {
        let client = ApiClient::new(&Settings::for_base_url(&server.uri()).unwrap()).unwrap();
        client.set_credentials(TokenPair {
            access: AccessToken::new("a"),
            refresh: RefreshToken::new("r"),
        });
        MessagingStore::new(client, SharedMessaging::new())
    }

    fn wire(id: u64, kind: &str, secs: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "sender": {"id": 2, "name": "Bo"},
            "chat": null,
            "message_type": kind,
            "content": format!("m{id}"),
            "timestamp": at(secs).to_rfc3339(),
            "is_seen": false
        })
    }

    #[tokio::test]
    async fn broadcast_history_merges_filters_and_sorts_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "received_messages": [wire(1, "broadcast", 10), wire(2, "direct", 50)],
                "sent_messages": [wire(3, "broadcast", 30)],
                "unseen_count": 1
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.fetch_broadcast_messages().await.unwrap();

        let ids: Vec<u64> = store
            .state()
            .lock()
            .broadcasts
            .iter()
            .map(|entry| entry.id.value())
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn chat_messages_are_sorted_oldest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 9, "messages": null}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/chats/9/details/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 9,
                "messages": [wire(2, "direct", 20), wire(1, "direct", 10)]
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.fetch_chats_for_user(UserId::new(5)).await.unwrap();
        store.set_active_chat(ChatId::new(9)).await.unwrap();

        let state = store.state().lock();
        assert_eq!(state.active_chat, Some(ChatId::new(9)));
        let ids: Vec<u64> = state.chats[0]
            .messages
            .iter()
            .map(|m| m.id.value())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
