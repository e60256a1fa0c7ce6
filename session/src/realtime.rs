//! The chat socket.
//!
//! One connection per signed-in session, authenticated with the access token
//! as the `token` query parameter of `{ws_base}/ws/chat/`. Pushed messages
//! are routed into [`SharedMessaging`]. After a close the task reconnects with
//! exponential backoff until `disconnect()` or the attempt budget runs out.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use visitdesk_client::{ApiClient, Backoff, BackoffConfig};
use visitdesk_types::{AccessToken, MessageType, OutgoingFrame, SocketEnvelope, UserId};

use crate::{SessionError, SessionEvent, SharedMessaging};

const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketStatus {
    Disconnected,
    Connecting,
    Open,
    /// Waiting before reconnect attempt `attempt` (1-based).
    Reconnecting { attempt: u32 },
    /// The reconnect budget ran out.
    GaveUp,
}

enum Command {
    Send(String),
    Close,
}

enum Exit {
    /// Remote close or transport error; reconnect.
    Dropped,
    /// `disconnect()` was called.
    Shutdown,
}

struct Connection {
    handle: JoinHandle<()>,
    commands: mpsc::UnboundedSender<Command>,
}

struct SocketInner {
    ws_base: Url,
    client: ApiClient,
    backoff: BackoffConfig,
    messaging: SharedMessaging,
    events: broadcast::Sender<SessionEvent>,
    connection: Mutex<Option<Connection>>,
    status: watch::Sender<SocketStatus>,
}

#[derive(Clone)]
pub struct RealtimeSocket {
    inner: Arc<SocketInner>,
}

impl std::fmt::Debug for RealtimeSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSocket")
            .field("ws_base", &self.inner.ws_base.as_str())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// `{ws_base}/ws/chat/?token=...`
pub fn socket_url(ws_base: &Url, token: &AccessToken) -> Result<Url, url::ParseError> {
    let mut url = ws_base.join("ws/chat/")?;
    url.query_pairs_mut().append_pair("token", token.as_str());
    Ok(url)
}

impl RealtimeSocket {
    pub fn new(
        ws_base: Url,
        client: ApiClient,
        backoff: BackoffConfig,
        messaging: SharedMessaging,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (status, _) = watch::channel(SocketStatus::Disconnected);
        Self {
            inner: Arc::new(SocketInner {
                ws_base,
                client,
                backoff,
                messaging,
                events,
                connection: Mutex::new(None),
                status,
            }),
        }
    }

    #[must_use]
    pub fn status(&self) -> SocketStatus {
        *self.inner.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SocketStatus> {
        self.inner.status.subscribe()
    }

    /// Start the connection task. Returns `false` without doing anything when
    /// a task is already open, connecting or waiting to reconnect, or when no
    /// access token is available.
    pub fn connect(&self) -> bool {
        let mut connection = self
            .inner
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if connection
            .as_ref()
            .is_some_and(|existing| !existing.handle.is_finished())
        {
            tracing::debug!(status = ?self.status(), "Chat socket already running");
            return false;
        }
        if self.inner.client.access_token().is_none() {
            tracing::error!("Cannot connect chat socket: no token available");
            return false;
        }

        let (commands, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(self.inner.clone(), receiver));
        *connection = Some(Connection { handle, commands });
        true
    }

    /// Close the socket and cancel any pending reconnect.
    pub async fn disconnect(&self) {
        let taken = self
            .inner
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Connection {
            mut handle,
            commands,
        }) = taken
        else {
            return;
        };

        let _ = commands.send(Command::Close);
        if tokio::time::timeout(CLOSE_GRACE, &mut handle).await.is_err() {
            handle.abort();
        }
        self.inner.status.send_replace(SocketStatus::Disconnected);
        tracing::info!("Chat socket disconnected");
    }

    /// Write a message frame in the server's receive format.
    pub fn send_frame(
        &self,
        content: &str,
        message_type: MessageType,
        receivers: Vec<UserId>,
    ) -> Result<(), SessionError> {
        if self.status() != SocketStatus::Open {
            return Err(SessionError::SocketClosed);
        }
        let frame = OutgoingFrame {
            message_type,
            content: content.to_string(),
            receivers,
        };
        let text = serde_json::to_string(&frame).map_err(SessionError::Frame)?;

        let connection = self
            .inner
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        connection
            .as_ref()
            .ok_or(SessionError::SocketClosed)?
            .commands
            .send(Command::Send(text))
            .map_err(|_| SessionError::SocketClosed)
    }
}

impl SocketInner {
    fn set_status(&self, status: SocketStatus) {
        self.status.send_replace(status);
    }

    fn handle_text(&self, text: &str) {
        let envelope: SocketEnvelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable chat socket frame");
                return;
            }
        };

        let Some(message) = envelope.message else {
            if let Some(error) = envelope.error {
                tracing::warn!(error = %error, "Chat socket reported an error");
            } else {
                tracing::debug!(success = ?envelope.success, "Chat socket acknowledgement");
            }
            return;
        };

        tracing::debug!(id = %message.id, kind = %message.message_type, "Chat message pushed");
        let notification = self.messaging.lock().apply_incoming(message);
        if let Some(text) = notification {
            let _ = self.events.send(SessionEvent::info(text));
        }
    }
}

async fn run(inner: Arc<SocketInner>, mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut backoff = Backoff::new(inner.backoff.clone());

    loop {
        let Some(token) = inner.client.access_token() else {
            tracing::error!("Cannot connect chat socket: no token available");
            break;
        };
        let url = match socket_url(&inner.ws_base, &token) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "Invalid chat socket URL");
                break;
            }
        };

        inner.set_status(SocketStatus::Connecting);
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!("Chat socket connected");
                backoff.reset();
                inner.set_status(SocketStatus::Open);
                if let Exit::Shutdown = pump(&inner, stream, &mut commands).await {
                    inner.set_status(SocketStatus::Disconnected);
                    return;
                }
                tracing::info!("Chat socket closed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat socket connect failed");
            }
        }

        let Some(delay) = backoff.next_delay() else {
            tracing::warn!(attempts = backoff.attempts(), "Giving up on chat socket reconnect");
            inner.set_status(SocketStatus::GaveUp);
            return;
        };
        inner.set_status(SocketStatus::Reconnecting {
            attempt: backoff.attempts(),
        });
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Reconnecting chat socket");
        if let Exit::Shutdown = wait_or_shutdown(delay, &mut commands).await {
            inner.set_status(SocketStatus::Disconnected);
            return;
        }
    }

    inner.set_status(SocketStatus::Disconnected);
}

async fn wait_or_shutdown(delay: Duration, commands: &mut mpsc::UnboundedReceiver<Command>) -> Exit {
    let deadline = Instant::now() + delay;
    loop {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => return Exit::Dropped,
            command = commands.recv() => match command {
                Some(Command::Send(_)) => {
                    tracing::warn!("Dropping chat frame while disconnected");
                }
                Some(Command::Close) | None => return Exit::Shutdown,
            },
        }
    }
}

async fn pump<S>(
    inner: &SocketInner,
    stream: tokio_tungstenite::WebSocketStream<S>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Exit
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => inner.handle_text(text.as_str()),
                Some(Ok(Message::Close(_))) | None => return Exit::Dropped,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Chat socket error");
                    return Exit::Dropped;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        tracing::warn!(error = %e, "Failed to write chat frame");
                        return Exit::Dropped;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = sink.close().await;
                    return Exit::Shutdown;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::net::TcpListener;
    use visitdesk_types::{RefreshToken, TokenPair};

    use super::*;

    /// Accepts socket connections, counts them, and pushes `frames` to each.
    async fn chat_server(frames: Vec<String>) -> (Url, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicU32::new(0));
        let counter = accepted.clone();

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let frames = frames.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                        return;
                    };
                    for frame in frames {
                        let _ = ws.send(Message::Text(frame.into())).await;
                    }
                    while let Some(Ok(msg)) = ws.next().await {
                        if msg.is_close() {
                            break;
                        }
                    }
                });
            }
        });

        (Url::parse(&format!("ws://{addr}/")).unwrap(), accepted)
    }

    fn fast_backoff() -> BackoffConfig {
        BackoffConfig {
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(40),
            max_attempts: 3,
            jitter_factor: 0.0,
        }
    }

    fn socket(
        ws_base: Url,
        messaging: SharedMessaging,
        backoff: BackoffConfig,
    ) -> (RealtimeSocket, broadcast::Receiver<SessionEvent>) {
        let client = ApiClient::with_base_url(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        client.set_credentials(TokenPair {
            access: AccessToken::new("tok"),
            refresh: RefreshToken::new("r"),
        });
        let (events, rx) = broadcast::channel(16);
        let socket = RealtimeSocket::new(
            ws_base,
            client,
            backoff,
            messaging,
            events,
        );
        (socket, rx)
    }

    async fn wait_for(socket: &RealtimeSocket, wanted: SocketStatus) {
        let mut status = socket.watch_status();
        tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| *s == wanted))
            .await
            .expect("status change timed out")
            .expect("status channel closed");
    }

    #[test]
    fn url_carries_token_query() {
        let base = Url::parse("ws://localhost:8001/").unwrap();
        let url = socket_url(&base, &AccessToken::new("abc")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8001/ws/chat/?token=abc");
    }

    #[tokio::test]
    async fn connect_is_idempotent_while_open() {
        let (base, accepted) = chat_server(Vec::new()).await;
        let (socket, _events) = socket(base, SharedMessaging::new(), fast_backoff());

        assert!(socket.connect());
        assert!(!socket.connect());
        wait_for(&socket, SocketStatus::Open).await;
        assert!(!socket.connect());

        socket.disconnect().await;
        assert_eq!(socket.status(), SocketStatus::Disconnected);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pushed_messages_are_routed_and_notify() {
        let frames = vec![
            r#"{"success": "Connected"}"#.to_string(),
            "not json".to_string(),
            serde_json::json!({"message": {
                "id": 5, "sender": {"id": 2, "name": "Bo"}, "chat": 9,
                "message_type": "direct", "content": "hi",
                "timestamp": "2024-12-01T10:00:00Z", "is_seen": false
            }})
            .to_string(),
        ];
        let (base, _) = chat_server(frames).await;
        let messaging = SharedMessaging::new();
        messaging.lock().set_self(Some(UserId::new(1)));
        let (socket, mut events) = socket(base, messaging.clone(), fast_backoff());

        socket.connect();
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, SessionEvent::info("New message from Bo"));
        assert_eq!(messaging.lock().chats.len(), 1);

        socket.disconnect().await;
    }

    #[tokio::test]
    async fn unreachable_server_gives_up_after_budget() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("ws://{addr}/")).unwrap();
        let (socket, _events) = socket(base, SharedMessaging::new(), fast_backoff());
        socket.connect();

        wait_for(&socket, SocketStatus::GaveUp).await;
        // A finished task no longer blocks a fresh connect.
        let mut reconnected = false;
        for _ in 0..50 {
            if socket.connect() {
                reconnected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reconnected);
        socket.disconnect().await;
    }

    #[tokio::test]
    async fn disconnect_cancels_pending_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("ws://{addr}/")).unwrap();
        let slow = BackoffConfig {
            initial_delay: Duration::from_secs(30),
            ..fast_backoff()
        };
        let (socket, _events) = socket(base, SharedMessaging::new(), slow);
        socket.connect();
        wait_for(&socket, SocketStatus::Reconnecting { attempt: 1 }).await;

        tokio::time::timeout(Duration::from_secs(2), socket.disconnect())
            .await
            .expect("disconnect waited for the backoff");
        assert_eq!(socket.status(), SocketStatus::Disconnected);
        assert!(socket.send_frame("x", MessageType::Direct, Vec::new()).is_err());
    }

    #[tokio::test]
    async fn secure_socket_urls_reach_the_tls_handshake() {
        use tokio_tungstenite::tungstenite::Error;
        use tokio_tungstenite::tungstenite::error::UrlError;

        // Accepts TCP and hangs up, so the TLS handshake fails.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                drop(tcp);
            }
        });

        let base = Url::parse(&format!("wss://{addr}/")).unwrap();
        let url = socket_url(&base, &AccessToken::new("x")).unwrap();
        let Err(err) = tokio_tungstenite::connect_async(url.as_str()).await else {
            panic!("server hangs up before the handshake");
        };
        assert!(
            !matches!(err, Error::Url(UrlError::TlsFeatureNotEnabled)),
            "wss rejected before connecting: {err}"
        );
    }

    #[tokio::test]
    async fn server_close_reconnects_with_a_fresh_budget() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicU32::new(0));
        let counter = accepted.clone();

        // Completes the handshake, then closes straight away.
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    if let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await {
                        let _ = ws.close(None).await;
                    }
                });
            }
        });

        let base = Url::parse(&format!("ws://{addr}/")).unwrap();
        let one_attempt = BackoffConfig {
            max_attempts: 1,
            ..fast_backoff()
        };
        let (socket, _events) = socket(base, SharedMessaging::new(), one_attempt);
        socket.connect();

        // With a single attempt per outage, a third connection is only
        // possible if each successful connect reset the counter.
        let mut reconnected = false;
        for _ in 0..250 {
            if accepted.load(Ordering::SeqCst) > 2 {
                reconnected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(reconnected, "only {} connections", accepted.load(Ordering::SeqCst));
        assert_ne!(socket.status(), SocketStatus::GaveUp);

        socket.disconnect().await;
        assert_eq!(socket.status(), SocketStatus::Disconnected);
    }
}
