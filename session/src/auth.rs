//! Session lifecycle: login, logout, startup restore and token refresh.

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use visitdesk_client::{ApiClient, ApiError, BackoffConfig, CredentialEvent, jwt};
use visitdesk_config::Settings;
use visitdesk_types::{Credentials, Role, TokenPair, UserProfile};

use crate::{
    MessagingStore, RealtimeSocket, SessionError, SessionEvent, SessionState, SharedMessaging,
    TokenStore,
};

const EVENT_CAPACITY: usize = 64;
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Default)]
struct Snapshot {
    state: SessionState,
    profile: Option<UserProfile>,
}

struct SessionInner {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    socket: RealtimeSocket,
    messaging: SharedMessaging,
    refresh_lead: Duration,
    snapshot: RwLock<Snapshot>,
    refresh_timer: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
    initialized: watch::Sender<bool>,
}

/// The signed-in user and everything tied to their tokens.
///
/// Cheap to clone. Must be created inside a tokio runtime: it spawns a task
/// that follows credential changes made by the HTTP client.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("role", &self.role())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>, settings: &Settings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let messaging = SharedMessaging::new();
        let socket = RealtimeSocket::new(
            settings.ws_base_url.clone(),
            client.clone(),
            BackoffConfig::from(settings.reconnect),
            messaging.clone(),
            events.clone(),
        );
        let (initialized, _) = watch::channel(false);

        let inner = Arc::new(SessionInner {
            client,
            store,
            socket,
            messaging,
            refresh_lead: settings.refresh_lead,
            snapshot: RwLock::new(Snapshot::default()),
            refresh_timer: Mutex::new(None),
            events,
            initialized,
        });
        spawn_credential_watcher(&inner);
        Self { inner }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    #[must_use]
    pub fn socket(&self) -> &RealtimeSocket {
        &self.inner.socket
    }

    /// REST handle onto the same chat state the socket writes to.
    #[must_use]
    pub fn messaging(&self) -> MessagingStore {
        MessagingStore::new(self.inner.client.clone(), self.inner.messaging.clone())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.read().profile.clone()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.inner.read().profile.as_ref().map(|p| p.role)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state().is_logged_in()
    }

    /// Record a new profile picture URL on the signed-in profile.
    pub fn set_profile_picture(&self, url: impl Into<String>) {
        let mut snapshot = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(profile) = snapshot.profile.as_mut() {
            profile.profile_picture = Some(url.into());
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        *self.inner.initialized.borrow()
    }

    /// Resolves once [`Session::initialize`] has finished.
    pub async fn wait_initialized(&self) {
        let mut rx = self.inner.initialized.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }

    #[must_use]
    pub fn has_pending_refresh(&self) -> bool {
        self.inner
            .refresh_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Exchange credentials for tokens, load the profile and start the
    /// session. Returns the landing path, `"/" + role`.
    ///
    /// A session that is still running is torn down first, so the socket and
    /// refresh timer always belong to the account that signed in last.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, SessionError> {
        let inner = &self.inner;
        inner.stop_running().await;
        inner.set_state(SessionState::Authenticating);

        let result: Result<UserProfile, SessionError> = async {
            let credentials = Credentials::new(email, password);
            let tokens = inner.client.auth().login(&credentials).await?;
            inner.client.set_credentials(tokens.clone());
            inner.store.save(&tokens)?;
            Ok(inner.client.auth().profile().await?)
        }
        .await;

        match result {
            Ok(profile) => {
                let path = profile.role.home_path();
                tracing::info!(user = %profile.id, role = %profile.role, "Signed in");
                inner.start(profile);
                let _ = inner.events.send(SessionEvent::Redirect(path.clone()));
                Ok(path)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Login failed");
                inner.client.clear_credentials();
                if let Err(e) = inner.store.clear() {
                    tracing::warn!(error = %e, "Failed to clear token file after failed login");
                }
                inner.set_state(SessionState::Anonymous);
                Err(err)
            }
        }
    }

    /// Restore a persisted session. Always marks the session initialized.
    pub async fn initialize(&self) -> SessionState {
        let inner = &self.inner;
        let stored = match inner.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable token file");
                None
            }
        };

        if let Some(tokens) = stored {
            inner.client.set_credentials(tokens);
            inner.set_state(SessionState::Authenticated);

            match inner.client.auth().profile().await {
                Ok(profile) => {
                    tracing::info!(user = %profile.id, role = %profile.role, "Restored session");
                    inner.start(profile);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored session rejected");
                    inner.force_logout().await;
                }
            }
        }

        inner.initialized.send_replace(true);
        self.state()
    }

    /// Clear tokens everywhere, stop the refresh timer and the socket, and
    /// send the user to `/login`.
    pub async fn logout(&self) {
        self.inner.logout().await;
    }

    /// Refresh now instead of waiting for the timer. Failure logs out.
    pub async fn refresh_now(&self) -> Result<(), SessionError> {
        self.inner.run_refresh().await
    }
}

impl SessionInner {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        let changed = {
            let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            let changed = snapshot.state != state;
            snapshot.state = state;
            changed
        };
        if changed {
            tracing::debug!(%state, "Session state changed");
            let _ = self.events.send(SessionEvent::StateChanged(state));
        }
    }

    /// Profile confirmed: mark authenticated, open the socket, arm the timer.
    fn start(self: &Arc<Self>, profile: UserProfile) {
        self.messaging.lock().set_self(Some(profile.id));
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .profile = Some(profile);
        self.set_state(SessionState::Authenticated);
        if !self.socket.connect() {
            tracing::debug!("Chat socket not started");
        }
        self.schedule_refresh();
    }

    fn schedule_refresh(self: &Arc<Self>) {
        let Some(access) = self.client.access_token() else {
            return;
        };
        let delay = match jwt::expires_at(&access) {
            Ok(exp) => jwt::refresh_delay(exp, self.refresh_lead, Utc::now()),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot schedule refresh: unreadable access token");
                return;
            }
        };

        tracing::debug!(delay_secs = delay.as_secs(), "Scheduling token refresh");
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                // Detach first so rescheduling from inside does not abort this task.
                inner
                    .refresh_timer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                let _ = inner.run_refresh().await;
            }
        });

        let previous = self
            .refresh_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn cancel_refresh(&self) {
        let pending = self
            .refresh_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = pending {
            handle.abort();
        }
    }

    async fn run_refresh(self: &Arc<Self>) -> Result<(), SessionError> {
        if self.client.credentials().is_none() {
            return Err(SessionError::NotAuthenticated);
        }
        self.set_state(SessionState::Refreshing);

        match self.client.auth().refresh().await {
            Ok(tokens) => {
                self.persist(&tokens);
                self.set_state(SessionState::Authenticated);
                self.schedule_refresh();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Proactive token refresh failed");
                self.force_logout().await;
                Err(e.into())
            }
        }
    }

    fn persist(&self, tokens: &TokenPair) {
        if let Err(e) = self.store.save(tokens) {
            tracing::warn!(error = %e, "Failed to persist refreshed tokens");
        }
    }

    /// Logout triggered by a failure rather than the user. Skipped when the
    /// session is already over.
    async fn force_logout(self: &Arc<Self>) {
        // Claim the transition so a concurrent expiry does not log out twice.
        {
            let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            if matches!(
                snapshot.state,
                SessionState::LoggedOut | SessionState::Anonymous
            ) {
                return;
            }
            snapshot.state = SessionState::LoggedOut;
        }
        let _ = self
            .events
            .send(SessionEvent::StateChanged(SessionState::LoggedOut));
        let _ = self.events.send(SessionEvent::Notification {
            level: crate::NotificationLevel::Warning,
            text: "Your session has expired. Please sign in again.".to_string(),
        });
        self.logout().await;
    }

    /// Stop the timer and the socket and drop the cached user, without
    /// touching tokens or redirecting.
    async fn stop_running(&self) {
        self.cancel_refresh();
        self.socket.disconnect().await;
        self.messaging.lock().clear();
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .profile = None;
    }

    async fn logout(&self) {
        self.stop_running().await;
        self.client.clear_credentials();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to remove token file");
        }
        self.set_state(SessionState::LoggedOut);
        tracing::info!("Signed out");
        let _ = self.events.send(SessionEvent::Redirect(LOGIN_PATH.to_string()));
    }
}

/// Follow refreshes and expiries the HTTP client performs on its own.
fn spawn_credential_watcher(inner: &Arc<SessionInner>) {
    let mut credentials = inner.client.subscribe();
    let weak = Arc::downgrade(inner);

    tokio::spawn(async move {
        loop {
            let event = match credentials.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Credential watcher lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(inner) = weak.upgrade() else { break };

            match event {
                CredentialEvent::Rotated(tokens) => {
                    inner.persist(&tokens);
                    if inner.read().state.is_logged_in() {
                        inner.schedule_refresh();
                    }
                }
                CredentialEvent::Expired => inner.force_logout().await,
            }
        }
    });
}

/// Whether an error means the stored session is no longer usable.
#[must_use]
pub fn is_session_failure(err: &SessionError) -> bool {
    matches!(err, SessionError::NotAuthenticated)
        || matches!(err, SessionError::Api(api) if api.is_auth_failure())
}

impl From<&ApiError> for SessionEvent {
    fn from(err: &ApiError) -> Self {
        Self::Notification {
            level: crate::NotificationLevel::Error,
            text: err.server_message().unwrap_or_else(|| err.to_string()),
        }
    }
}
