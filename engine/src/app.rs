//! The `App`: one session and the stores built on it.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use visitdesk_client::ApiClient;
use visitdesk_config::{Settings, VisitdeskConfig};
use visitdesk_session::{FileTokenStore, Session, SessionEvent, SessionState, TokenStore};
use visitdesk_stores::{
    AccountStore, AdvisorStore, AvailabilityStore, CalendarStore, FairInvitationStore, FairStore,
    GuideStore, ProfileStore, RegRequestStore, ReviewStore, TourReportStore, TourRequestStore,
    TourStore, VisitorStore,
};

use crate::EngineError;
use crate::router::{Navigation, guard};

/// Every store, owned by the [`App`]. Mutation goes through `&mut`.
#[derive(Debug)]
pub struct Stores {
    pub availability: AvailabilityStore,
    pub tours: TourStore,
    pub tour_requests: TourRequestStore,
    pub fairs: FairStore,
    pub fair_invitations: FairInvitationStore,
    pub reg_requests: RegRequestStore,
    pub guides: GuideStore,
    pub advisor: AdvisorStore,
    pub reviews: ReviewStore,
    pub tour_reports: TourReportStore,
    pub profile: ProfileStore,
    pub accounts: AccountStore,
    pub visitor: VisitorStore,
    pub calendar: CalendarStore,
}

impl Stores {
    fn new(session: &Session) -> Self {
        let client = session.client();
        Self {
            availability: AvailabilityStore::new(session.clone()),
            tours: TourStore::new(session.clone()),
            tour_requests: TourRequestStore::new(session.clone()),
            fairs: FairStore::new(session.clone()),
            fair_invitations: FairInvitationStore::new(client.clone()),
            reg_requests: RegRequestStore::new(session.clone()),
            guides: GuideStore::new(client.clone()),
            advisor: AdvisorStore::new(session.clone()),
            reviews: ReviewStore::new(session.clone()),
            tour_reports: TourReportStore::new(session.clone()),
            profile: ProfileStore::new(session.clone()),
            accounts: AccountStore::new(client.clone()),
            visitor: VisitorStore::new(client.clone()),
            calendar: CalendarStore::default(),
        }
    }
}

pub struct App {
    settings: Settings,
    session: Session,
    stores: Stores,
    events: broadcast::Receiver<SessionEvent>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("api_base_url", &self.settings.api_base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Settings from `~/.visitdesk/config.toml` and the environment, tokens
    /// from the configured token file.
    pub fn load() -> Result<Self, EngineError> {
        let settings = VisitdeskConfig::load()?
            .unwrap_or_default()
            .resolve()?;
        Self::new(settings)
    }

    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        let store = FileTokenStore::new(settings.token_path.clone());
        Self::with_token_store(settings, Arc::new(store))
    }

    /// Must be called inside a tokio runtime.
    pub fn with_token_store(
        settings: Settings,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self, EngineError> {
        let client = ApiClient::new(&settings).map_err(EngineError::Client)?;
        let session = Session::new(client, token_store, &settings);
        let events = session.subscribe();
        let stores = Stores::new(&session);
        tracing::debug!(api = %settings.api_base_url, ws = %settings.ws_base_url, "App created");

        Ok(Self {
            settings,
            session,
            stores,
            events,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn stores_mut(&mut self) -> &mut Stores {
        &mut self.stores
    }

    /// Restore the persisted session, if any.
    pub async fn initialize(&mut self) -> SessionState {
        self.session.initialize().await
    }

    /// Sign in and return the landing path.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, EngineError> {
        self.reset_stores();
        Ok(self.session.login(email, password).await?)
    }

    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.reset_stores();
    }

    /// Resolve a navigation request, restoring the session first when that
    /// has not happened yet.
    pub async fn navigate(&mut self, path: &str) -> Navigation {
        if !self.session.is_initialized() {
            self.session.initialize().await;
        }
        let role = self
            .session
            .is_logged_in()
            .then(|| self.session.role())
            .flatten();
        let navigation = guard(path, role);
        tracing::debug!(path, target = navigation.target(), "Navigation resolved");
        navigation
    }

    /// Session events since the last call. A session that ended drops every
    /// cached collection.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut drained = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Session events lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if drained
            .iter()
            .any(|e| *e == SessionEvent::StateChanged(SessionState::LoggedOut))
        {
            self.reset_stores();
        }
        drained
    }

    fn reset_stores(&mut self) {
        self.stores = Stores::new(&self.session);
    }
}
