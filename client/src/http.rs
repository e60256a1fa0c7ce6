//! The single HTTP client shared by every controller.
//!
//! One policy for every request: bearer token when a session exists, one
//! configurable timeout, and a single refresh-and-retry when the server
//! answers 401. Concurrent 401s coalesce on one refresh.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use url::Url;
use visitdesk_config::Settings;
use visitdesk_types::{AccessToken, RefreshedAccess, TokenPair};

use crate::ApiError;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const EVENT_CAPACITY: usize = 16;

pub(crate) const REFRESH_PATH: &str = "auth/refresh/";

/// Credential changes the client made on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialEvent {
    /// The access token was refreshed (and possibly the refresh token rotated).
    Rotated(TokenPair),
    /// A reactive refresh failed or the retried request got 401 again. The
    /// credentials have already been cleared.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

enum Payload<'a> {
    Empty,
    Json(serde_json::Value),
    Multipart(&'a (dyn Fn() -> Form + Send + Sync)),
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<RwLock<Option<TokenPair>>>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<CredentialEvent>,
}

/// Cheap to clone; clones share credentials and the refresh lock.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("signed_in", &self.credentials().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        Self::with_base_url(settings.api_base_url.clone(), settings.request_timeout)
    }

    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ApiError::Build)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                credentials: Arc::new(RwLock::new(None)),
                refresh_lock: Mutex::new(()),
                events,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    #[must_use]
    pub fn credentials(&self) -> Option<TokenPair> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|pair| pair.access.clone())
    }

    pub fn set_credentials(&self, pair: TokenPair) {
        *self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(pair);
    }

    pub fn clear_credentials(&self) {
        *self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.inner.events.subscribe()
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Serialized with reactive refreshes. Does not emit
    /// [`CredentialEvent::Expired`] on failure; the caller decides.
    pub async fn refresh_access(&self) -> Result<TokenPair, ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;
        self.rotate_locked().await
    }

    async fn rotate_locked(&self) -> Result<TokenPair, ApiError> {
        let current = self.credentials().ok_or(ApiError::NoSession)?;
        let body = serde_json::json!({ "refresh": current.refresh.as_str() });
        let response = self
            .send_once(Method::POST, REFRESH_PATH, Auth::Anonymous, None, &Payload::Json(body))
            .await?;
        let refreshed: RefreshedAccess = decode(REFRESH_PATH, response).await?;

        let pair = TokenPair {
            access: refreshed.access,
            refresh: refreshed.refresh.unwrap_or(current.refresh),
        };
        {
            let mut slot = self
                .inner
                .credentials
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            // Logged out while the refresh was in flight.
            if slot.is_none() {
                return Err(ApiError::NoSession);
            }
            *slot = Some(pair.clone());
        }
        tracing::debug!("Access token refreshed");
        let _ = self.inner.events.send(CredentialEvent::Rotated(pair.clone()));
        Ok(pair)
    }

    /// Refresh after a 401 on a request sent with `stale`. A caller that gets
    /// the lock after someone else already rotated the token reuses theirs.
    async fn refresh_after_unauthorized(&self, stale: &AccessToken) -> Result<(), ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;
        match self.access_token() {
            Some(current) if current != *stale => {
                tracing::debug!("Access token already rotated by a concurrent request");
                Ok(())
            }
            Some(_) => self.rotate_locked().await.map(|_| ()),
            None => Err(ApiError::NoSession),
        }
    }

    fn expire(&self) {
        self.clear_credentials();
        tracing::info!("Session expired; credentials cleared");
        let _ = self.inner.events.send(CredentialEvent::Expired);
    }

    // ------------------------------------------------------------------
    // Request helpers
    // ------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .execute(Method::GET, path, Auth::Bearer, None, Payload::Empty)
            .await?;
        decode(path, response).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::GET, path, Auth::Bearer, Some(query), Payload::Empty)
            .await?;
        decode(path, response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::POST, path, Auth::Bearer, body).await
    }

    /// POST without a bearer token and without refresh-on-401 (login).
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::POST, path, Auth::Anonymous, body).await
    }

    /// POST with no body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .execute(Method::POST, path, Auth::Bearer, None, Payload::Empty)
            .await?;
        decode(path, response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::PUT, path, Auth::Bearer, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::PATCH, path, Auth::Bearer, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, Auth::Bearer, None, Payload::Empty)
            .await?;
        Ok(())
    }

    /// Multipart PATCH. The form is rebuilt if the request has to be retried.
    pub async fn patch_multipart<T, F>(&self, path: &str, form: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> Form + Send + Sync,
    {
        let response = self
            .execute(
                Method::PATCH,
                path,
                Auth::Bearer,
                None,
                Payload::Multipart(&form),
            )
            .await?;
        decode(path, response).await
    }

    async fn json_request<B, T>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        let response = self
            .execute(method, path, auth, None, Payload::Json(body))
            .await?;
        decode(path, response).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        query: Option<&[(&str, String)]>,
        payload: Payload<'_>,
    ) -> Result<Response, ApiError> {
        let sent_with = match auth {
            Auth::Bearer => self.access_token(),
            Auth::Anonymous => None,
        };
        let url = self.url(path, query)?;
        let response = self
            .dispatch(&method, &url, sent_with.as_ref(), &payload)
            .await?;

        let can_refresh = self
            .credentials()
            .is_some_and(|pair| !pair.refresh.is_empty());
        let Some(stale) = sent_with.filter(|_| {
            response.status() == StatusCode::UNAUTHORIZED && auth == Auth::Bearer && can_refresh
        }) else {
            return check_status(path, response).await;
        };

        tracing::debug!(path, "Got 401; refreshing access token");
        if let Err(err) = self.refresh_after_unauthorized(&stale).await {
            tracing::warn!(path, error = %err, "Token refresh failed");
            self.expire();
            return Err(ApiError::SessionExpired);
        }

        let retried = self
            .dispatch(&method, &url, self.access_token().as_ref(), &payload)
            .await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "Request rejected again after refresh");
            self.expire();
            return Err(ApiError::SessionExpired);
        }
        check_status(path, retried).await
    }

    /// One request with no refresh handling. Used by the refresh itself.
    async fn send_once(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        query: Option<&[(&str, String)]>,
        payload: &Payload<'_>,
    ) -> Result<Response, ApiError> {
        let token = match auth {
            Auth::Bearer => self.access_token(),
            Auth::Anonymous => None,
        };
        let url = self.url(path, query)?;
        let response = self.dispatch(&method, &url, token.as_ref(), payload).await?;
        check_status(path, response).await
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        token: Option<&AccessToken>,
        payload: &Payload<'_>,
    ) -> Result<Response, ApiError> {
        let mut builder = self.inner.http.request(method.clone(), url.clone());
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(body),
            Payload::Multipart(form) => builder.multipart(form()),
        };

        let response = builder.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(method = %method, url = %url, status = %response.status(), "API response");
        Ok(response)
    }

    fn url(&self, path: &str, query: Option<&[(&str, String)]>) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidPath {
                path: path.to_string(),
                source,
            })?;
        if let Some(query) = query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

async fn check_status(path: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_capped_error_body(response).await;
    tracing::debug!(path, status = %status, "API error response");
    Err(ApiError::Status { status, body })
}

/// Decode a JSON body. An empty body decodes as `null`, so `()` and `Option`
/// targets accept 204 responses.
async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
    let url = response.url().to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport { url, source })?;
    let slice: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(slice).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

pub async fn read_capped_error_body(response: Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
