use std::sync::Arc;

use visitdesk_client::ApiClient;
use visitdesk_config::Settings;
use visitdesk_session::{MemoryTokenStore, Session, SessionState};
use visitdesk_types::{AccessToken, RefreshToken, Role, TokenPair};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A session restored against `server` as user 3 with the given role.
pub(crate) async fn signed_in(server: &MockServer, role: Role, profile_id: Option<u64>) -> Session {
    Mock::given(method("GET"))
        .and(path("/auth/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 3,
            "email": "user@uni.edu",
            "name": "Test User",
            "role": role.as_str(),
            "profile_id": profile_id,
        })))
        .mount(server)
        .await;

    let settings = Settings::for_base_url(&server.uri()).unwrap();
    let client = ApiClient::new(&settings).unwrap();
    let tokens = MemoryTokenStore::with_tokens(TokenPair {
        access: AccessToken::new("header.payload.signature"),
        refresh: RefreshToken::new("refresh"),
    });
    let session = Session::new(client, Arc::new(tokens), &settings);
    assert_eq!(session.initialize().await, SessionState::Authenticated);
    session
}
