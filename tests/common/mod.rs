//! Shared fixtures: a mock backend and apps wired against it.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use visitdesk_engine::{App, Settings};
use visitdesk_session::{FileTokenStore, MemoryTokenStore, TokenStore};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMAIL: &str = "guide@uni.edu";
pub const PASSWORD: &str = "secret";

/// Settings pointed at `server`, with tokens kept under `dir`.
pub fn settings(server: &MockServer, dir: &Path) -> Settings {
    let mut settings = Settings::for_base_url(&server.uri()).unwrap();
    settings.token_path = dir.join("session.json");
    settings
}

pub fn app_with_file_tokens(server: &MockServer, dir: &Path) -> App {
    App::new(settings(server, dir)).unwrap()
}

pub fn app_in_memory(server: &MockServer) -> (App, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let settings = Settings::for_base_url(&server.uri()).unwrap();
    let app = App::with_token_store(settings, Arc::clone(&store) as Arc<dyn TokenStore>).unwrap();
    (app, store)
}

/// `auth/login/` accepting [`EMAIL`]/[`PASSWORD`] with the given tokens.
pub async fn mount_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(body_json(
            serde_json::json!({"email": EMAIL, "password": PASSWORD}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access": access, "refresh": refresh})),
        )
        .mount(server)
        .await;
}

/// `auth/me/` for user 3 with the given role and profile row.
pub async fn mount_profile(server: &MockServer, role: &str, profile_id: Option<u64>) {
    Mock::given(method("GET"))
        .and(path("/auth/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 3,
            "email": EMAIL,
            "name": "Gül Guide",
            "role": role,
            "profile_id": profile_id,
        })))
        .mount(server)
        .await;
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

pub fn file_tokens(dir: &Path) -> FileTokenStore {
    FileTokenStore::new(dir.join("session.json"))
}
