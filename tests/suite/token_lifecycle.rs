//! Access token expiry during normal use.

use visitdesk_engine::{NotificationLevel, SessionEvent, SessionState};
use visitdesk_session::TokenStore;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{EMAIL, PASSWORD, app_in_memory, eventually, mount_login, mount_profile};

async fn mount_coordinator_tours(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tour/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tour/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 5, "date": "2025-03-05", "slot": "01.30 PM", "status": "UNASSIGNED"}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    mount_login(&server, "stale", "refresh-1").await;
    mount_profile(&server, "coordinator", None).await;
    mount_coordinator_tours(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .and(body_json(serde_json::json!({"refresh": "refresh-1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "fresh"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, store) = app_in_memory(&server);
    app.login(EMAIL, PASSWORD).await.unwrap();

    let tours = &mut app.stores_mut().tours;
    tours.fetch().await.unwrap();
    assert_eq!(tours.tours().len(), 1);

    assert!(
        eventually(|| {
            store
                .load()
                .unwrap()
                .is_some_and(|pair| pair.access.as_str() == "fresh")
        })
        .await
    );
    let pair = store.load().unwrap().unwrap();
    assert_eq!(pair.refresh.as_str(), "refresh-1");
    assert_eq!(app.session().state(), SessionState::Authenticated);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session_with_a_warning() {
    let server = MockServer::start().await;
    mount_login(&server, "stale", "refresh-1").await;
    mount_profile(&server, "coordinator", None).await;
    mount_coordinator_tours(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"detail": "Token is invalid or expired"})),
        )
        .mount(&server)
        .await;

    let (mut app, store) = app_in_memory(&server);
    app.login(EMAIL, PASSWORD).await.unwrap();
    app.drain_events();

    assert!(app.stores_mut().tours.fetch().await.is_err());

    let redirect = SessionEvent::Redirect("/login".to_string());
    let mut events = Vec::new();
    assert!(
        eventually(|| {
            events.extend(app.drain_events());
            events.contains(&redirect)
        })
        .await
    );
    assert_eq!(app.session().state(), SessionState::LoggedOut);
    assert!(store.load().unwrap().is_none());
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Notification {
            level: NotificationLevel::Warning,
            ..
        }
    )));
}
