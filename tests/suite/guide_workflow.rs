//! A guide signs in, works with their tours and availability, and signs out.

use chrono::NaiveDate;
use visitdesk_engine::{SessionEvent, SessionState};
use visitdesk_session::TokenStore;
use visitdesk_stores::Toggle;
use visitdesk_types::{Slot, TourId, Weekday};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    EMAIL, PASSWORD, app_with_file_tokens, file_tokens, mount_login, mount_profile,
};

#[tokio::test]
async fn guide_session_from_login_to_logout() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server, "access-1", "refresh-1").await;
    mount_profile(&server, "guide", Some(7)).await;

    Mock::given(method("GET"))
        .and(path("/api/tour/guide-tours/7/"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "date": "2025-03-03", "slot": "11.00 AM", "status": "ASSIGNED", "guides": [7]},
            {"id": 2, "date": "2025-03-04", "slot": "09.00 AM", "status": "ASSIGNED", "guides": [7]}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/guide/7/available_slots/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![0u8; 28]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/guide/7/add-availability/"))
        .and(body_json(serde_json::json!({"day": 1, "slot": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_with_file_tokens(&server, dir.path());
    let home = app.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(home, "/guide");
    assert!(file_tokens(dir.path()).load().unwrap().is_some());

    let tours = &mut app.stores_mut().tours;
    tours.fetch().await.unwrap();
    assert_eq!(tours.tours().len(), 2);
    let on_monday = tours.on_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    assert_eq!(on_monday.len(), 1);
    assert_eq!(on_monday[0].id, TourId::new(1));

    let availability = &mut app.stores_mut().availability;
    availability.fetch().await.unwrap();
    let slot = Slot::new(2).unwrap();
    let outcome = availability.toggle(Weekday::Tuesday, slot).await.unwrap();
    assert_eq!(outcome, Toggle::Added);
    assert!(availability.is_available(Weekday::Tuesday, slot));

    app.drain_events();
    app.logout().await;
    let events = app.drain_events();
    assert!(events.contains(&SessionEvent::StateChanged(SessionState::LoggedOut)));
    assert!(events.contains(&SessionEvent::Redirect("/login".to_string())));
    assert!(file_tokens(dir.path()).load().unwrap().is_none());
    assert!(!app.stores().tours.is_loaded());
}

#[tokio::test]
async fn stored_session_survives_a_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server, "access-1", "refresh-1").await;
    mount_profile(&server, "guide", Some(7)).await;

    let mut first = app_with_file_tokens(&server, dir.path());
    first.login(EMAIL, PASSWORD).await.unwrap();
    drop(first);

    let mut second = app_with_file_tokens(&server, dir.path());
    assert_eq!(second.initialize().await, SessionState::Authenticated);
    let profile = second.session().profile().unwrap();
    assert_eq!(profile.email, EMAIL);
    second.logout().await;
}
