use visitdesk_engine::Navigation;
use wiremock::MockServer;

use crate::common::{EMAIL, PASSWORD, app_in_memory, mount_login, mount_profile};

#[tokio::test]
async fn route_guard_follows_the_session() {
    let server = MockServer::start().await;
    mount_login(&server, "access", "refresh").await;
    mount_profile(&server, "coordinator", None).await;
    let (mut app, _) = app_in_memory(&server);

    assert_eq!(
        app.navigate("/coordinator").await,
        Navigation::Redirect("/login".to_string())
    );

    app.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(
        app.navigate("/coordinator?tab=tours").await,
        Navigation::Allow("/coordinator?tab=tours".to_string())
    );
    assert_eq!(
        app.navigate("/director").await,
        Navigation::Redirect("/403".to_string())
    );
    assert_eq!(
        app.navigate("/no-such-page").await,
        Navigation::Allow("/no-such-page".to_string())
    );

    app.logout().await;
    assert_eq!(
        app.navigate("/coordinator").await,
        Navigation::Redirect("/login".to_string())
    );
}
