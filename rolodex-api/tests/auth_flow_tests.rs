//! HTTP tests for sign-in, bearer authentication and public endpoints.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use rolodex_api::{ApiConfig, AuthUser, Session};
use rolodex_test_utils::{ActivityAction, ActivityLog};
use serde_json::json;

#[path = "support/app.rs"]
mod app_support;
use app_support::{TestApp, TestUser};

fn public_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn query_param(url: &reqwest::Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn session_for(email: &str) -> Session {
    Session {
        access_token: format!("access-{}", uuid::Uuid::new_v4()),
        refresh_token: Some("refresh".to_string()),
        expires_in: Some(3600),
        token_type: "bearer".to_string(),
        user: AuthUser {
            id: uuid::Uuid::now_v7(),
            email: Some(email.to_string()),
        },
    }
}

/// Run `/auth/login` and return the OAuth state carried in the callback URL.
async fn start_login(app: &TestApp, query: &str) -> String {
    let response = app.send(public_get(&format!("/auth/login{}", query))).await;
    assert_eq!(response.status, StatusCode::FOUND, "{:?}", response.body);
    let location = response
        .headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let authorize = reqwest::Url::parse(&location).expect("authorize URL parses");
    assert!(query_param(&authorize, "code_challenge").is_some());
    let callback = query_param(&authorize, "redirect_to").expect("redirect_to present");
    let callback = reqwest::Url::parse(&callback).expect("callback URL parses");
    assert_eq!(callback.path(), "/auth/callback");
    query_param(&callback, "state").expect("state present")
}

#[tokio::test]
async fn test_protected_routes_require_a_bearer_token() {
    let app = TestApp::new();

    let missing = app.send(public_get("/api/v1/contacts")).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let stranger = TestUser {
        id: uuid::Uuid::now_v7(),
        token: "never-issued".to_string(),
    };
    let rejected = app.get(&stranger, "/api/v1/contacts").await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.body["code"], "INVALID_TOKEN");
    assert_eq!(app.backend.call_count(), 0);
}

#[tokio::test]
async fn test_public_endpoints_need_no_token() {
    let app = TestApp::new();

    assert_eq!(app.send(public_get("/health/ping")).await.status, StatusCode::OK);
    assert_eq!(app.send(public_get("/health/live")).await.status, StatusCode::OK);
    assert_eq!(app.send(public_get("/health/ready")).await.status, StatusCode::OK);

    let spec = app.send(public_get("/openapi.json")).await;
    assert_eq!(spec.status, StatusCode::OK);
    assert_eq!(spec.body["info"]["title"], "Rolodex API");
}

#[tokio::test]
async fn test_readiness_reports_unhealthy_backend() {
    let app = TestApp::new();
    app.backend.set_healthy(false);

    let response = app.send(public_get("/health/ready")).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_pkce_sign_in_round_trip() {
    let app = TestApp::new();
    let oauth_state = start_login(&app, "?provider=github").await;

    let session = session_for("ada@example.com");
    app.auth.register_code("code-1", session.clone());

    let response = app
        .send(public_get(&format!(
            "/auth/callback?code=code-1&state={}",
            oauth_state
        )))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["access_token"], session.access_token.as_str());
    assert_eq!(app.state.sessions.pending_count(), 0);

    let user = TestUser {
        id: session.user.id,
        token: session.access_token.clone(),
    };
    let me = app.get(&user, "/api/v1/auth/session").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "ada@example.com");

    let signed_in: Vec<ActivityLog> = app.backend.records();
    assert_eq!(signed_in.len(), 1);
    assert_eq!(signed_in[0].action, ActivityAction::UserSignedIn);
    assert_eq!(signed_in[0].user_id, session.user.id);
}

#[tokio::test]
async fn test_state_is_single_use() {
    let app = TestApp::new();
    let oauth_state = start_login(&app, "").await;
    app.auth.register_code("code-1", session_for("ada@example.com"));
    app.auth.register_code("code-2", session_for("ada@example.com"));

    let uri = |code: &str| format!("/auth/callback?code={}&state={}", code, oauth_state);
    assert_eq!(app.send(public_get(&uri("code-1"))).await.status, StatusCode::OK);
    let replay = app.send(public_get(&uri("code-2"))).await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejects_unknown_state_and_provider_errors() {
    let app = TestApp::new();

    let unknown = app
        .send(public_get("/auth/callback?code=abc&state=forged"))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let denied = app
        .send(public_get(
            "/auth/callback?error=access_denied&error_description=User%20cancelled",
        ))
        .await;
    assert_eq!(denied.status, StatusCode::BAD_REQUEST);

    let missing = app.send(public_get("/auth/callback?state=abc")).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_callback_redirects_with_tokens_in_fragment() {
    let app = TestApp::with_config(ApiConfig {
        cors_origins: vec!["https://app.example.com".to_string()],
        ..ApiConfig::default()
    });
    let oauth_state = start_login(
        &app,
        "?redirect_to=https%3A%2F%2Fapp.example.com%2Fwelcome",
    )
    .await;
    let session = session_for("ada@example.com");
    app.auth.register_code("code-1", session.clone());

    let response = app
        .send(public_get(&format!(
            "/auth/callback?code=code-1&state={}",
            oauth_state
        )))
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    let location = response
        .headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("https://app.example.com/welcome#"));
    assert!(location.contains(&format!("access_token={}", session.access_token)));
}

#[tokio::test]
async fn test_login_refuses_foreign_redirect_origin() {
    let app = TestApp::with_config(ApiConfig {
        cors_origins: vec!["https://app.example.com".to_string()],
        ..ApiConfig::default()
    });

    let response = app
        .send(public_get(
            "/auth/login?redirect_to=https%3A%2F%2Fevil.example.net%2F",
        ))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.state.sessions.pending_count(), 0);
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    assert_eq!(app.get(&user, "/api/v1/auth/session").await.status, StatusCode::OK);

    let response = app.post(&user, "/api/v1/auth/logout", json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.auth.is_revoked(&user.token));

    let after = app.get(&user, "/api/v1/auth/session").await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    let entries: Vec<ActivityLog> = app.backend.records();
    assert!(entries
        .iter()
        .any(|e| e.action == ActivityAction::UserSignedOut && e.user_id == user.id));
}

#[tokio::test]
async fn test_logout_publishes_signed_out_event() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let mut events = app.state.sessions.subscribe();

    app.post(&user, "/api/v1/auth/logout", json!({})).await;

    let event = events.try_recv().expect("an event was published");
    assert_eq!(event.user_id(), user.id);
}
