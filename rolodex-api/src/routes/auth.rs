//! Authentication Routes
//!
//! OAuth redirect flow with PKCE against the BaaS auth API:
//!
//! 1. `GET /auth/login` stores a fresh verifier under a random `state` and
//!    sends the browser to the provider with the S256 challenge.
//! 2. `GET /auth/callback` consumes the `state`, trades the code plus
//!    verifier for a session, and either redirects to the client with the
//!    tokens in the URL fragment or answers with the session as JSON.
//!
//! Session inspection, logout and the session change stream live under
//! `/api/v1/auth` and require a bearer token.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use rolodex_core::{ActivityAction, EntityType, UserId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::{
    auth::{AuthContext, AuthEvent, PkcePair, Session, SessionStore},
    config::ApiConfig,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services::ActivityLogger,
    state::AppState,
};

// ============================================================================
// REQUEST/RESPONSE TYPES
// ============================================================================

/// Query parameters for `GET /auth/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    /// OAuth provider; defaults to the configured one.
    pub provider: Option<String>,
    /// Client page to land on after sign-in. Its origin must be allowed.
    pub redirect_to: Option<String>,
}

/// Query parameters the provider sends back to `/auth/callback`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The caller as seen by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionInfo {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub email: Option<String>,
}

/// Callback answers with JSON for API clients and a redirect for browsers.
pub enum CallbackResponse {
    Json(Json<Session>),
    Redirect(String),
}

impl IntoResponse for CallbackResponse {
    fn into_response(self) -> Response {
        match self {
            CallbackResponse::Json(json) => json.into_response(),
            CallbackResponse::Redirect(url) => found(&url),
        }
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

// ============================================================================
// HELPERS
// ============================================================================

/// Accept `redirect_to` only if it parses and its origin is allowed.
fn checked_redirect(config: &ApiConfig, redirect_to: &str) -> ApiResult<String> {
    let url = reqwest::Url::parse(redirect_to)
        .map_err(|_| ApiError::invalid_format("redirect_to", "absolute URL"))?;
    let origin = url.origin().ascii_serialization();
    if !config.is_origin_allowed(&origin) {
        return Err(ApiError::forbidden(format!(
            "Redirect origin {} is not allowed",
            origin
        )));
    }
    Ok(url.to_string())
}

/// Our callback URL with the OAuth `state` appended.
fn callback_url(config: &ApiConfig, state: &str) -> String {
    let separator = if config.oauth_redirect_url.contains('?') {
        '&'
    } else {
        '?'
    };
    format!(
        "{}{}state={}",
        config.oauth_redirect_url,
        separator,
        urlencoding::encode(state)
    )
}

/// Client URL carrying the session in the fragment, out of server logs.
fn fragment_redirect(base: &str, session: &Session) -> String {
    let base = base.split('#').next().unwrap_or(base);
    let mut fragment = format!(
        "access_token={}&token_type={}",
        urlencoding::encode(&session.access_token),
        urlencoding::encode(&session.token_type)
    );
    if let Some(refresh_token) = &session.refresh_token {
        fragment.push_str(&format!(
            "&refresh_token={}",
            urlencoding::encode(refresh_token)
        ));
    }
    if let Some(expires_in) = session.expires_in {
        fragment.push_str(&format!("&expires_in={}", expires_in));
    }
    format!("{}#{}", base, fragment)
}

// ============================================================================
// PUBLIC HANDLERS
// ============================================================================

/// GET /auth/login - Start the OAuth sign-in
#[utoipa::path(
    get,
    path = "/auth/login",
    tag = "Auth",
    params(
        ("provider" = Option<String>, Query, description = "OAuth provider, e.g. github"),
        ("redirect_to" = Option<String>, Query, description = "Client page to return to after sign-in"),
    ),
    responses(
        (status = 302, description = "Redirect to the provider"),
        (status = 400, description = "Malformed redirect_to", body = ApiError),
        (status = 403, description = "redirect_to origin not allowed", body = ApiError),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> ApiResult<Response> {
    let redirect_to = params
        .redirect_to
        .as_deref()
        .map(|url| checked_redirect(&state.config, url))
        .transpose()?;

    let pkce = PkcePair::generate();
    let oauth_state = state
        .sessions
        .begin_login(pkce.verifier.clone(), redirect_to);

    let provider = params
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(&state.config.oauth_provider);

    let url = state.auth_provider.authorize_url(
        provider,
        &callback_url(&state.config, &oauth_state),
        &pkce.challenge,
    );

    tracing::debug!(%provider, "Starting OAuth sign-in");
    Ok(found(&url))
}

/// GET /auth/callback - Finish the OAuth sign-in
#[utoipa::path(
    get,
    path = "/auth/callback",
    tag = "Auth",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "State issued by /auth/login"),
    ),
    responses(
        (status = 200, description = "Session for API clients", body = Session),
        (status = 302, description = "Redirect to the client with tokens in the fragment"),
        (status = 400, description = "Unknown state, provider error or failed exchange", body = ApiError),
    ),
)]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<CallbackResponse> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        tracing::warn!(%error, %description, "OAuth provider returned an error");
        return Err(ApiError::invalid_input(format!(
            "Sign-in failed: {} {}",
            error, description
        )));
    }

    let oauth_state = params.state.ok_or_else(|| ApiError::missing_field("state"))?;
    let code = params.code.ok_or_else(|| ApiError::missing_field("code"))?;

    let pending = state.sessions.take_login(&oauth_state)?;
    let session = state
        .auth_provider
        .exchange_code(&code, &pending.code_verifier)
        .await?;

    state
        .sessions
        .cache_user(&session.access_token, session.user.clone());
    state.sessions.publish(AuthEvent::SignedIn {
        user_id: session.user.id,
        email: session.user.email.clone(),
    });

    let auth = AuthContext::new(&session.user, session.access_token.clone());
    let backend = state.backend_for(&auth);
    ActivityLogger::new(backend.as_ref())
        .log(
            &auth,
            ActivityAction::UserSignedIn,
            EntityType::User,
            None,
            json!({ "email": auth.email }),
        )
        .await;

    tracing::info!(user_id = %auth.user_id, "User signed in");

    match pending.redirect_to.or_else(|| state.config.client_redirect_url.clone()) {
        Some(target) => Ok(CallbackResponse::Redirect(fragment_redirect(
            &target, &session,
        ))),
        None => Ok(CallbackResponse::Json(Json(session))),
    }
}

// ============================================================================
// AUTHENTICATED HANDLERS
// ============================================================================

/// GET /api/v1/auth/session - Who am I
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = SessionInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn session(AuthExtractor(auth): AuthExtractor) -> Json<SessionInfo> {
    Json(SessionInfo {
        user_id: auth.user_id,
        email: auth.email,
    })
}

/// POST /api/v1/auth/logout - Revoke the session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<StatusCode> {
    // Logged while the token is still valid for the backend.
    let backend = state.backend_for(&auth);
    ActivityLogger::new(backend.as_ref())
        .log(
            &auth,
            ActivityAction::UserSignedOut,
            EntityType::User,
            None,
            json!({}),
        )
        .await;

    state.sessions.forget(&auth.access_token);
    state.auth_provider.sign_out(&auth.access_token).await?;
    state.sessions.publish(AuthEvent::SignedOut {
        user_id: auth.user_id,
    });

    tracing::info!(user_id = %auth.user_id, "User signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/events - Server-sent session changes for the caller
#[utoipa::path(
    get,
    path = "/api/v1/auth/events",
    tag = "Auth",
    responses(
        (status = 200, description = "text/event-stream of AuthEvent", body = AuthEvent),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn events(
    State(sessions): State<Arc<SessionStore>>,
    AuthExtractor(auth): AuthExtractor,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = auth.user_id;
    let stream = BroadcastStream::new(sessions.subscribe()).filter_map(move |message| async move {
        match message {
            Ok(event) if event.user_id() == user_id => {
                match Event::default().event("auth").json_data(&event) {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode auth event");
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(%user_id, skipped, "Auth event subscriber lagged");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ============================================================================
// ROUTERS
// ============================================================================

/// `/auth/*`, no bearer token required.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
}

/// `/api/v1/auth/*`, behind the auth middleware.
pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/session", get(session))
        .route("/logout", post(logout))
        .route("/events", get(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;

    fn config_with_origins(origins: &[&str]) -> ApiConfig {
        ApiConfig {
            cors_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_checked_redirect_enforces_origin() {
        let config = config_with_origins(&["https://app.example.com"]);
        assert!(checked_redirect(&config, "https://app.example.com/contacts").is_ok());
        assert_eq!(
            checked_redirect(&config, "https://evil.example.net/")
                .unwrap_err()
                .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            checked_redirect(&config, "not a url").unwrap_err().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_callback_url_appends_state() {
        let mut config = ApiConfig::default();
        config.oauth_redirect_url = "http://localhost:3000/auth/callback".to_string();
        assert_eq!(
            callback_url(&config, "abc"),
            "http://localhost:3000/auth/callback?state=abc"
        );
        config.oauth_redirect_url = "http://localhost:3000/auth/callback?x=1".to_string();
        assert!(callback_url(&config, "abc").ends_with("?x=1&state=abc"));
    }

    #[test]
    fn test_fragment_redirect_carries_tokens() {
        let session = Session {
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            expires_in: Some(3600),
            token_type: "bearer".to_string(),
            user: AuthUser {
                id: uuid::Uuid::nil(),
                email: None,
            },
        };
        let url = fragment_redirect("https://app.example.com/done#old", &session);
        assert_eq!(
            url,
            "https://app.example.com/done#access_token=at&token_type=bearer&refresh_token=rt&expires_in=3600"
        );
    }
}
