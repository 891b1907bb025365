//! REST API Routes Module
//!
//! Route handlers organized by entity type, plus the router builder that
//! wires them together behind auth, request logging and CORS.
//!
//! - `/api/v1/*`: contacts, companies, groups, tags, notes, tasks,
//!   activity, dashboard, demo data and session management (bearer token)
//! - `/auth/*`: OAuth login and callback (public)
//! - `/health/*`: liveness and readiness checks (public)
//! - `/openapi.json` and, with the `swagger-ui` feature, `/swagger-ui`

pub mod activity;
pub mod auth;
pub mod contact;
pub mod directory;
pub mod health;
pub mod note;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth_middleware;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::observability_middleware;

/// Multipart framing allowance on top of an uploaded image.
pub(crate) const MULTIPART_OVERHEAD: usize = 64 * 1024;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Check if running in a production environment.
fn is_production_environment() -> bool {
    std::env::var("ROLODEX_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set ROLODEX_CORS_ORIGINS.",
        ));
    }
    if !config.oauth_redirect_url.starts_with("https://") {
        return Err(ApiError::invalid_input(
            "OAuth redirect URL must use https in production. Set ROLODEX_OAUTH_REDIRECT_URL.",
        ));
    }
    Ok(())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any).expose_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter(|o| !o.starts_with("*."))
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Routes under `/api/v1`, all behind the auth middleware.
fn build_api_routes(state: &AppState) -> Router<AppState> {
    let max_upload_bytes = state.config.max_upload_bytes;
    Router::new()
        .nest("/auth", auth::session_router())
        .nest("/contacts", contact::create_router(max_upload_bytes))
        .nest("/companies", directory::company_router(max_upload_bytes))
        .nest("/groups", directory::group_router())
        .nest("/tags", directory::tag_router())
        .nest("/notes", note::note_router())
        .nest("/tasks", note::task_router())
        .nest("/activity", activity::activity_router())
        .nest("/dashboard", activity::dashboard_router())
        .nest("/demo", activity::demo_router())
        .route_layer(from_fn_with_state(
            state.auth_middleware_state(),
            auth_middleware,
        ))
}

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS (outermost) - handles preflight requests
/// 2. Observability - request span and outcome log
/// 3. Auth (only on /api/v1/*) - resolves the bearer token
///
/// In production (`ROLODEX_ENVIRONMENT=production`) the configuration is
/// validated first and an error is returned if CORS or the OAuth redirect
/// are not locked down.
pub fn create_api_router(state: AppState) -> ApiResult<Router> {
    if is_production_environment() {
        validate_api_config_for_production(&state.config)?;
    }

    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api/v1", build_api_routes(&state))
        .nest("/auth", auth::public_router())
        .nest("/health", health::create_router())
        .route("/openapi.json", get(openapi_json));

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
    }

    let cors = build_cors_layer(&state.config);

    Ok(router
        .layer(from_fn(observability_middleware))
        .layer(cors)
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_validation_requires_origins_and_https() {
        let config = ApiConfig::default();
        assert!(validate_api_config_for_production(&config).is_err());

        let config = ApiConfig {
            cors_origins: vec!["https://app.example.com".to_string()],
            ..ApiConfig::default()
        };
        assert!(validate_api_config_for_production(&config).is_err());

        let config = ApiConfig {
            cors_origins: vec!["https://app.example.com".to_string()],
            oauth_redirect_url: "https://api.example.com/auth/callback".to_string(),
            ..ApiConfig::default()
        };
        assert!(validate_api_config_for_production(&config).is_ok());
    }

    #[test]
    fn test_cors_layer_builds_in_both_modes() {
        let _dev = build_cors_layer(&ApiConfig::default());
        let _prod = build_cors_layer(&ApiConfig {
            cors_origins: vec!["https://app.example.com".to_string(), "*.example.com".to_string()],
            cors_allow_credentials: true,
            ..ApiConfig::default()
        });
    }
}
