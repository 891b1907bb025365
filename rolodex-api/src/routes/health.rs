//! Health checks for load balancers and orchestrators.
//!
//! `/health/ping` and `/health/live` answer from the process alone;
//! `/health/ready` also asks the BaaS whether it is reachable. None of them
//! require a bearer token.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use rolodex_storage::Backend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    fn http_status(self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Readiness breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    /// Relational API of the BaaS.
    pub backend: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Outcome of probing one dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    /// Time one backend health call.
    async fn check(backend: &dyn Backend) -> Self {
        let started = Instant::now();
        let failure = match backend.health_check().await {
            Ok(true) => None,
            Ok(false) => Some("Backend reported unhealthy".to_string()),
            Err(e) => Some(format!("Backend check failed: {}", e)),
        };
        match failure {
            None => Self {
                status: HealthStatus::Healthy,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Some(error) => {
                tracing::warn!(%error, "Readiness check failed");
                Self {
                    status: HealthStatus::Unhealthy,
                    latency_ms: None,
                    error: Some(error),
                }
            }
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses((status = 200, description = "Plain-text pong", body = String)),
)]
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health/live - The process is up; dependencies are not consulted.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is alive", body = HealthResponse)),
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Rolodex API is running".to_string()),
        details: None,
    })
}

/// GET /health/ready - 503 while the backend cannot be reached.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Backend reachable", body = HealthResponse),
        (status = 503, description = "Backend unreachable", body = HealthResponse),
    ),
)]
pub async fn readiness(
    State(backend): State<Arc<dyn Backend>>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let backend = ComponentHealth::check(backend.as_ref()).await;
    let status = backend.status;
    let body = HealthResponse {
        status,
        message: None,
        details: Some(HealthDetails {
            backend,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };
    (status.http_status(), Json(body))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_storage::MockBackend;

    #[tokio::test]
    async fn test_check_follows_backend_health() {
        let backend = MockBackend::new();
        let healthy = ComponentHealth::check(&backend).await;
        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert!(healthy.latency_ms.is_some());

        backend.set_healthy(false);
        let unhealthy = ComponentHealth::check(&backend).await;
        assert_eq!(unhealthy.status, HealthStatus::Unhealthy);
        assert!(unhealthy.error.unwrap_or_default().contains("unhealthy"));
    }

    #[test]
    fn test_unhealthy_maps_to_503() {
        assert_eq!(HealthStatus::Healthy.http_status(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_component_error_is_serialized_without_latency() -> Result<(), serde_json::Error> {
        let component = ComponentHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some("Backend check failed: connection refused".to_string()),
        };
        let json = serde_json::to_value(&component)?;
        assert_eq!(json["status"], "unhealthy");
        assert!(json.get("latency_ms").is_none());
        Ok(())
    }
}
