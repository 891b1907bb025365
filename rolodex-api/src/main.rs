//! Rolodex API Server Entry Point
//!
//! Loads configuration, wires the BaaS clients into the application state,
//! and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use rolodex_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, GoTrueAuthProvider};
use rolodex_core::BackendConfig;
use rolodex_storage::{RestBackend, RestObjectStore};

use rolodex_api::telemetry::{init_tracing, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    // Missing or malformed BaaS settings are fatal.
    let backend_config = BackendConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "Backend configuration invalid");
        ApiError::from(e)
    })?;

    let http = reqwest::Client::new();
    let backend = Arc::new(RestBackend::with_client(http.clone(), backend_config.clone()));
    let objects = Arc::new(RestObjectStore::with_client(http.clone(), backend_config.clone()));
    let auth_provider = Arc::new(GoTrueAuthProvider::with_client(http, backend_config));

    let api_config = ApiConfig::from_env();
    let state = AppState::new(backend, objects, auth_provider, api_config);

    let app: Router = create_api_router(state)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Rolodex API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("ROLODEX_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("ROLODEX_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str.parse::<u16>().map_err(|_| {
        ApiError::invalid_input(format!("Invalid port value: {}", port_str))
    })?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>().map_err(|e| {
        ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
    })
}
