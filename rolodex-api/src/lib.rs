//! Rolodex API - HTTP service for a personal contact manager
//!
//! Contacts, companies, groups, tags, notes, tasks and an activity feed,
//! stored in a hosted BaaS. This crate exposes them as a REST API (Axum),
//! handles OAuth sign-in against the BaaS auth API, and applies the
//! business rules the database does not enforce: one company per contact,
//! favourite toggling, activity logging and demo data.

#[macro_use]
mod macros;

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{
    AuthContext, AuthEvent, AuthProvider, AuthUser, GoTrueAuthProvider, MockAuthProvider, Session,
    SessionStore,
};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
