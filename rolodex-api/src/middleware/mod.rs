//! Middleware modules for the Rolodex API
//!
//! - `auth`: bearer-token authentication and the `AuthExtractor`
//!
//! Request logging lives in `telemetry::observability_middleware`.
//!
//! # Middleware Order
//!
//! ```ignore
//! Router::new()
//!     .nest("/api/v1", protected_routes)
//!     // Auth wraps only the protected routes
//!     .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
//!     // Observability is outermost so 401s are logged too
//!     .layer(middleware::from_fn(observability_middleware))
//! ```

mod auth;

pub use auth::{
    auth_middleware, bearer_token, extract_auth_context, AuthExtractor, AuthMiddlewareError,
    AuthMiddlewareState,
};
