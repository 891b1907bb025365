//! Axum Middleware for Authentication
//!
//! This module provides Axum middleware that:
//! - Reads `Authorization: Bearer <access token>`
//! - Resolves the token to a user through the [`AuthProvider`], with a
//!   short-lived cache in the [`SessionStore`]
//! - Injects [`AuthContext`] into request extensions
//! - Returns 401 for missing or rejected tokens

use crate::auth::{AuthContext, AuthProvider, SessionStore};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rolodex_core::AuthError;
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub provider: Arc<dyn AuthProvider>,
    pub sessions: Arc<SessionStore>,
}

impl AuthMiddlewareState {
    pub fn new(provider: Arc<dyn AuthProvider>, sessions: Arc<SessionStore>) -> Self {
        Self { provider, sessions }
    }

    /// Resolve a bearer token, consulting the cache first.
    pub async fn resolve(&self, access_token: &str) -> ApiResult<AuthContext> {
        if let Some(user) = self.sessions.cached_user(access_token) {
            return Ok(AuthContext::new(&user, access_token));
        }
        let user = self.provider.get_user(access_token).await?;
        self.sessions.cache_user(access_token, user.clone());
        Ok(AuthContext::new(&user, access_token))
    }
}

/// Extract the bearer token from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidToken {
            reason: "Authorization header must use Bearer scheme".to_string(),
        })?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware for authentication.
///
/// ```ignore
/// use axum::{Router, middleware};
///
/// let app = Router::new()
///     .route("/api/v1/contacts", axum::routing::get(list_contacts))
///     .layer(middleware::from_fn_with_state(auth_state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let token = bearer_token(request.headers())
        .map_err(|e| AuthMiddlewareError(e.into()))?
        .to_string();

    let auth_context = state.resolve(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AuthMiddlewareError(e)
    })?;

    request.extensions_mut().insert(auth_context);
    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for authentication context.
///
/// The `auth_middleware` must be applied to the route or router for this
/// extractor to work. If the middleware is not present, the extractor
/// returns a 500 Internal Server Error.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Extract AuthContext from request extensions.
pub fn extract_auth_context(request: &Request) -> ApiResult<&AuthContext> {
    request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Auth context missing from request"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
        assert_eq!(
            bearer_token(&HeaderMap::new()).unwrap_err(),
            AuthError::MissingCredentials
        );
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err(),
            AuthError::InvalidToken { .. }
        ));
        assert_eq!(
            bearer_token(&headers("Bearer ")).unwrap_err(),
            AuthError::MissingCredentials
        );
    }
}
