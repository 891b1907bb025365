//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use rolodex_storage::{Backend, ObjectStore};

use crate::auth::{AuthContext, AuthProvider, SessionStore};
use crate::config::ApiConfig;
use crate::middleware::AuthMiddlewareState;
use crate::services::FavouriteTracker;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Relational API client authenticated with the anon key. Requests made
    /// on behalf of a user go through [`AppState::backend_for`].
    pub backend: Arc<dyn Backend>,
    pub objects: Arc<dyn ObjectStore>,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub sessions: Arc<SessionStore>,
    pub favourites: Arc<FavouriteTracker>,
    pub config: Arc<ApiConfig>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn Backend>,
        objects: Arc<dyn ObjectStore>,
        auth_provider: Arc<dyn AuthProvider>,
        config: ApiConfig,
    ) -> Self {
        Self {
            backend,
            objects,
            auth_provider,
            sessions: Arc::new(SessionStore::default()),
            favourites: Arc::new(FavouriteTracker::new()),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Backend handle that acts as the caller, so row-level security applies.
    pub fn backend_for(&self, auth: &AuthContext) -> Arc<dyn Backend> {
        self.backend.with_access_token(&auth.access_token)
    }

    pub fn objects_for(&self, auth: &AuthContext) -> Arc<dyn ObjectStore> {
        self.objects.with_access_token(&auth.access_token)
    }

    pub fn auth_middleware_state(&self) -> AuthMiddlewareState {
        AuthMiddlewareState::new(self.auth_provider.clone(), self.sessions.clone())
    }
}

crate::impl_from_ref!(Arc<dyn Backend>, backend);
crate::impl_from_ref!(Arc<SessionStore>, sessions);
crate::impl_from_ref!(Instant, start_time);
