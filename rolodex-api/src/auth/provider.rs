//! Auth provider seam.

use super::pkce::challenge_for;
use super::{AuthUser, Session};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use reqwest::{header, Client, StatusCode};
use rolodex_core::{AuthError, BackendConfig};

/// OAuth sign-in and token introspection.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// URL the browser is sent to for sign-in with `provider`.
    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String;

    /// Trade an authorization code and its PKCE verifier for a session.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, AuthError>;

    /// Resolve an access token to its user.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

// ============================================================================
// GOTRUE
// ============================================================================

/// Auth API client for the BaaS (`/auth/v1`).
#[derive(Clone)]
pub struct GoTrueAuthProvider {
    client: Client,
    config: BackendConfig,
}

impl GoTrueAuthProvider {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    fn unavailable(err: reqwest::Error) -> AuthError {
        AuthError::ProviderUnavailable {
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuthProvider {
    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.config.endpoint("auth/v1/authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.config.endpoint("auth/v1/token"))
            .query(&[("grant_type", "pkce")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "auth_code": code,
                "code_verifier": code_verifier,
            }))
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed {
                reason: format!("{}: {}", status, body),
            });
        }
        response
            .json::<Session>()
            .await
            .map_err(|e| AuthError::ExchangeFailed {
                reason: e.to_string(),
            })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(self.config.endpoint("auth/v1/user"))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(Self::unavailable)?;

        match response.status() {
            s if s.is_success() => {
                response
                    .json::<AuthUser>()
                    .await
                    .map_err(|e| AuthError::InvalidToken {
                        reason: e.to_string(),
                    })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidToken {
                reason: "token rejected by auth provider".to_string(),
            }),
            s => Err(AuthError::ProviderUnavailable {
                reason: format!("auth provider answered {}", s),
            }),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.config.endpoint("auth/v1/logout"))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(Self::unavailable)?;

        // An already-expired token has nothing left to revoke.
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Ok(()),
            s => Err(AuthError::ProviderUnavailable {
                reason: format!("logout answered {}", s),
            }),
        }
    }
}

// ============================================================================
// MOCK
// ============================================================================

/// In-memory auth provider for tests.
///
/// Only challenges handed out by `authorize_url` are accepted at exchange
/// time, so a test that passes proves the verifier made the round trip.
#[derive(Debug, Default)]
pub struct MockAuthProvider {
    tokens: DashMap<String, AuthUser>,
    codes: DashMap<String, Session>,
    challenges: DashSet<String>,
    revoked: DashSet<String>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `access_token` as belonging to `user`.
    pub fn add_user(&self, access_token: impl Into<String>, user: AuthUser) {
        self.tokens.insert(access_token.into(), user);
    }

    /// Make `code` exchangeable for `session`.
    pub fn register_code(&self, code: impl Into<String>, session: Session) {
        self.add_user(session.access_token.clone(), session.user.clone());
        self.codes.insert(code.into(), session);
    }

    pub fn is_revoked(&self, access_token: &str) -> bool {
        self.revoked.contains(access_token)
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        self.challenges.insert(code_challenge.to_string());
        format!(
            "https://auth.mock/authorize?provider={}&redirect_to={}&code_challenge={}",
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, AuthError> {
        if self.challenges.remove(&challenge_for(code_verifier)).is_none() {
            return Err(AuthError::ExchangeFailed {
                reason: "code verifier does not match any issued challenge".to_string(),
            });
        }
        self.codes
            .remove(code)
            .map(|(_, session)| session)
            .ok_or_else(|| AuthError::ExchangeFailed {
                reason: "unknown authorization code".to_string(),
            })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        self.tokens
            .get(access_token)
            .map(|u| u.clone())
            .ok_or_else(|| AuthError::InvalidToken {
                reason: "unknown token".to_string(),
            })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens.remove(access_token);
        self.revoked.insert(access_token.to_string());
        Ok(())
    }
}
