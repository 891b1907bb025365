//! API Configuration Module
//!
//! CORS, OAuth redirect and upload settings for the HTTP service. Loaded from
//! environment variables with defaults suitable for local development. The
//! BaaS connection itself is configured by `rolodex_core::BackendConfig`.

/// Default upload limit for avatars and logos (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // OAuth Configuration
    // ========================================================================
    /// Default OAuth provider passed to the auth API (e.g. "github", "google").
    pub oauth_provider: String,

    /// Absolute URL of this service's `/auth/callback`.
    pub oauth_redirect_url: String,

    /// Where the browser lands after a successful callback. When unset the
    /// callback answers with the session as JSON.
    pub client_redirect_url: Option<String>,

    // ========================================================================
    // Uploads
    // ========================================================================
    /// Maximum accepted size of an uploaded image in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            oauth_provider: "github".to_string(),
            oauth_redirect_url: "http://localhost:3000/auth/callback".to_string(),
            client_redirect_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ROLODEX_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `ROLODEX_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `ROLODEX_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `ROLODEX_OAUTH_PROVIDER`: OAuth provider name (default: github)
    /// - `ROLODEX_OAUTH_REDIRECT_URL`: Callback URL registered with the provider
    /// - `ROLODEX_CLIENT_REDIRECT_URL`: Client page to send the browser to after sign-in
    /// - `ROLODEX_MAX_UPLOAD_BYTES`: Upload size limit (default: 5 MiB)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("ROLODEX_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("ROLODEX_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.cors_allow_credentials);

        let cors_max_age_secs = lookup("ROLODEX_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let oauth_provider = lookup("ROLODEX_OAUTH_PROVIDER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.oauth_provider);

        let oauth_redirect_url = lookup("ROLODEX_OAUTH_REDIRECT_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.oauth_redirect_url);

        let client_redirect_url =
            lookup("ROLODEX_CLIENT_REDIRECT_URL").filter(|s| !s.trim().is_empty());

        let max_upload_bytes = lookup("ROLODEX_MAX_UPLOAD_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            oauth_provider,
            oauth_redirect_url,
            client_redirect_url,
            max_upload_bytes,
        }
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::from_lookup(lookup_from(&[]));
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.oauth_provider, "github");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.client_redirect_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("ROLODEX_CORS_ORIGINS", "https://app.example.com, https://admin.example.com"),
            ("ROLODEX_OAUTH_PROVIDER", "google"),
            ("ROLODEX_CLIENT_REDIRECT_URL", "https://app.example.com/"),
            ("ROLODEX_MAX_UPLOAD_BYTES", "1024"),
        ]));
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.oauth_provider, "google");
        assert_eq!(
            config.client_redirect_url.as_deref(),
            Some("https://app.example.com/")
        );
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config =
            ApiConfig::from_lookup(lookup_from(&[("ROLODEX_MAX_UPLOAD_BYTES", "lots")]));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_any_origin_allowed_without_list() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:5173"));
    }

    #[test]
    fn test_origin_must_be_listed() {
        let config = ApiConfig {
            cors_origins: vec!["https://app.example.com".to_string()],
            ..ApiConfig::default()
        };
        assert!(config.is_origin_allowed("https://app.example.com"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }

    #[test]
    fn test_wildcard_subdomain() {
        let config = ApiConfig {
            cors_origins: vec!["*.example.com".to_string()],
            ..ApiConfig::default()
        };
        assert!(config.is_origin_allowed("https://app.example.com"));
        assert!(!config.is_origin_allowed("https://notexample.com"));
    }
}
