//! HTTP clients for the hosted BaaS.
//!
//! `RestBackend` speaks the PostgREST dialect under `/rest/v1`, and
//! `RestObjectStore` the bucket API under `/storage/v1`.

use crate::backend::{Backend, ObjectStore};
use crate::query::{Filter, Query, Row};
use ::async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use rolodex_core::{BackendConfig, StorageError, StorageResult, Table};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Error body shape returned by the BaaS APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Transport {
        reason: err.to_string(),
    }
}

/// Turn a non-2xx response into `RequestFailed`.
async fn check(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    Err(StorageError::RequestFailed {
        status: status.as_u16(),
        message,
    })
}

async fn decode_rows(table: Table, response: Response) -> StorageResult<Vec<Row>> {
    response
        .json::<Vec<Row>>()
        .await
        .map_err(|e| StorageError::Decode {
            table,
            reason: e.to_string(),
        })
}

/// Parse the total from a `Content-Range: 0-9/42` header.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.parse().ok()
}

#[derive(Clone)]
struct Connection {
    client: Client,
    config: BackendConfig,
    access_token: Option<String>,
}

impl Connection {
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    fn scoped(&self, access_token: &str) -> Self {
        Self {
            access_token: Some(access_token.to_string()),
            ..self.clone()
        }
    }
}

/// PostgREST client.
#[derive(Clone)]
pub struct RestBackend {
    conn: Connection,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self {
            conn: Connection {
                client,
                config,
                access_token: None,
            },
        }
    }

    fn table_url(&self, table: Table) -> String {
        self.conn.config.endpoint(&format!("rest/v1/{}", table))
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, query: &Query) -> StorageResult<Vec<Row>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_query_pairs());
        debug!(table = %query.table, ?params, "select");

        let response = self
            .conn
            .request(Method::GET, &self.table_url(query.table))
            .query(&params)
            .send()
            .await
            .map_err(transport)?;
        decode_rows(query.table, check(response).await?).await
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> StorageResult<Vec<Row>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        debug!(%table, count = rows.len(), "insert");
        let response = self
            .conn
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(transport)?;
        decode_rows(table, check(response).await?).await
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StorageResult<Vec<Row>> {
        debug!(%table, "update");
        let response = self
            .conn
            .request(Method::PATCH, &self.table_url(table))
            .query(&filter.to_query_pairs())
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        decode_rows(table, check(response).await?).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StorageResult<u64> {
        debug!(%table, "delete");
        let response = self
            .conn
            .request(Method::DELETE, &self.table_url(table))
            .query(&filter.to_query_pairs())
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(transport)?;
        let deleted = decode_rows(table, check(response).await?).await?;
        Ok(deleted.len() as u64)
    }

    async fn count(&self, table: Table, filter: &Filter) -> StorageResult<u64> {
        let mut params = vec![("select".to_string(), "id".to_string())];
        params.extend(filter.to_query_pairs());
        let response = self
            .conn
            .request(Method::HEAD, &self.table_url(table))
            .query(&params)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(transport)?;
        let response = check(response).await?;
        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StorageError::Decode {
                table,
                reason: "missing or malformed Content-Range header".to_string(),
            })
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let url = self.conn.config.endpoint("rest/v1/");
        match self.conn.request(Method::GET, &url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!(error = %e, "backend health check failed");
                Ok(false)
            }
        }
    }

    fn with_access_token(&self, access_token: &str) -> Arc<dyn Backend> {
        Arc::new(Self {
            conn: self.conn.scoped(access_token),
        })
    }
}

/// Bucket API client.
#[derive(Clone)]
pub struct RestObjectStore {
    conn: Connection,
}

impl RestObjectStore {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self {
            conn: Connection {
                client,
                config,
                access_token: None,
            },
        }
    }
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let url = self
            .conn
            .config
            .endpoint(&format!("storage/v1/object/{}/{}", bucket, path));
        debug!(bucket, path, size = bytes.len(), "upload");
        let response = self
            .conn
            .request(Method::POST, &url)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                reason: e.to_string(),
            })?;
        check(response).await.map_err(|e| StorageError::Upload {
            bucket: bucket.to_string(),
            reason: e.to_string(),
        })?;
        Ok(path.to_string())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        let url = self
            .conn
            .config
            .endpoint(&format!("storage/v1/object/{}", bucket));
        let response = self
            .conn
            .request(Method::DELETE, &url)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.conn
            .config
            .endpoint(&format!("storage/v1/object/public/{}/{}", bucket, path))
    }

    fn with_access_token(&self, access_token: &str) -> Arc<dyn ObjectStore> {
        Arc::new(Self {
            conn: self.conn.scoped(access_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig::new("https://project.example.co", "anon").unwrap()
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
    }

    #[test]
    fn test_table_url() {
        let backend = RestBackend::new(config());
        assert_eq!(
            backend.table_url(Table::ContactTags),
            "https://project.example.co/rest/v1/contact_tags"
        );
    }

    #[test]
    fn test_public_url() {
        let store = RestObjectStore::new(config());
        assert_eq!(
            store.public_url("company-logos", "u/x.png"),
            "https://project.example.co/storage/v1/object/public/company-logos/u/x.png"
        );
    }

    #[test]
    fn test_scoped_connection_uses_user_token() {
        let backend = RestBackend::new(config());
        let scoped = backend.conn.scoped("user-token");
        let request = scoped
            .request(Method::GET, "https://project.example.co/rest/v1/tags")
            .build()
            .unwrap();
        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer user-token");
    }

    #[test]
    fn test_unscoped_connection_uses_anon_key() {
        let backend = RestBackend::new(config());
        let request = backend
            .conn
            .request(Method::GET, "https://project.example.co/rest/v1/tags")
            .build()
            .unwrap();
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer anon");
    }
}
