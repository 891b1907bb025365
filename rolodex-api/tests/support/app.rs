#![allow(dead_code)]
//! In-process application harness for HTTP tests.
//!
//! Builds the real router over the in-memory backend, object store and
//! auth provider, and drives it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rolodex_api::{create_api_router, ApiConfig, AppState, AuthUser, MockAuthProvider};
use rolodex_test_utils::{MockBackend, MockObjectStore, UserId};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// A signed-in test user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: MockBackend,
    pub objects: MockObjectStore,
    pub auth: Arc<MockAuthProvider>,
}

/// Status and decoded body of one response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ApiConfig::default())
    }

    pub fn with_config(config: ApiConfig) -> Self {
        let backend = MockBackend::new();
        let objects = MockObjectStore::default();
        let auth = Arc::new(MockAuthProvider::new());
        let state = AppState::new(
            Arc::new(backend.clone()),
            Arc::new(objects.clone()),
            auth.clone(),
            config,
        );
        let router = create_api_router(state.clone()).expect("router should build");
        Self {
            router,
            state,
            backend,
            objects,
            auth,
        }
    }

    /// Register a fresh user with its own bearer token.
    pub fn sign_in(&self, email: &str) -> TestUser {
        let id = Uuid::now_v7();
        let token = format!("token-{}", Uuid::new_v4());
        self.auth.add_user(
            token.clone(),
            AuthUser {
                id,
                email: Some(email.to_string()),
            },
        );
        TestUser { id, token }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, user: &TestUser, uri: &str) -> TestResponse {
        self.send(authed(Method::GET, uri, user).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, user: &TestUser, uri: &str) -> TestResponse {
        self.send(authed(Method::DELETE, uri, user).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, user: &TestUser, uri: &str, body: Value) -> TestResponse {
        self.send(json_request(Method::POST, uri, user, body)).await
    }

    pub async fn patch(&self, user: &TestUser, uri: &str, body: Value) -> TestResponse {
        self.send(json_request(Method::PATCH, uri, user, body)).await
    }

    pub async fn put(&self, user: &TestUser, uri: &str, body: Value) -> TestResponse {
        self.send(json_request(Method::PUT, uri, user, body)).await
    }

    /// Upload `bytes` as the `file` part of a multipart form.
    pub async fn upload(
        &self,
        user: &TestUser,
        uri: &str,
        bytes: &[u8],
        content_type: &str,
        file_name: &str,
    ) -> TestResponse {
        let (multipart_type, body) = multipart_file(bytes, content_type, file_name);
        let request = authed(Method::POST, uri, user)
            .header(header::CONTENT_TYPE, multipart_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Create a contact through the API and return its id.
    pub async fn create_contact(&self, user: &TestUser, first_name: &str, surname: &str) -> Uuid {
        let response = self
            .post(
                user,
                "/api/v1/contacts",
                serde_json::json!({
                    "first_name": first_name,
                    "surname": surname,
                    "email": format!("{}.{}@example.com", first_name.to_lowercase(), surname.to_lowercase()),
                    "gender": "female",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id_at(&response.body, "/contact/id")
    }

    /// Create a company, group or tag through the API and return its id.
    pub async fn create_entity(&self, user: &TestUser, collection: &str, body: Value) -> Uuid {
        let response = self
            .post(user, &format!("/api/v1/{}", collection), body)
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id_at(&response.body, "/id")
    }
}

fn authed(method: Method, uri: &str, user: &TestUser) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", user.token))
}

fn json_request(method: Method, uri: &str, user: &TestUser, body: Value) -> Request<Body> {
    authed(method, uri, user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a uuid at a JSON pointer.
pub fn id_at(body: &Value, pointer: &str) -> Uuid {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no uuid at {} in {}", pointer, body))
}

/// Failing field names from a validation error body.
pub fn failed_fields(body: &Value) -> Vec<String> {
    body.pointer("/details/fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn multipart_file(bytes: &[u8], content_type: &str, file_name: &str) -> (String, Vec<u8>) {
    let boundary = "rolodex-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            boundary, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
