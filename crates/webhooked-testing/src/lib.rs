//! Test infrastructure for driving the HTTP API in-process.
//!
//! [`TestEnv`] wires the real router to in-memory storage and a
//! [`TestClock`], so integration tests exercise routing, extraction,
//! validation and error rendering without a database or a socket.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{body::Body, Router};
use http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
pub use webhooked_api::{AppState, Config};
pub use webhooked_core::{Clock, Storage, TestClock};

pub mod contracts;
pub mod database;
pub mod fixtures;

pub use database::TestDatabase;
pub use fixtures::{HookBuilder, TestRequest};

/// API key accepted by every [`TestEnv`].
pub const TEST_API_KEY: &str = "test-api-key";

/// In-process test environment around the application router.
pub struct TestEnv {
    /// Deterministic clock shared with storage
    pub clock: TestClock,
    state: AppState,
    router: Router,
}

impl TestEnv {
    /// Creates an environment backed by in-memory storage.
    pub fn new() -> Self {
        let clock = TestClock::new();
        let storage = Storage::in_memory(Arc::new(clock.clone()));
        Self::with_storage(storage, clock)
    }

    /// Creates an environment around existing storage.
    pub fn with_storage(storage: Storage, clock: TestClock) -> Self {
        let state = AppState::new(storage, test_config(), Arc::new(clock.clone()));
        let router = webhooked_api::create_router(state.clone());

        Self { clock, state, router }
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Repositories behind the router.
    pub fn storage(&self) -> &Storage {
        &self.state.storage
    }

    /// Moves the clock forward so later rows sort as newer.
    pub fn advance_time(&self, duration: Duration) {
        self.clock.advance(duration);
    }

    /// Sends a request through the router.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be built or the body cannot be read.
    pub async fn send(&self, request: TestRequest) -> Result<TestResponse> {
        let mut builder = Request::builder().method(request.method.clone()).uri(&request.uri);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let req = builder.body(Body::from(request.body)).context("invalid test request")?;

        let response = self.router.clone().oneshot(req).await.context("router failed")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("failed to read response body")?;

        Ok(TestResponse { status, headers, body: body.to_vec() })
    }

    /// `GET` without a body.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails to execute.
    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.send(TestRequest::new(Method::GET, uri)).await
    }

    /// Creates a hook through the API using the test key.
    ///
    /// # Errors
    ///
    /// Returns error if the API does not answer 201.
    pub async fn create_hook(&self, hook: HookBuilder) -> Result<Value> {
        let response = self
            .send(
                TestRequest::new(Method::POST, "/api/hooks")
                    .api_key(TEST_API_KEY)
                    .json(&hook.build()),
            )
            .await?;

        anyhow::ensure!(
            response.status == StatusCode::CREATED,
            "hook creation failed with {}: {}",
            response.status,
            response.text()
        );
        response.json()
    }

    /// Sends a webhook to a hook's receive endpoint.
    ///
    /// The request's URI is appended to the receive path, so build it with
    /// [`TestRequest::webhook`] and add a query with [`TestRequest::query`].
    ///
    /// # Errors
    ///
    /// Returns error if the request fails to execute.
    pub async fn receive(&self, hook_id: &str, request: TestRequest) -> Result<TestResponse> {
        let uri = format!("/api/hooks/{hook_id}/webhooks/receive{}", request.uri);
        self.send(TestRequest { uri, ..request }).await
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration used by test environments.
pub fn test_config() -> Config {
    Config {
        database_url: "postgresql://localhost/webhooked_test".to_string(),
        api_key: TEST_API_KEY.to_string(),
        ..Config::default()
    }
}

/// Buffered response from the router.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body)
            .with_context(|| format!("response body is not JSON: {}", self.text()))
    }

    /// Body as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// `Content-Type` of the response.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}
