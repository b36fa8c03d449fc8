//! Integration tests for the release relay.
//!
//! Each test drives the full axum application in-process with
//! `tower::ServiceExt::oneshot` while an `httpmock` server stands in for the
//! Pachca API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p release-relay-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gitlab_webhook` - CI build events to release messages
//! - `pachca_webhook` - Button clicks, promote form submits and signatures

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use hmac::{Hmac, Mac};
use httpmock::MockServer;
use release_relay::{config::RelayConfig, state::AppState};
use sha2::Sha256;
use tower::ServiceExt;

/// Bot token used against the mock API.
pub const TEST_API_KEY: &str = "pK7vQ2mX9rT4wZ8nB3cF6hJ1";

/// Internal chat receiving release messages.
pub const TEST_CHAT_ID: i64 = 198;

/// Signing secret for signature tests.
pub const TEST_SIGNING_SECRET: &str = "sG4kL9pW2xV7qN3mR8tY5bH1";

/// Response returned by a relay request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("JSON response body")
    }
}

/// A relay application wired to a mock Pachca API.
pub struct TestContext {
    pub pachca: MockServer,
    app: Router,
}

impl TestContext {
    /// Relay with only the required configuration.
    pub async fn new() -> Self {
        Self::with_env(&[]).await
    }

    /// Relay with extra environment variables layered on top.
    pub async fn with_env(extra: &[(&str, &str)]) -> Self {
        let pachca = MockServer::start_async().await;

        let mut vars: HashMap<String, String> = HashMap::from([
            ("ENV_PACHCA_URL".to_string(), pachca.base_url()),
            ("ENV_PACHCA_KEY".to_string(), TEST_API_KEY.to_string()),
            (
                "ENV_PACHCA_INTERNAL_CHAT_ID".to_string(),
                TEST_CHAT_ID.to_string(),
            ),
        ]);
        vars.extend(
            extra
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );

        let config =
            RelayConfig::from_lookup(move |key: &str| vars.get(key).cloned()).expect("config");
        let app = release_relay::app(AppState::new(config));

        Self { pachca, app }
    }

    /// POST a raw body with optional extra headers.
    pub async fn post(&self, path: &str, body: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut request = Request::post(path).header("content-type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let request = request
            .body(Body::from(body.to_string()))
            .expect("request");

        self.send(request).await
    }

    /// POST a JSON value.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        self.post(path, &body.to_string(), &[]).await
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        TestResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Hex HMAC-SHA256 of `body`, as Pachca computes it.
pub fn sign(secret: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
