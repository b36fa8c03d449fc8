//! Pachca API client.
//!
//! Provides methods for sending and pinning messages, opening modal views,
//! and verifying webhook signatures.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use release_relay_core::MessageId;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, error, instrument};

use super::error::PachcaError;
use super::types::{MessageRequest, MessageResponse, ViewRequest};

/// Maximum accepted age of a webhook, in seconds.
const MAX_WEBHOOK_AGE_SECS: i64 = 300;

/// Outbound chat operations the relay depends on.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post a message and return its ID.
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageId, PachcaError>;

    /// Pin a previously posted message.
    async fn pin_message(&self, message_id: MessageId) -> Result<(), PachcaError>;

    /// Open a modal view in response to a button click.
    async fn open_view(&self, request: &ViewRequest) -> Result<(), PachcaError>;
}

/// Pachca API client.
#[derive(Clone)]
pub struct PachcaClient {
    /// HTTP client.
    client: Client,
    /// API base URL without a trailing slash.
    base_url: String,
    /// Bot access token.
    api_key: SecretString,
}

impl std::fmt::Debug for PachcaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PachcaClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl PachcaClient {
    /// Create a new Pachca client.
    #[must_use]
    pub fn new(base_url: &str, api_key: SecretString) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    /// Create a client on top of an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: Client, base_url: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Read the body and fail unless the status is 200 or 201.
    async fn check_status(response: Response, operation: &str) -> Result<String, PachcaError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PachcaError::Response(e.to_string()))?;

        debug!(status = %status, body = %body, "Pachca {operation} response");

        if status != StatusCode::OK && status != StatusCode::CREATED {
            error!(status = %status, "Pachca API error on {operation}");
            return Err(PachcaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ChatApi for PachcaClient {
    #[instrument(skip(self, request), fields(entity_id = %request.message.entity_id))]
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageId, PachcaError> {
        let response = self
            .client
            .post(self.url("messages"))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| PachcaError::Request(e.to_string()))?;

        let body = Self::check_status(response, "send message").await?;

        let result: MessageResponse =
            serde_json::from_str(&body).map_err(|e| PachcaError::Response(e.to_string()))?;

        debug!(message_id = %result.data.id, "Message posted to Pachca");

        Ok(result.data.id)
    }

    #[instrument(skip(self))]
    async fn pin_message(&self, message_id: MessageId) -> Result<(), PachcaError> {
        let response = self
            .client
            .post(self.url(&format!("messages/{message_id}/pin")))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| PachcaError::Request(e.to_string()))?;

        Self::check_status(response, "pin message").await?;

        debug!(message_id = %message_id, "Message pinned in Pachca");

        Ok(())
    }

    #[instrument(skip(self, request), fields(callback_id = %request.callback_id))]
    async fn open_view(&self, request: &ViewRequest) -> Result<(), PachcaError> {
        let response = self
            .client
            .post(self.url("views/open"))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| PachcaError::Request(e.to_string()))?;

        Self::check_status(response, "open view").await?;

        debug!("View opened in Pachca");

        Ok(())
    }
}

/// Verify a Pachca webhook signature.
///
/// Pachca signs the raw request body with HMAC-SHA256 using the bot's
/// signing secret and sends the hex digest in the `Pachca-Signature` header.
///
/// # Errors
///
/// Returns [`PachcaError::InvalidSignature`] if the signature does not match.
pub fn verify_signature(
    signing_secret: &SecretString,
    body: &[u8],
    signature: &str,
) -> Result<(), PachcaError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_secret.expose_secret().as_bytes())
        .map_err(|e| PachcaError::InvalidSignature(e.to_string()))?;

    mac.update(body);

    let expected = hex::encode(mac.finalize().into_bytes());

    if !constant_time_compare(&expected, &signature.to_ascii_lowercase()) {
        return Err(PachcaError::InvalidSignature(
            "Signature mismatch".to_string(),
        ));
    }

    debug!("Pachca signature verified");

    Ok(())
}

/// Reject webhooks older (or newer) than five minutes to prevent replay.
///
/// # Errors
///
/// Returns [`PachcaError::InvalidSignature`] if the timestamp is out of range.
pub fn verify_timestamp(webhook_timestamp: i64) -> Result<(), PachcaError> {
    let now_secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| PachcaError::InvalidSignature(e.to_string()))?
        .as_secs();

    let now = i64::try_from(now_secs)
        .map_err(|_| PachcaError::InvalidSignature("System time overflow".to_string()))?;

    if now.abs_diff(webhook_timestamp) > MAX_WEBHOOK_AGE_SECS.unsigned_abs() {
        return Err(PachcaError::InvalidSignature(
            "Webhook timestamp too old".to_string(),
        ));
    }

    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pachca::messages::{build_promote_view, build_release_message};
    use httpmock::prelude::*;
    use release_relay_core::{ChatId, JobId, ReleaseInfo};
    use serde_json::json;

    fn now() -> i64 {
        i64::try_from(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system time before epoch")
                .as_secs(),
        )
        .expect("fits in i64")
    }

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("valid key length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn release() -> ReleaseInfo {
        ReleaseInfo::new(JobId::new(12345), 1001, "1.0.1")
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "helloo"));
    }

    #[test]
    fn test_signature_verification_valid() {
        let secret = SecretString::from("test-signing-secret");
        let body = br#"{"type":"button","event":"click"}"#;
        let signature = sign(b"test-signing-secret", body);

        assert!(verify_signature(&secret, body, &signature).is_ok());
        assert!(verify_signature(&secret, body, &signature.to_uppercase()).is_ok());
    }

    #[test]
    fn test_signature_verification_tampered_body() {
        let secret = SecretString::from("test-signing-secret");
        let signature = sign(b"test-signing-secret", b"original=body");

        let result = verify_signature(&secret, b"tampered=body", &signature);
        assert!(matches!(result, Err(PachcaError::InvalidSignature(_))));
    }

    #[test]
    fn test_signature_verification_wrong_secret() {
        let secret = SecretString::from("test-signing-secret");
        let signature = sign(b"another-secret", b"body");

        assert!(verify_signature(&secret, b"body", &signature).is_err());
    }

    #[test]
    fn test_timestamp_window() {
        assert!(verify_timestamp(now()).is_ok());
        assert!(verify_timestamp(now() - 60).is_ok());
        assert!(matches!(
            verify_timestamp(now() - 600),
            Err(PachcaError::InvalidSignature(_))
        ));
        assert!(verify_timestamp(now() + 600).is_err());
        assert!(matches!(
            verify_timestamp(i64::MIN),
            Err(PachcaError::InvalidSignature(_))
        ));
        assert!(matches!(
            verify_timestamp(i64::MAX),
            Err(PachcaError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = PachcaClient::new(
            "https://api.pachca.com/api/shared/v1/",
            SecretString::from("super-secret-pachca-token"),
        );
        let debug_output = format!("{client:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-pachca-token"));
        assert_eq!(client.base_url(), "https://api.pachca.com/api/shared/v1");
    }

    #[tokio::test]
    async fn test_send_message_returns_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/messages")
                    .header("Authorization", "Bearer test-api-key")
                    .json_body_partial(r#"{"message":{"entity_type":"discussion","entity_id":198}}"#);
                then.status(201).json_body(json!({"data": {"id": 194_275}}));
            })
            .await;

        let client = PachcaClient::new(&server.base_url(), SecretString::from("test-api-key"));
        let id = client
            .send_message(&build_release_message(&release(), ChatId::new(198)))
            .await
            .expect("message sent");

        assert_eq!(id, MessageId::new(194_275));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_send_message_rejects_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/messages");
                then.status(422).body(r#"{"errors":[{"key":"entity_id"}]}"#);
            })
            .await;

        let client = PachcaClient::new(&server.base_url(), SecretString::from("test-api-key"));
        let result = client
            .send_message(&build_release_message(&release(), ChatId::new(198)))
            .await;

        assert!(matches!(result, Err(PachcaError::Status { status: 422, .. })));
    }

    #[tokio::test]
    async fn test_send_message_rejects_unexpected_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/messages");
                then.status(200).body("not json");
            })
            .await;

        let client = PachcaClient::new(&server.base_url(), SecretString::from("test-api-key"));
        let result = client
            .send_message(&build_release_message(&release(), ChatId::new(198)))
            .await;

        assert!(matches!(result, Err(PachcaError::Response(_))));
    }

    #[tokio::test]
    async fn test_pin_message_accepts_200_and_201() {
        let server = MockServer::start_async().await;
        let ok = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/messages/1/pin")
                    .header("Authorization", "Bearer test-api-key");
                then.status(200);
            })
            .await;
        let created = server
            .mock_async(|when, then| {
                when.method(POST).path("/messages/2/pin");
                then.status(201);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/messages/3/pin");
                then.status(404);
            })
            .await;

        let client = PachcaClient::new(&server.base_url(), SecretString::from("test-api-key"));

        assert!(client.pin_message(MessageId::new(1)).await.is_ok());
        assert!(client.pin_message(MessageId::new(2)).await.is_ok());
        assert!(matches!(
            client.pin_message(MessageId::new(3)).await,
            Err(PachcaError::Status { status: 404, .. })
        ));
        ok.assert_hits_async(1).await;
        created.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_open_view_posts_modal() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/views/open")
                    .header("Authorization", "Bearer test-api-key")
                    .json_body_partial(r#"{"type":"modal","callback_id":"promote","trigger_id":"abc"}"#);
                then.status(200);
            })
            .await;

        let client = PachcaClient::new(&server.base_url(), SecretString::from("test-api-key"));
        client
            .open_view(&build_promote_view(&release(), "abc"))
            .await
            .expect("view opened");

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_open_view_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/views/open");
                then.status(500);
            })
            .await;

        let client = PachcaClient::new(&server.base_url(), SecretString::from("test-api-key"));
        let result = client.open_view(&build_promote_view(&release(), "abc")).await;

        assert!(matches!(result, Err(PachcaError::Status { status: 500, .. })));
    }
}
