//! HTTP client for third-party test providers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::{CallError, HttpError};

/// A third-party test provider the holder can fetch results from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProvider {
    /// Short identifier of the provider, e.g. `"GGD"`.
    pub provider_identifier: String,
    /// Endpoint serving signed test results.
    pub result_url: String,
}

/// The payload/signature pair a provider wraps its events in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEventPayload {
    /// Base64-encoded JSON document carrying the events.
    pub payload: String,
    /// Base64-encoded CMS signature over the decoded payload.
    pub signature: String,
}

/// A provider response, parsed and kept in its raw byte form.
///
/// The raw bytes are what gets persisted: re-deriving certificates later
/// requires re-verifying the provider signature against the exact document
/// as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedResponse {
    /// The response document exactly as received.
    pub raw: Vec<u8>,
    /// The parsed payload/signature pair.
    pub model: SignedEventPayload,
}

/// Client for fetching signed test results from providers.
pub struct TestProviderClient {
    client: reqwest::Client,
}

impl TestProviderClient {
    /// Creates a client with the default connection settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetches a signed test result from `provider`.
    ///
    /// The holder authenticates with the bearer `token` obtained during
    /// retrieval-code login; providers that hand out verification codes
    /// additionally expect one in the request body.
    ///
    /// # Errors
    /// Returns [`CallError::Http`] for non-success responses, with the
    /// error body preserved for classification, [`CallError::Transport`]
    /// when the exchange itself fails, and [`CallError::Other`] when a
    /// success response does not hold a payload/signature document.
    ///
    /// # Panics
    /// Outside of tests, panics when `provider.result_url` is not HTTPS.
    pub async fn fetch_test_result(
        &self,
        provider: &TestProvider,
        token: &str,
        verification_code: Option<&str>,
    ) -> Result<SignedResponse, CallError> {
        #[cfg(not(test))]
        assert!(provider.result_url.starts_with("https"));

        let body = TestResultRequest {
            verification_code: verification_code.map(str::to_owned),
        };
        let response = self
            .client
            .post(&provider.result_url)
            .timeout(Duration::from_secs(5))
            .header(
                "User-Agent",
                format!("holderkit-core/{}", env!("CARGO_PKG_VERSION")),
            )
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .ok()
                .filter(|bytes| !bytes.is_empty())
                .map(|bytes| bytes.to_vec());
            return Err(CallError::Http(HttpError {
                status: status.as_u16(),
                body,
            }));
        }

        let raw = response.bytes().await?.to_vec();
        let model = serde_json::from_slice(&raw)
            .map_err(|error| CallError::Other(format!("provider response decode: {error}")))?;
        Ok(SignedResponse { raw, model })
    }
}

impl Default for TestProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TestResultRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    verification_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(url: &str) -> TestProvider {
        TestProvider {
            provider_identifier: "XYZ".to_owned(),
            result_url: format!("{url}/v3/test/result"),
        }
    }

    #[tokio::test]
    async fn test_fetch_parses_signed_response() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"payload":"cGF5bG9hZA==","signature":"c2ln"}"#;
        let mock = server
            .mock("POST", "/v3/test/result")
            .match_header("authorization", "Bearer test-token")
            .match_body(mockito::Matcher::JsonString(
                r#"{"verificationCode":"123456"}"#.to_owned(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = TestProviderClient::new();
        let response = client
            .fetch_test_result(&provider(&server.url()), "test-token", Some("123456"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.raw, body.as_bytes());
        assert_eq!(response.model.payload, "cGF5bG9hZA==");
        assert_eq!(response.model.signature, "c2ln");
    }

    #[tokio::test]
    async fn test_fetch_error_preserves_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3/test/result")
            .with_status(429)
            .with_body(r#"{"status":"error","code":99702}"#)
            .create_async()
            .await;

        let client = TestProviderClient::new();
        let result = client
            .fetch_test_result(&provider(&server.url()), "test-token", None)
            .await;

        match result {
            Err(CallError::Http(http)) => {
                assert_eq!(http.status, 429);
                assert_eq!(
                    http.body.as_deref(),
                    Some(br#"{"status":"error","code":99702}"#.as_slice())
                );
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_with_empty_body_has_no_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3/test/result")
            .with_status(502)
            .create_async()
            .await;

        let client = TestProviderClient::new();
        let result = client
            .fetch_test_result(&provider(&server.url()), "test-token", None)
            .await;

        match result {
            Err(CallError::Http(http)) => {
                assert_eq!(http.status, 502);
                assert!(http.body.is_none());
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }
}
