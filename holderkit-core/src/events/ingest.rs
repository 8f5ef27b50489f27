//! Fetching provider events and storing them as event groups.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::client::{SignedEventPayload, TestProvider, TestProviderClient};
use crate::network::{CallError, NetworkRequestError, NetworkResultFactory, Step};
use crate::store::{EventGroupId, HolderStore, NewEventGroup, OriginKind, StoreError, WalletId};

/// A single event inside a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    /// Unix timestamp at which the provider issued the event.
    pub issued_at: u64,
}

/// The decoded document inside a provider payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvents {
    /// Identifier of the provider that signed the document.
    pub provider_identifier: String,
    /// Wire protocol version of the document.
    pub protocol_version: String,
    /// The signed events, in no particular order.
    pub events: Vec<RemoteEvent>,
}

impl RemoteEvents {
    /// Unix timestamp of the most recent event, 0 when there are none.
    #[must_use]
    pub fn max_issued_at(&self) -> u64 {
        self.events
            .iter()
            .map(|event| event.issued_at)
            .max()
            .unwrap_or(0)
    }
}

/// Errors from event ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The provider call failed, classified.
    #[error(transparent)]
    Request(#[from] NetworkRequestError),

    /// The fetched events could not be stored.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fetches signed test results and stores them verbatim as event groups.
pub struct EventIngestor<S> {
    store: S,
    client: TestProviderClient,
    factory: NetworkResultFactory,
}

impl<S: HolderStore> EventIngestor<S> {
    /// Creates an ingestor writing to `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            client: TestProviderClient::new(),
            factory: NetworkResultFactory::new(),
        }
    }

    /// Fetches a signed test result from `provider` and stores it as an
    /// event group for `wallet_id`.
    ///
    /// The signed document is persisted byte-for-byte as received; only a
    /// decoded copy is inspected, for the provider identifier and the most
    /// recent issuance time.
    ///
    /// # Errors
    /// Returns [`IngestError::Request`] with the classified failure when
    /// the fetch fails, or [`IngestError::Store`] when the fetched group
    /// cannot be stored.
    #[allow(clippy::future_not_send)]
    pub async fn ingest_test_result(
        &self,
        wallet_id: WalletId,
        provider: &TestProvider,
        token: &str,
        verification_code: Option<&str>,
    ) -> Result<EventGroupId, IngestError> {
        let (signed, events) = self
            .factory
            .create_result(
                Step::TestResult,
                Some(&provider.provider_identifier),
                None,
                async {
                    let signed = self
                        .client
                        .fetch_test_result(provider, token, verification_code)
                        .await?;
                    let events = decode_events(&signed.model)?;
                    Ok((signed, events))
                },
            )
            .await?;

        let max_issued_at = events.max_issued_at();
        let id = self
            .store
            .insert_event_group(NewEventGroup {
                wallet_id,
                provider_identifier: events.provider_identifier,
                kind: OriginKind::Test,
                max_issued_at,
                payload: signed.raw,
            })
            .await?;
        info!(%id, provider = %provider.provider_identifier, max_issued_at, "test result stored");
        Ok(id)
    }
}

fn decode_events(model: &SignedEventPayload) -> Result<RemoteEvents, CallError> {
    let payload = STANDARD
        .decode(&model.payload)
        .map_err(|error| CallError::Other(format!("payload not base64: {error}")))?;
    serde_json::from_slice(&payload)
        .map_err(|error| CallError::Other(format!("payload not an events document: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryHolderStore;
    use serde_json::json;

    fn provider(url: &str) -> TestProvider {
        TestProvider {
            provider_identifier: "XYZ".to_owned(),
            result_url: format!("{url}/v3/test/result"),
        }
    }

    fn signed_body(events: &serde_json::Value) -> String {
        json!({
            "payload": STANDARD.encode(serde_json::to_vec(events).unwrap()),
            "signature": "c2ln",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_ingest_stores_signed_document_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let body = signed_body(&json!({
            "protocolVersion": "3.0",
            "providerIdentifier": "ZZZ",
            "events": [{"issuedAt": 100}, {"issuedAt": 250}, {"issuedAt": 175}],
        }));
        let _mock = server
            .mock("POST", "/v3/test/result")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(&body)
            .create_async()
            .await;

        let store = MemoryHolderStore::new();
        let ingestor = EventIngestor::new(store.clone());
        let id = ingestor
            .ingest_test_result(WalletId::DEFAULT, &provider(&server.url()), "token", None)
            .await
            .unwrap();

        let groups = store.event_groups_for_wallet(WalletId::DEFAULT).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, id);
        assert_eq!(groups[0].kind, OriginKind::Test);
        // The stored identifier comes from the signed document itself.
        assert_eq!(groups[0].provider_identifier, "ZZZ");
        assert_eq!(groups[0].max_issued_at, 250);
        assert_eq!(groups[0].payload, body.as_bytes());
    }

    #[tokio::test]
    async fn test_ingest_classifies_provider_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3/test/result")
            .with_status(429)
            .with_body(r#"{"status":"error","code":99702}"#)
            .create_async()
            .await;

        let store = MemoryHolderStore::new();
        let ingestor = EventIngestor::new(store.clone());
        let result = ingestor
            .ingest_test_result(WalletId::DEFAULT, &provider(&server.url()), "token", None)
            .await;

        match result {
            Err(IngestError::Request(NetworkRequestError::Provider { provider, step, .. })) => {
                assert_eq!(provider, "XYZ");
                assert_eq!(step, Step::TestResult);
            }
            other => panic!("expected provider error, got {other:?}"),
        }
        assert!(store
            .event_groups_for_wallet(WalletId::DEFAULT)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_ingest_rejects_undecodable_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3/test/result")
            .with_status(200)
            .with_body(r#"{"payload":"not base64!","signature":"c2ln"}"#)
            .create_async()
            .await;

        let store = MemoryHolderStore::new();
        let ingestor = EventIngestor::new(store.clone());
        let result = ingestor
            .ingest_test_result(WalletId::DEFAULT, &provider(&server.url()), "token", None)
            .await;

        assert!(matches!(
            result,
            Err(IngestError::Request(NetworkRequestError::Unexpected { .. }))
        ));
        assert!(store
            .event_groups_for_wallet(WalletId::DEFAULT)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_ingest_with_no_events_keeps_zero_watermark() {
        let mut server = mockito::Server::new_async().await;
        let body = signed_body(&json!({
            "protocolVersion": "3.0",
            "providerIdentifier": "ZZZ",
            "events": [],
        }));
        let _mock = server
            .mock("POST", "/v3/test/result")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let store = MemoryHolderStore::new();
        let ingestor = EventIngestor::new(store.clone());
        ingestor
            .ingest_test_result(WalletId::DEFAULT, &provider(&server.url()), "token", None)
            .await
            .unwrap();

        let groups = store.event_groups_for_wallet(WalletId::DEFAULT).await.unwrap();
        assert_eq!(groups[0].max_issued_at, 0);
    }
}
