//! The classifier against live exchanges: a real HTTP server for protocol
//! errors, a refused socket and an unresolvable host for transport faults.

use holderkit_core::network::{
    CallError, HttpError, NetworkRequestError, NetworkResultFactory, Step,
};
use mockito::Server;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ProvidersDocument {
    providers: Vec<String>,
}

/// Plain GET returning the decoded body, shaped the way callers hand their
/// exchanges to the factory.
async fn get_json<R>(url: &str) -> Result<R, CallError>
where
    R: serde::de::DeserializeOwned,
{
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.ok().map(|bytes| bytes.to_vec());
        return Err(CallError::Http(HttpError {
            status: status.as_u16(),
            body: body.filter(|bytes| !bytes.is_empty()),
        }));
    }
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_successful_call_passes_value_through() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/holder/config")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"providers":["GGD","RIVM"]}"#)
        .create_async()
        .await;
    let factory = NetworkResultFactory::new();

    let result: Result<ProvidersDocument, _> = factory
        .create_result(
            Step::Configuration,
            None,
            None,
            get_json(&format!("{}/holder/config", server.url())),
        )
        .await;

    mock.assert_async().await;
    let document = result.expect("classified call");
    assert_eq!(document.providers, vec!["GGD".to_string(), "RIVM".to_string()]);
}

#[tokio::test]
async fn test_backend_error_body_is_decoded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/holder/events")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"error","code":99702}"#)
        .create_async()
        .await;
    let factory = NetworkResultFactory::new();

    let result: Result<ProvidersDocument, _> = factory
        .create_result(
            Step::Events,
            None,
            None,
            get_json(&format!("{}/holder/events", server.url())),
        )
        .await;

    mock.assert_async().await;
    match result {
        Err(NetworkRequestError::BackendWithResponse {
            step,
            response,
            error,
        }) => {
            assert_eq!(step, Step::Events);
            assert_eq!(response.status, "error");
            assert_eq!(response.code, 99702);
            assert_eq!(error.status, 500);
        }
        other => panic!("expected a decoded backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_calls_fail_as_provider_errors() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/provider/result")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"error","code":99702}"#)
        .create_async()
        .await;
    let factory = NetworkResultFactory::new();

    let result: Result<ProvidersDocument, _> = factory
        .create_result(
            Step::TestResult,
            Some("XYZ"),
            None,
            get_json(&format!("{}/provider/result", server.url())),
        )
        .await;

    mock.assert_async().await;
    match result {
        Err(NetworkRequestError::Provider {
            step,
            provider,
            error,
        }) => {
            assert_eq!(step, Step::TestResult);
            assert_eq!(provider, "XYZ");
            // The decodable body stays raw; provider errors never go
            // through the converter.
            assert_eq!(error.status, 429);
            assert_eq!(
                error.body.as_deref(),
                Some(br#"{"status":"error","code":99702}"#.as_slice())
            );
        }
        other => panic!("expected a provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_refused_connection_classifies_as_network() {
    // Bind and drop a listener so the port is known to refuse connections.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local address");
    drop(listener);
    let factory = NetworkResultFactory::new();

    let result: Result<ProvidersDocument, _> = factory
        .create_result(
            Step::Configuration,
            None,
            None,
            get_json(&format!("http://{address}/holder/config")),
        )
        .await;

    match result {
        Err(NetworkRequestError::Network { step, .. }) => assert_eq!(step, Step::Configuration),
        other => panic!("expected a network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unresolvable_host_classifies_as_network() {
    let factory = NetworkResultFactory::new();

    // The .invalid TLD is reserved, so resolution fails everywhere.
    let result: Result<ProvidersDocument, _> = factory
        .create_result(
            Step::TestProviders,
            None,
            None,
            get_json("http://holder-api.invalid/v6/test_providers"),
        )
        .await;

    match result {
        Err(NetworkRequestError::Network { step, .. }) => assert_eq!(step, Step::TestProviders),
        other => panic!("expected a network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_interceptor_turns_missing_resource_into_default() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/holder/config")
        .with_status(404)
        .create_async()
        .await;
    let factory = NetworkResultFactory::new();

    let result = factory
        .create_result(
            Step::Configuration,
            None,
            Some(Box::new(|error: &HttpError| {
                (error.status == 404).then(|| ProvidersDocument {
                    providers: Vec::new(),
                })
            })),
            get_json(&format!("{}/holder/config", server.url())),
        )
        .await;

    mock.assert_async().await;
    let document = result.expect("intercepted call");
    assert!(document.providers.is_empty());
}
