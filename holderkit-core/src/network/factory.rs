//! Classification of raw call failures into the closed failure taxonomy.

use std::future::Future;
use std::io;

use tracing::{debug, warn};

use super::result::{BackendErrorResponse, CallError, HttpError, NetworkRequestError, Step};
use super::NetworkRequestResult;

/// Decodes a structured backend error document from a raw error body.
///
/// Returning `None` means the body is not a recognizable error document;
/// classification then falls back to the plain backend failure.
pub trait ErrorBodyConverter: Send + Sync {
    /// Attempts to decode `body`.
    fn convert(&self, body: &[u8]) -> Option<BackendErrorResponse>;
}

/// Decodes backend error documents from JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorBodyConverter;

impl ErrorBodyConverter for JsonErrorBodyConverter {
    fn convert(&self, body: &[u8]) -> Option<BackendErrorResponse> {
        serde_json::from_slice(body).ok()
    }
}

/// A one-shot hook consulted before an HTTP error is classified.
///
/// Returning `Some` turns the failed call into a success with the given
/// value; returning `None` lets classification proceed.
pub type HttpErrorInterceptor<R> = Box<dyn FnOnce(&HttpError) -> Option<R> + Send>;

/// Turns raw call outcomes into classified results.
///
/// Classification of a failed call is first-match-wins:
///
/// 1. an interceptor that recovers an HTTP error short-circuits to success;
/// 2. an HTTP error on a call with a provider identifier is a provider
///    failure, body unparsed;
/// 3. an HTTP error whose body decodes as a backend error document carries
///    that document; absent or undecodable bodies fall back to the plain
///    backend failure;
/// 4. transport and I/O faults that mean connectivity is missing are
///    network failures;
/// 5. everything else is unexpected.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
pub struct NetworkResultFactory<C = JsonErrorBodyConverter> {
    converter: C,
}

impl NetworkResultFactory {
    /// Creates a factory using the JSON error body converter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            converter: JsonErrorBodyConverter,
        }
    }
}

impl Default for NetworkResultFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ErrorBodyConverter> NetworkResultFactory<C> {
    /// Creates a factory with a custom error body converter.
    #[must_use]
    pub const fn with_converter(converter: C) -> Self {
        Self { converter }
    }

    /// Runs `call` and classifies its outcome for `step`.
    ///
    /// `provider` marks the call as going to a test or event provider;
    /// `intercept` is consulted on HTTP errors before classification.
    ///
    /// # Errors
    /// Returns the classified [`NetworkRequestError`] when the call fails
    /// and no interceptor recovers it.
    pub async fn create_result<R, F>(
        &self,
        step: Step,
        provider: Option<&str>,
        intercept: Option<HttpErrorInterceptor<R>>,
        call: F,
    ) -> NetworkRequestResult<R>
    where
        F: Future<Output = Result<R, CallError>>,
    {
        match call.await {
            Ok(value) => Ok(value),
            Err(CallError::Http(http)) => {
                if let Some(intercept) = intercept {
                    if let Some(recovered) = intercept(&http) {
                        debug!(%step, status = http.status, "http error intercepted");
                        return Ok(recovered);
                    }
                }
                Err(self.classify_http(step, provider, http))
            }
            Err(CallError::Transport(err)) => {
                if err.is_timeout() || err.is_connect() {
                    Err(NetworkRequestError::Network {
                        step,
                        error: CallError::Transport(err),
                    })
                } else {
                    Err(NetworkRequestError::Unexpected {
                        step,
                        error: CallError::Transport(err),
                    })
                }
            }
            Err(CallError::Io(err)) => {
                if is_connectivity_fault(err.kind()) {
                    Err(NetworkRequestError::Network {
                        step,
                        error: CallError::Io(err),
                    })
                } else {
                    Err(NetworkRequestError::Unexpected {
                        step,
                        error: CallError::Io(err),
                    })
                }
            }
            Err(error @ CallError::Other(_)) => {
                Err(NetworkRequestError::Unexpected { step, error })
            }
        }
    }

    fn classify_http(
        &self,
        step: Step,
        provider: Option<&str>,
        http: HttpError,
    ) -> NetworkRequestError {
        if let Some(provider) = provider {
            warn!(%step, provider, status = http.status, "provider call failed");
            return NetworkRequestError::Provider {
                step,
                provider: provider.to_owned(),
                error: http,
            };
        }
        let Some(body) = http.body.as_deref() else {
            warn!(%step, status = http.status, "backend call failed without a body");
            return NetworkRequestError::Backend { step, error: http };
        };
        let Some(response) = self.converter.convert(body) else {
            warn!(%step, status = http.status, "backend error body not decodable");
            return NetworkRequestError::Backend { step, error: http };
        };
        NetworkRequestError::BackendWithResponse {
            step,
            response,
            error: http,
        }
    }
}

const fn is_connectivity_fault(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
    )
}
