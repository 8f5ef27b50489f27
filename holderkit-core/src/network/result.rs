//! Failure taxonomy for remote calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;
use thiserror::Error;

/// The holder flow a network call belongs to.
///
/// Every classified failure carries its step so the caller can tell, for
/// example, a failed provider fetch from a failed credential issuance
/// without inspecting the underlying error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    /// Fetching the remote holder configuration.
    Configuration,
    /// Fetching the list of test providers.
    TestProviders,
    /// Exchanging tokens for provider access.
    AccessTokens,
    /// Fetching a signed test result from a provider.
    TestResult,
    /// Fetching signed events from a provider.
    Events,
    /// Requesting credential issuance from the signer backend.
    Credentials,
}

/// An HTTP response with a non-success status, body included when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// The HTTP status code.
    pub status: u16,
    /// The raw response body, if the server sent one.
    pub body: Option<Vec<u8>>,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(f, "status {} ({} byte body)", self.status, body.len()),
            None => write!(f, "status {} (no body)", self.status),
        }
    }
}

/// The raw failure of a single call attempt, before classification.
#[derive(Debug, Error)]
pub enum CallError {
    /// The server responded with a non-success status.
    #[error("http error: {0}")]
    Http(HttpError),

    /// The HTTP client failed to complete the exchange.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// An I/O fault outside the HTTP client.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure raised inside the call.
    #[error("{0}")]
    Other(String),
}

/// Structured error document the backend attaches to failed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorResponse {
    /// Human-readable status, e.g. `"error"`.
    pub status: String,
    /// Backend-defined numeric error code.
    pub code: i64,
}

impl fmt::Display for BackendErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {:?}, code {}", self.status, self.code)
    }
}

/// A fully classified network failure.
///
/// Exactly one variant applies to any failed call; the caller picks its
/// messaging by matching, never by string inspection.
#[derive(Debug, Error)]
pub enum NetworkRequestError {
    /// A test or event provider rejected or failed the call.
    ///
    /// Provider error bodies are never parsed; the provider identifier is
    /// what the holder needs for support messaging.
    #[error("provider {provider} failed during {step}: {error}")]
    Provider {
        /// The flow the call belonged to.
        step: Step,
        /// Identifier of the provider that failed.
        provider: String,
        /// The underlying HTTP failure.
        error: HttpError,
    },

    /// The backend failed and sent a recognizable error document.
    #[error("backend failed during {step}: {response}")]
    BackendWithResponse {
        /// The flow the call belonged to.
        step: Step,
        /// The decoded error document.
        response: BackendErrorResponse,
        /// The underlying HTTP failure.
        error: HttpError,
    },

    /// The backend failed without a usable error document.
    #[error("backend failed during {step}: {error}")]
    Backend {
        /// The flow the call belonged to.
        step: Step,
        /// The underlying HTTP failure.
        error: HttpError,
    },

    /// The call never completed because connectivity was missing.
    #[error("network unreachable during {step}: {error}")]
    Network {
        /// The flow the call belonged to.
        step: Step,
        /// The underlying transport or I/O failure.
        error: CallError,
    },

    /// A failure outside the known categories.
    #[error("unexpected failure during {step}: {error}")]
    Unexpected {
        /// The flow the call belonged to.
        step: Step,
        /// The underlying failure.
        error: CallError,
    },
}

impl NetworkRequestError {
    /// The flow the failed call belonged to.
    #[must_use]
    pub const fn step(&self) -> Step {
        match self {
            Self::Provider { step, .. }
            | Self::BackendWithResponse { step, .. }
            | Self::Backend { step, .. }
            | Self::Network { step, .. }
            | Self::Unexpected { step, .. } => *step,
        }
    }
}
