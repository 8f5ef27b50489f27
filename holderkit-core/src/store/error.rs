//! Error types for holder store operations.

use thiserror::Error;

use super::entities::{EventGroupId, GreenCardId};

/// Errors from holder store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row referenced a green card that does not exist.
    #[error("green card {0} not found")]
    GreenCardNotFound(GreenCardId),

    /// An event group targeted for deletion does not exist.
    #[error("event group {0} not found")]
    EventGroupNotFound(EventGroupId),

    /// An origin's validity window would close before it opens.
    #[error("origin window invalid: valid from {valid_from}, expires {expiration_time}")]
    OriginWindowInvalid {
        /// Unix timestamp from which the origin would be valid.
        valid_from: u64,
        /// Unix timestamp at which the origin would expire.
        expiration_time: u64,
    },

    /// The backing storage failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}
