//! Local persistence for holder certificates.
//!
//! The store keeps four tables mirroring the on-device database of the
//! holder app:
//!
//! 1. **Green cards** — the certificates a wallet can present, one row per
//!    regime ([`GreenCardKind`]).
//!
//! 2. **Origins** — the medical events justifying a card, each carrying a
//!    validity window frozen at insert time.
//!
//! 3. **Credentials** — signed presentation material for a card, stored in
//!    canonical byte form.
//!
//! 4. **Event groups** — provider-signed event batches kept verbatim so
//!    certificates can be re-derived later; their expiry is judged against
//!    the policy current at check time, not at insert time.
//!
//! Green cards own origins and credentials; deleting a card cascades to
//! both. Event groups belong to the wallet directly. All access goes through
//! the [`HolderStore`] trait so the same flows run against the on-device
//! database and the in-memory store used in tests.

mod entities;
mod error;
mod memory;
mod traits;

pub use entities::*;
pub use error::StoreError;
pub use memory::MemoryHolderStore;
pub use traits::HolderStore;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
