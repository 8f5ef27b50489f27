//! One-time conversion of the legacy wallet blob into structured rows.
//!
//! Early releases of the holder app kept a single opaque blob holding one
//! negative test result. Migration reads that blob once, derives domestic
//! credentials from it through the signer, stores them as a green card with
//! its origin and credentials, and deletes the blob.
//!
//! The blob is deleted exactly once per attempt, whatever the attempt's
//! outcome. A blob that repeatedly fails conversion would otherwise wedge
//! every startup, so a failed conversion discards it too and reports
//! [`MigrationOutcome::FailedAndDiscarded`] for the caller to surface. The
//! discard also runs when the surrounding task is cancelled mid-migration;
//! see [`LegacyBlobStore`] for why the store is synchronous.

use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::store::{
    GreenCardId, GreenCardKind, HolderStore, NewCredential, NewOrigin, OriginKind, StoreError,
    WalletId, SECONDS_PER_HOUR,
};

/// Failure of the platform store holding the legacy wallet blob.
#[derive(Debug, Error)]
#[error("legacy blob store: {0}")]
pub struct BlobStoreError(pub String);

/// Platform storage for the legacy wallet blob.
///
/// The methods are synchronous on purpose: the discard must be able to run
/// inside a drop handler when migration is cancelled mid-flight, and a drop
/// handler cannot await.
pub trait LegacyBlobStore {
    /// Reads the legacy wallet blob, `None` when no legacy wallet exists.
    ///
    /// # Errors
    /// Returns an error if the platform store cannot be read.
    fn read(&self) -> Result<Option<Zeroizing<Vec<u8>>>, BlobStoreError>;

    /// Deletes the legacy wallet blob. Deleting an absent blob succeeds.
    ///
    /// # Errors
    /// Returns an error if the platform store cannot be written.
    fn delete(&self) -> Result<(), BlobStoreError>;
}

/// A domestic credential derived from the legacy wallet by the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCredential {
    /// Signed credential bytes as produced by the signer.
    pub payload: Vec<u8>,
    /// Version of the credential format.
    pub credential_version: u32,
    /// Unix timestamp from which the credential may be presented.
    pub valid_from: u64,
    /// Hours the credential stays presentable after `valid_from`.
    pub valid_for_hours: u32,
}

impl DerivedCredential {
    /// Unix timestamp at which this credential stops being presentable.
    #[must_use]
    pub fn expiration_time(&self) -> u64 {
        self.valid_from
            .saturating_add(u64::from(self.valid_for_hours) * SECONDS_PER_HOUR)
    }
}

/// The signer rejected the legacy wallet contents.
#[derive(Debug, Error)]
#[error("credential derivation failed: {reason}")]
pub struct DerivationError {
    /// Signer-specific description of the failure.
    pub reason: String,
}

/// Derives domestic credentials from a legacy wallet blob.
#[allow(async_fn_in_trait)]
pub trait DomesticCredentialDeriver {
    /// Converts the blob into an ordered list of domestic credentials.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be decoded or the cryptographic
    /// derivation fails.
    async fn derive(&self, blob: &[u8]) -> Result<Vec<DerivedCredential>, DerivationError>;
}

/// Why a conversion attempt failed.
///
/// Carried inside [`MigrationOutcome::FailedAndDiscarded`]: by the time the
/// caller sees it, the legacy blob is already gone.
#[derive(Debug, Error)]
pub enum MigrationFailure {
    /// The signer rejected the legacy wallet.
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// The signer produced no credentials to store.
    #[error("derivation produced no credentials")]
    EmptyDerivation,

    /// Storing the converted rows failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a migration attempt that ran to completion.
#[derive(Debug)]
pub enum MigrationOutcome {
    /// No legacy wallet was present; the store is untouched.
    Skipped,
    /// The legacy wallet was converted and discarded.
    Migrated {
        /// The green card the converted credentials were stored under.
        green_card_id: GreenCardId,
        /// Number of credential rows stored.
        credentials: usize,
    },
    /// Conversion failed and the legacy wallet was discarded anyway.
    ///
    /// The data is gone; callers decide whether to surface this to the
    /// holder. Rows created before the failure remain in the store.
    FailedAndDiscarded(MigrationFailure),
}

/// Faults of the migration machinery itself, as opposed to conversion
/// failures (which end up in [`MigrationOutcome::FailedAndDiscarded`]).
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The legacy blob could not be read; nothing was changed.
    #[error("reading legacy wallet: {0}")]
    BlobRead(#[source] BlobStoreError),

    /// The legacy blob could not be deleted after conversion.
    #[error("discarding legacy wallet: {0}")]
    BlobDelete(#[source] BlobStoreError),
}

/// Converts the legacy wallet into green card rows, exactly once.
pub struct LegacyCredentialMigrator<B, D, S> {
    blob_store: B,
    deriver: D,
    store: S,
}

impl<B, D, S> LegacyCredentialMigrator<B, D, S>
where
    B: LegacyBlobStore,
    D: DomesticCredentialDeriver,
    S: HolderStore,
{
    /// Creates a migrator over the given collaborators.
    pub const fn new(blob_store: B, deriver: D, store: S) -> Self {
        Self {
            blob_store,
            deriver,
            store,
        }
    }

    /// Runs the migration for `wallet_id`.
    ///
    /// Callers run this before anything else reads the wallet's rows; the
    /// migrator itself takes no lock. When a legacy wallet is present it is
    /// deleted before this method returns, even when conversion fails or the
    /// call is cancelled at an await point.
    ///
    /// # Errors
    /// Returns [`MigrationError::BlobRead`] if the legacy wallet cannot be
    /// read (nothing is changed in that case), or
    /// [`MigrationError::BlobDelete`] if the final discard fails. Conversion
    /// failures are not errors; they are reported as
    /// [`MigrationOutcome::FailedAndDiscarded`].
    #[allow(clippy::future_not_send)]
    pub async fn migrate(&self, wallet_id: WalletId) -> Result<MigrationOutcome, MigrationError> {
        let Some(blob) = self.blob_store.read().map_err(MigrationError::BlobRead)? else {
            debug!("no legacy wallet present, migration skipped");
            return Ok(MigrationOutcome::Skipped);
        };

        // From here on the blob is discarded no matter what happens, the
        // guard covering cancellation at the await points below.
        let guard = DiscardGuard::new(&self.blob_store);
        let outcome = match self.convert(wallet_id, blob.as_slice()).await {
            Ok((green_card_id, credentials)) => {
                info!(%green_card_id, credentials, "legacy wallet converted");
                MigrationOutcome::Migrated {
                    green_card_id,
                    credentials,
                }
            }
            Err(failure) => {
                warn!(%failure, "legacy wallet conversion failed, discarding anyway");
                MigrationOutcome::FailedAndDiscarded(failure)
            }
        };
        guard.complete().map_err(MigrationError::BlobDelete)?;
        Ok(outcome)
    }

    #[allow(clippy::future_not_send)]
    async fn convert(
        &self,
        wallet_id: WalletId,
        blob: &[u8],
    ) -> Result<(GreenCardId, usize), MigrationFailure> {
        let green_card_id = self
            .store
            .insert_green_card(wallet_id, GreenCardKind::Domestic)
            .await?;
        let derived = self.deriver.derive(blob).await?;
        let first = derived.first().ok_or(MigrationFailure::EmptyDerivation)?;

        // The legacy wallet held a single test result, so the one origin
        // takes its window from the first derived credential.
        self.store
            .insert_origin(NewOrigin::with_validity(
                green_card_id,
                OriginKind::Test,
                first.valid_from,
                first.valid_from,
                first.valid_for_hours,
            ))
            .await?;

        let credentials: Vec<NewCredential> = derived
            .iter()
            .map(|credential| {
                NewCredential::new(
                    green_card_id,
                    &credential.payload,
                    credential.credential_version,
                    credential.valid_from,
                    credential.expiration_time(),
                )
            })
            .collect();
        let count = credentials.len();
        self.store.insert_credentials(credentials).await?;
        Ok((green_card_id, count))
    }
}

/// Deletes the legacy blob when dropped, unless completed explicitly.
///
/// Explicit completion surfaces delete failures; the drop path can only log
/// them, and runs when migration is cancelled at an await point.
struct DiscardGuard<'a, B: LegacyBlobStore> {
    blob_store: &'a B,
    armed: bool,
}

impl<'a, B: LegacyBlobStore> DiscardGuard<'a, B> {
    const fn new(blob_store: &'a B) -> Self {
        Self {
            blob_store,
            armed: true,
        }
    }

    fn complete(mut self) -> Result<(), BlobStoreError> {
        self.armed = false;
        self.blob_store.delete()
    }
}

impl<B: LegacyBlobStore> Drop for DiscardGuard<'_, B> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(error) = self.blob_store.delete() {
                warn!(%error, "discarding legacy wallet during cancellation failed");
            }
        }
    }
}
