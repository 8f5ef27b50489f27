//! Common test utilities shared across integration tests.

use std::sync::Mutex;

use holderkit_core::migration::{
    BlobStoreError, DerivationError, DerivedCredential, DomesticCredentialDeriver, LegacyBlobStore,
};
use zeroize::Zeroizing;

/// Installs a test-writer subscriber once per process; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub struct InMemoryBlobStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new(blob: Option<Vec<u8>>) -> Self {
        Self {
            blob: Mutex::new(blob),
        }
    }

    pub fn has_blob(&self) -> bool {
        self.blob.lock().expect("blob lock").is_some()
    }
}

impl LegacyBlobStore for &InMemoryBlobStore {
    fn read(&self) -> Result<Option<Zeroizing<Vec<u8>>>, BlobStoreError> {
        Ok(self
            .blob
            .lock()
            .map_err(|_| BlobStoreError("mutex poisoned".to_string()))?
            .clone()
            .map(Zeroizing::new))
    }

    fn delete(&self) -> Result<(), BlobStoreError> {
        *self
            .blob
            .lock()
            .map_err(|_| BlobStoreError("mutex poisoned".to_string()))? = None;
        Ok(())
    }
}

/// Deriver answering every blob with the same prepared credentials.
pub struct StaticDeriver(pub Vec<DerivedCredential>);

impl DomesticCredentialDeriver for StaticDeriver {
    async fn derive(&self, _blob: &[u8]) -> Result<Vec<DerivedCredential>, DerivationError> {
        Ok(self.0.clone())
    }
}

/// Deriver rejecting every blob, as the signer does for corrupt wallets.
pub struct FailingDeriver;

impl DomesticCredentialDeriver for FailingDeriver {
    async fn derive(&self, _blob: &[u8]) -> Result<Vec<DerivedCredential>, DerivationError> {
        Err(DerivationError {
            reason: "commitment does not verify".to_string(),
        })
    }
}

pub fn derived(valid_from: u64, valid_for_hours: u32) -> DerivedCredential {
    DerivedCredential {
        payload: br#"{"issuer":"https:\/\/holder.example\/ccm","proof":"qrstuv"}"#.to_vec(),
        credential_version: 3,
        valid_from,
        valid_for_hours,
    }
}
