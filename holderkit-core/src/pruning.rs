//! Deletion of event groups whose validity window has elapsed.
//!
//! Event groups age out relative to the policy in force when the sweep
//! runs, not when they were ingested. A shortened validity window therefore
//! applies retroactively to stored groups, the mirror image of origins,
//! whose windows are frozen at insert time.

use tracing::{info, warn};

use crate::config::ValidityPolicy;
use crate::store::{EventGroup, EventGroupId, HolderStore, StoreError, StoreResult, WalletId};

/// What a single prune pass did.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Event groups deleted by this pass.
    pub deleted: Vec<EventGroupId>,
    /// Expired event groups whose deletion failed, with the failure.
    pub failed: Vec<(EventGroupId, StoreError)>,
}

/// Sweeps expired event groups out of the store.
pub struct ExpiredEventPruner<S, P> {
    store: S,
    policy: P,
}

impl<S, P> ExpiredEventPruner<S, P>
where
    S: HolderStore,
    P: ValidityPolicy,
{
    /// Creates a pruner over the given store and policy source.
    pub const fn new(store: S, policy: P) -> Self {
        Self { store, policy }
    }

    /// Evaluates `events` at `now` and deletes the expired ones.
    ///
    /// Each group is judged against the validity window its kind has right
    /// now, with a non-strict boundary: a group expiring exactly at `now`
    /// is deleted. Groups are processed independently; a failed deletion is
    /// recorded in the report but does not stop the pass.
    #[allow(clippy::future_not_send)]
    pub async fn prune(&self, events: &[EventGroup], now: u64) -> PruneReport {
        let mut report = PruneReport::default();
        for event in events {
            let validity_hours = self.policy.validity_hours(event.kind);
            if !event.is_expired(validity_hours, now) {
                continue;
            }
            match self.store.delete_event_group(event.id).await {
                Ok(()) => report.deleted.push(event.id),
                Err(error) => {
                    warn!(id = %event.id, %error, "failed to delete expired event group");
                    report.failed.push((event.id, error));
                }
            }
        }
        if !report.deleted.is_empty() || !report.failed.is_empty() {
            info!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "expired event groups pruned"
            );
        }
        report
    }

    /// Prunes every expired event group belonging to `wallet_id`.
    ///
    /// # Errors
    /// Returns an error if the wallet's event groups cannot be listed;
    /// individual deletion failures only show up in the [`PruneReport`].
    #[allow(clippy::future_not_send)]
    pub async fn prune_wallet(&self, wallet_id: WalletId, now: u64) -> StoreResult<PruneReport> {
        let events = self.store.event_groups_for_wallet(wallet_id).await?;
        Ok(self.prune(&events, now).await)
    }
}
