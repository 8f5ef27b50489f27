//! In-memory implementation of the holder store.

// Every method holds the state lock for its whole validate-then-mutate scope
#![allow(clippy::significant_drop_tightening)]

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::entities::{
    Credential, CredentialId, EventGroup, EventGroupId, GreenCard, GreenCardId, GreenCardKind,
    NewCredential, NewEventGroup, NewOrigin, Origin, OriginId, WalletId,
};
use super::error::StoreError;
use super::traits::HolderStore;
use super::StoreResult;

#[derive(Debug, Default)]
struct State {
    green_cards: BTreeMap<GreenCardId, GreenCard>,
    origins: BTreeMap<OriginId, Origin>,
    credentials: BTreeMap<CredentialId, Credential>,
    event_groups: BTreeMap<EventGroupId, EventGroup>,
    last_green_card_id: u64,
    last_origin_id: u64,
    last_credential_id: u64,
    last_event_group_id: u64,
}

/// In-memory [`HolderStore`] backed by id-ordered tables.
///
/// Row identifiers come from per-table counters starting at 1, mirroring the
/// autoincrement columns of the on-device database. All writes take a single
/// exclusive lock, so a cascade delete is atomic: readers see either every
/// row of a green card or none of them.
///
/// Cloning is cheap; clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryHolderStore {
    state: Arc<RwLock<State>>,
}

impl MemoryHolderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HolderStore for MemoryHolderStore {
    async fn insert_green_card(
        &self,
        wallet_id: WalletId,
        kind: GreenCardKind,
    ) -> StoreResult<GreenCardId> {
        let mut state = self.state.write().await;
        state.last_green_card_id += 1;
        let id = GreenCardId::new(state.last_green_card_id);
        state.green_cards.insert(
            id,
            GreenCard {
                id,
                wallet_id,
                kind,
            },
        );
        Ok(id)
    }

    async fn green_card(&self, id: GreenCardId) -> StoreResult<Option<GreenCard>> {
        Ok(self.state.read().await.green_cards.get(&id).cloned())
    }

    async fn green_cards_for_wallet(&self, wallet_id: WalletId) -> StoreResult<Vec<GreenCard>> {
        let state = self.state.read().await;
        Ok(state
            .green_cards
            .values()
            .filter(|card| card.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn delete_green_card(&self, id: GreenCardId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.green_cards.remove(&id).is_none() {
            return Err(StoreError::GreenCardNotFound(id));
        }
        state.origins.retain(|_, origin| origin.green_card_id != id);
        state
            .credentials
            .retain(|_, credential| credential.green_card_id != id);
        Ok(())
    }

    async fn insert_origin(&self, origin: NewOrigin) -> StoreResult<OriginId> {
        if origin.expiration_time < origin.valid_from {
            return Err(StoreError::OriginWindowInvalid {
                valid_from: origin.valid_from,
                expiration_time: origin.expiration_time,
            });
        }
        let mut state = self.state.write().await;
        if !state.green_cards.contains_key(&origin.green_card_id) {
            return Err(StoreError::GreenCardNotFound(origin.green_card_id));
        }
        state.last_origin_id += 1;
        let id = OriginId::new(state.last_origin_id);
        state.origins.insert(
            id,
            Origin {
                id,
                green_card_id: origin.green_card_id,
                kind: origin.kind,
                event_time: origin.event_time,
                valid_from: origin.valid_from,
                expiration_time: origin.expiration_time,
            },
        );
        Ok(id)
    }

    async fn origins_for_green_card(&self, id: GreenCardId) -> StoreResult<Vec<Origin>> {
        let state = self.state.read().await;
        Ok(state
            .origins
            .values()
            .filter(|origin| origin.green_card_id == id)
            .cloned()
            .collect())
    }

    async fn insert_credentials(
        &self,
        credentials: Vec<NewCredential>,
    ) -> StoreResult<Vec<CredentialId>> {
        let mut state = self.state.write().await;
        // Validate the whole batch before touching any table.
        for credential in &credentials {
            if !state.green_cards.contains_key(&credential.green_card_id) {
                return Err(StoreError::GreenCardNotFound(credential.green_card_id));
            }
        }
        let mut ids = Vec::with_capacity(credentials.len());
        for credential in credentials {
            state.last_credential_id += 1;
            let id = CredentialId::new(state.last_credential_id);
            state.credentials.insert(
                id,
                Credential {
                    id,
                    green_card_id: credential.green_card_id,
                    data: credential.data,
                    credential_version: credential.credential_version,
                    valid_from: credential.valid_from,
                    expiration_time: credential.expiration_time,
                },
            );
            ids.push(id);
        }
        Ok(ids)
    }

    async fn credentials_for_green_card(&self, id: GreenCardId) -> StoreResult<Vec<Credential>> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .values()
            .filter(|credential| credential.green_card_id == id)
            .cloned()
            .collect())
    }

    async fn insert_event_group(&self, group: NewEventGroup) -> StoreResult<EventGroupId> {
        let mut state = self.state.write().await;
        state.last_event_group_id += 1;
        let id = EventGroupId::new(state.last_event_group_id);
        state.event_groups.insert(
            id,
            EventGroup {
                id,
                wallet_id: group.wallet_id,
                provider_identifier: group.provider_identifier,
                kind: group.kind,
                max_issued_at: group.max_issued_at,
                payload: group.payload,
            },
        );
        Ok(id)
    }

    async fn event_groups_for_wallet(&self, wallet_id: WalletId) -> StoreResult<Vec<EventGroup>> {
        let state = self.state.read().await;
        Ok(state
            .event_groups
            .values()
            .filter(|group| group.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn delete_event_group(&self, id: EventGroupId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.event_groups.remove(&id).is_none() {
            return Err(StoreError::EventGroupNotFound(id));
        }
        Ok(())
    }
}
