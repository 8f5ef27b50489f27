//! Persistence contract for the holder credential store.

use super::entities::{
    Credential, CredentialId, EventGroup, EventGroupId, GreenCard, GreenCardId, GreenCardKind,
    NewCredential, NewEventGroup, NewOrigin, Origin, OriginId, WalletId,
};
use super::StoreResult;

/// Persistence operations the holder app performs on its local store.
///
/// Implementations must keep referential integrity: an origin or credential
/// is only ever stored against an existing green card, deleting a green card
/// removes its origins and credentials in the same step, and a reader never
/// observes a child row without its parent.
#[allow(async_fn_in_trait)]
pub trait HolderStore {
    /// Inserts a green card and returns its store-assigned id.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn insert_green_card(
        &self,
        wallet_id: WalletId,
        kind: GreenCardKind,
    ) -> StoreResult<GreenCardId>;

    /// Looks up a green card by id.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn green_card(&self, id: GreenCardId) -> StoreResult<Option<GreenCard>>;

    /// Lists all green cards belonging to a wallet, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn green_cards_for_wallet(&self, wallet_id: WalletId) -> StoreResult<Vec<GreenCard>>;

    /// Deletes a green card together with its origins and credentials.
    ///
    /// # Errors
    /// Returns [`StoreError::GreenCardNotFound`] if no such card exists, or
    /// an error if the backing storage fails.
    ///
    /// [`StoreError::GreenCardNotFound`]: super::StoreError::GreenCardNotFound
    async fn delete_green_card(&self, id: GreenCardId) -> StoreResult<()>;

    /// Inserts an origin and returns its store-assigned id.
    ///
    /// # Errors
    /// Returns [`StoreError::GreenCardNotFound`] if the referenced green card
    /// does not exist, [`StoreError::OriginWindowInvalid`] if the validity
    /// window closes before it opens, or an error if the backing storage
    /// fails.
    ///
    /// [`StoreError::GreenCardNotFound`]: super::StoreError::GreenCardNotFound
    /// [`StoreError::OriginWindowInvalid`]: super::StoreError::OriginWindowInvalid
    async fn insert_origin(&self, origin: NewOrigin) -> StoreResult<OriginId>;

    /// Lists the origins of a green card, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn origins_for_green_card(&self, id: GreenCardId) -> StoreResult<Vec<Origin>>;

    /// Inserts a batch of credentials, all or none.
    ///
    /// Either every credential in the batch is stored and their ids returned,
    /// or the store is left untouched.
    ///
    /// # Errors
    /// Returns [`StoreError::GreenCardNotFound`] if any credential references
    /// a green card that does not exist, or an error if the backing storage
    /// fails.
    ///
    /// [`StoreError::GreenCardNotFound`]: super::StoreError::GreenCardNotFound
    async fn insert_credentials(
        &self,
        credentials: Vec<NewCredential>,
    ) -> StoreResult<Vec<CredentialId>>;

    /// Lists the credentials of a green card, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn credentials_for_green_card(&self, id: GreenCardId) -> StoreResult<Vec<Credential>>;

    /// Inserts an event group and returns its store-assigned id.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn insert_event_group(&self, group: NewEventGroup) -> StoreResult<EventGroupId>;

    /// Lists all event groups belonging to a wallet, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the backing storage fails.
    async fn event_groups_for_wallet(&self, wallet_id: WalletId) -> StoreResult<Vec<EventGroup>>;

    /// Deletes a single event group.
    ///
    /// # Errors
    /// Returns [`StoreError::EventGroupNotFound`] if no such group exists, or
    /// an error if the backing storage fails.
    ///
    /// [`StoreError::EventGroupNotFound`]: super::StoreError::EventGroupNotFound
    async fn delete_event_group(&self, id: EventGroupId) -> StoreResult<()>;
}
