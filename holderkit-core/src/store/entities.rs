//! Core row types for the holder credential store.
//!
//! The store is organized like the relational schema of the holder app it
//! backs: green cards own origins and credentials, event groups hang off the
//! wallet directly. All timestamps are Unix epoch seconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Seconds in one hour. Validity windows are configured in whole hours.
pub const SECONDS_PER_HOUR: u64 = 3600;

// Identifiers

/// Identifier of a wallet, the root of ownership for all stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletId(pub u64);

impl WalletId {
    /// The single wallet a holder app operates on today.
    pub const DEFAULT: Self = Self(1);

    /// Creates a new `WalletId`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a green card row, assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GreenCardId(pub u64);

impl GreenCardId {
    /// Creates a new `GreenCardId`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for GreenCardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an origin row, assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OriginId(pub u64);

impl OriginId {
    /// Creates a new `OriginId`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a credential row, assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub u64);

impl CredentialId {
    /// Creates a new `CredentialId`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an event group row, assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventGroupId(pub u64);

impl EventGroupId {
    /// Creates a new `EventGroupId`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EventGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Enums

/// The certificate regime a green card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GreenCardKind {
    /// Certificate valid within the issuing country only.
    Domestic,
    /// Certificate following the EU digital certificate format.
    European,
}

/// The medical event an origin (and its validity window) stems from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// A vaccination event.
    Vaccination,
    /// A recovery from infection.
    Recovery,
    /// A negative test result.
    Test,
}

// Green Card

/// A green card: the holder-facing certificate a wallet presents.
///
/// A green card is only presentable while at least one of its origins is
/// within its validity window and at least one credential covers the moment
/// of presentation; the rows themselves carry no validity of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreenCard {
    /// Store-assigned row identifier.
    pub id: GreenCardId,
    /// Wallet this card belongs to.
    pub wallet_id: WalletId,
    /// Certificate regime of this card.
    pub kind: GreenCardKind,
}

// Origin

/// The medical event justifying a green card, with its validity window.
///
/// The window is frozen at insert time from the policy in force then; later
/// policy changes never rewrite stored origins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Store-assigned row identifier.
    pub id: OriginId,
    /// Green card this origin justifies.
    pub green_card_id: GreenCardId,
    /// Kind of medical event.
    pub kind: OriginKind,
    /// Unix timestamp of the underlying medical event.
    pub event_time: u64,
    /// Unix timestamp from which the origin is valid.
    pub valid_from: u64,
    /// Unix timestamp at which the origin stops being valid.
    pub expiration_time: u64,
}

impl Origin {
    /// Checks whether the origin's validity window has closed.
    ///
    /// An origin expiring exactly at `now` is already expired.
    #[must_use]
    pub const fn is_expired(&self, now: u64) -> bool {
        self.expiration_time <= now
    }
}

/// Input for inserting an origin; the store assigns the row identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrigin {
    /// Green card this origin justifies.
    pub green_card_id: GreenCardId,
    /// Kind of medical event.
    pub kind: OriginKind,
    /// Unix timestamp of the underlying medical event.
    pub event_time: u64,
    /// Unix timestamp from which the origin is valid.
    pub valid_from: u64,
    /// Unix timestamp at which the origin stops being valid.
    pub expiration_time: u64,
}

impl NewOrigin {
    /// Builds an origin whose expiration is `valid_from` plus the validity
    /// window in force right now.
    #[must_use]
    pub fn with_validity(
        green_card_id: GreenCardId,
        kind: OriginKind,
        event_time: u64,
        valid_from: u64,
        validity_hours: u32,
    ) -> Self {
        Self {
            green_card_id,
            kind,
            event_time,
            valid_from,
            expiration_time: valid_from
                .saturating_add(u64::from(validity_hours) * SECONDS_PER_HOUR),
        }
    }
}

// Credential

/// A signed credential presentable for a green card during its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Store-assigned row identifier.
    pub id: CredentialId,
    /// Green card this credential belongs to.
    pub green_card_id: GreenCardId,
    /// Opaque signed credential bytes in canonical form (no `\/` escapes).
    pub data: Vec<u8>,
    /// Version of the credential format, as issued.
    pub credential_version: u32,
    /// Unix timestamp from which the credential may be presented.
    pub valid_from: u64,
    /// Unix timestamp at which the credential stops being presentable.
    pub expiration_time: u64,
}

impl Credential {
    /// Checks whether the credential's presentation window has closed.
    #[must_use]
    pub const fn is_expired(&self, now: u64) -> bool {
        self.expiration_time <= now
    }
}

/// Input for inserting a credential; the store assigns the row identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    /// Green card this credential belongs to.
    pub green_card_id: GreenCardId,
    /// Opaque signed credential bytes, canonicalized on construction.
    pub data: Vec<u8>,
    /// Version of the credential format, as issued.
    pub credential_version: u32,
    /// Unix timestamp from which the credential may be presented.
    pub valid_from: u64,
    /// Unix timestamp at which the credential stops being presentable.
    pub expiration_time: u64,
}

impl NewCredential {
    /// Creates a credential input, canonicalizing `data` so that stored
    /// credential bytes never carry `\/` escape artifacts.
    #[must_use]
    pub fn new(
        green_card_id: GreenCardId,
        data: &[u8],
        credential_version: u32,
        valid_from: u64,
        expiration_time: u64,
    ) -> Self {
        Self {
            green_card_id,
            data: canonical_payload(data),
            credential_version,
            valid_from,
            expiration_time,
        }
    }
}

// Event Group

/// A provider-signed batch of medical events, stored verbatim as received.
///
/// Unlike origins, event groups carry no frozen expiration: whether a group
/// is expired is decided against the validity policy in force at the moment
/// of the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGroup {
    /// Store-assigned row identifier.
    pub id: EventGroupId,
    /// Wallet this group belongs to.
    pub wallet_id: WalletId,
    /// Identifier of the provider that signed the batch.
    pub provider_identifier: String,
    /// Kind of events in the batch.
    pub kind: OriginKind,
    /// Unix timestamp of the most recent event in the batch.
    pub max_issued_at: u64,
    /// The signed payload exactly as received from the provider.
    pub payload: Vec<u8>,
}

impl EventGroup {
    /// Checks whether the group has aged out under the given validity window.
    ///
    /// A group whose window closes exactly at `now` is already expired.
    #[must_use]
    pub fn is_expired(&self, validity_hours: u32, now: u64) -> bool {
        self.max_issued_at
            .saturating_add(u64::from(validity_hours) * SECONDS_PER_HOUR)
            <= now
    }
}

/// Input for inserting an event group; the store assigns the row identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEventGroup {
    /// Wallet this group belongs to.
    pub wallet_id: WalletId,
    /// Identifier of the provider that signed the batch.
    pub provider_identifier: String,
    /// Kind of events in the batch.
    pub kind: OriginKind,
    /// Unix timestamp of the most recent event in the batch.
    pub max_issued_at: u64,
    /// The signed payload exactly as received from the provider.
    pub payload: Vec<u8>,
}

// Payload canonicalization

/// Strips `\/` escape sequences from a payload, keeping the slash.
///
/// Signers on some platforms escape forward slashes when serializing JSON;
/// the escaped and unescaped forms are semantically equal but byte-unequal,
/// which breaks signature checks against re-serialized data. Credential
/// bytes are therefore stored in the unescaped form.
#[must_use]
pub fn canonical_payload(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if byte == b'\\' && bytes.peek() == Some(&b'/') {
            continue;
        }
        out.push(byte);
    }
    out
}
