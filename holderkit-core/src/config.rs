//! Holder configuration and the validity policy derived from it.
//!
//! The backend ships a configuration document with per-event validity
//! windows. Two consumers read those windows with deliberately different
//! timing: origin insertion freezes the window in force at that moment,
//! while expiry sweeps re-read the policy on every check so a shortened
//! window takes effect retroactively on stored event groups.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::store::OriginKind;

/// Source of event validity windows.
pub trait ValidityPolicy: Send + Sync {
    /// Hours an event of `kind` stays usable after issuance.
    fn validity_hours(&self, kind: OriginKind) -> u32;
}

/// The holder configuration document, as served by the backend.
///
/// The wire keys omit the unit suffix (`vaccinationEventValidity` is a
/// number of hours). Unknown fields are ignored and absent fields fall
/// back to the shipped defaults, so an older app keeps working against a
/// newer document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolderConfig {
    /// Validity window of vaccination events, in hours. Default 14600.
    #[serde(rename = "vaccinationEventValidity")]
    pub vaccination_event_validity_hours: u32,
    /// Validity window of recovery events, in hours. Default 8760.
    #[serde(rename = "recoveryEventValidity")]
    pub recovery_event_validity_hours: u32,
    /// Validity window of negative test events, in hours. Default 96.
    #[serde(rename = "testEventValidity")]
    pub test_event_validity_hours: u32,
}

impl Default for HolderConfig {
    fn default() -> Self {
        Self {
            vaccination_event_validity_hours: 14_600,
            recovery_event_validity_hours: 8760,
            test_event_validity_hours: 96,
        }
    }
}

impl ValidityPolicy for HolderConfig {
    fn validity_hours(&self, kind: OriginKind) -> u32 {
        match kind {
            OriginKind::Vaccination => self.vaccination_event_validity_hours,
            OriginKind::Recovery => self.recovery_event_validity_hours,
            OriginKind::Test => self.test_event_validity_hours,
        }
    }
}

/// Shared handle to the most recently fetched configuration.
///
/// Clones share the same underlying document; [`update`] swaps it for every
/// holder of the handle at once. As a [`ValidityPolicy`] it always answers
/// from the latest document.
///
/// [`update`]: SharedConfigProvider::update
#[derive(Debug, Clone, Default)]
pub struct SharedConfigProvider {
    config: Arc<RwLock<HolderConfig>>,
}

impl SharedConfigProvider {
    /// Creates a provider starting from `config`.
    #[must_use]
    pub fn new(config: HolderConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Replaces the configuration for all holders of this handle.
    pub fn update(&self, config: HolderConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn current(&self) -> HolderConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ValidityPolicy for SharedConfigProvider {
    fn validity_hours(&self, kind: OriginKind) -> u32 {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .validity_hours(kind)
    }
}
