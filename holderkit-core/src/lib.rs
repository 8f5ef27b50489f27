#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

//! Core credential lifecycle for a health-certificate holder app.
//!
//! This crate holds the storage model and the lifecycle routines every
//! holder feature builds on:
//!
//! - [`store`] — green cards, their origins and credentials, and the raw
//!   event groups they are derived from, behind the
//!   [`HolderStore`](store::HolderStore) persistence trait.
//! - [`network`] — the [`NetworkResultFactory`](network::NetworkResultFactory)
//!   wrapping every remote call into a closed set of classified outcomes.
//! - [`config`] — the holder configuration document and the
//!   [`ValidityPolicy`](config::ValidityPolicy) read from it.
//! - [`migration`] — the one-time conversion of the legacy wallet blob
//!   into structured rows.
//! - [`pruning`] — the sweep deleting event groups that aged out under the
//!   current policy.
//! - [`events`] — retrieval of provider-signed test results.
//!
//! Everything here is driven by the embedding app: no routine spawns
//! background work, takes global locks, or retries on its own.

pub mod config;
pub mod events;
pub mod migration;
pub mod network;
pub mod pruning;
pub mod store;
