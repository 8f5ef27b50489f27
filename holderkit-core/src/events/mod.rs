//! Retrieval of provider-signed events.
//!
//! Providers hand out signed documents wrapping a base64 payload and a CMS
//! signature. The document is stored byte-for-byte as an event group so the
//! signature can be re-verified whenever certificates are re-derived; only
//! a decoded copy is read, for bookkeeping fields.

mod client;
mod ingest;

pub use client::{SignedEventPayload, SignedResponse, TestProvider, TestProviderClient};
pub use ingest::{EventIngestor, IngestError, RemoteEvent, RemoteEvents};
