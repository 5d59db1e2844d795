//! Catalog manifest model and retrieval
//!
//! The manifest tells the sync coordinator which catalog version is
//! published and which days it covers. Retrieval never fails from the
//! caller's point of view: any problem yields the compiled-in fallback.
//!
//! # Module Organization
//!
//! - [`types`] - Manifest model, wire format and key expansion
//! - [`fetch`] - Cache-busting retrieval with fallback

pub mod fetch;
pub mod types;

pub use fetch::ManifestFetcher;
pub use types::{CatalogManifest, FetchedManifest, ManifestConfig, ManifestSource};
