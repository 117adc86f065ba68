//! homenet-consolidate: Inventory consolidation engine.
//!
//! Normalizes per-source discovery records into canonical form, resolves
//! host identity across sources keyed by MAC or IP, merges conflicting
//! fields by discovery-method trust, and emits the ordered inventory.

pub mod assemble;
pub mod config;
pub mod error;
pub mod identity;
pub mod merge;
pub mod normalize;
pub mod output;
pub mod trust;

pub use assemble::{consolidate, ConsolidateSummary, Consolidator, InputFile, Inventory};
pub use normalize::Provenance;
