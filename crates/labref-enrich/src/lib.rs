//! labref-enrich — Evidence enrichment for protocol records.
//!
//! - Placeholder detection (`PubMed search: ...` entries)
//! - Evidence-ranked PubMed query construction, strict then relaxed
//! - ID search + summary fetch through a pluggable [`sources::EvidenceSource`]
//! - Normalisation into canonical [`models::Reference`] values
//! - Batch orchestration with per-record failure isolation

pub mod document;
pub mod enricher;
pub mod marker;
pub mod models;
pub mod normalise;
pub mod query;
pub mod resolver;
pub mod sources;

#[cfg(test)]
pub(crate) mod testing;

pub use enricher::{Enricher, RecordOutcome, RunSummary};
pub use models::{MatchStatus, Reference, Resolution};
pub use resolver::{EvidenceResolver, ResolverSettings};
