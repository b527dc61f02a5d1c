//! Evidence subsystem — extraction, similarity matching, and the shared
//! per-stance ledger.
//!
//! # Pipeline
//!
//! ```text
//! statement ──extract──▶ raw mentions ──normalize──▶ canonical keys
//!                                                        │
//!                        same stance+category ≥ merge ───┤ merge (last_seen)
//!                        opposing stance     ≥ conflict ─┤ conflict report
//!                        otherwise ──────────────────────┘ new ledger entry
//! ```

pub mod ledger;
pub mod normalizer;
pub mod similarity;

pub use ledger::{
    ConflictReport, EvidenceConflict, EvidenceItem, EvidenceLedger, LedgerStats, RecordSummary,
};
pub use normalizer::{EvidenceCategory, EvidenceNormalizer};
pub use similarity::{SimilarityIndex, SimilarityThresholds};
