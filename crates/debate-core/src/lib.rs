//! Core engine for a two-persona Korean policy debate.
//!
//! Two fixed sides (진보 / 보수) exchange statements under a strict
//! alternation protocol. Around the exchange sit four services:
//!
//! - [`evidence`] — extraction and canonicalization of evidence
//!   mentions, near-duplicate merging within a stance, and cross-stance
//!   conflict detection over a shared ledger
//! - [`memory`] — bounded, prioritized compaction of each side's
//!   statement history
//! - [`consistency`] — an advisory self-contradiction audit backed by an
//!   LLM judge
//! - [`orchestrator`] — the turn driver tying it all together, with a
//!   one-retry conflict policy and soft failure everywhere downstream of
//!   sequencing
//!
//! All model access goes through the [`generator::Generator`] and
//! [`ops::LanguageOps`] seams, so the whole engine runs deterministically
//! under test doubles.

pub mod consistency;
pub mod evidence;
pub mod generator;
pub mod memory;
pub mod ops;
pub mod orchestrator;
pub mod state;

pub use consistency::{ConsistencyChecker, ConsistencyReport, ConsistencyViolation};
pub use evidence::{
    ConflictReport, EvidenceCategory, EvidenceConflict, EvidenceItem, EvidenceLedger,
    EvidenceNormalizer, LedgerStats, RecordSummary, SimilarityIndex, SimilarityThresholds,
};
pub use generator::{GenerationError, GenerationRequest, Generator, MockGenerator};
pub use memory::{MemoryConfig, MemoryEntry, MemoryPriority, StatementMemoryManager};
pub use ops::{GeneratorOps, LanguageOps, MockOps};
pub use orchestrator::{
    DebateError, DebateOrchestrator, DebateOutcome, OrchestratorConfig, StanceViolations,
    StatementProvider, TurnContext, TurnOutcome,
};
pub use state::{DebatePhase, DebateState, Stance, StatementRecord, TransitionError};
