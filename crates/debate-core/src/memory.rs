//! Bounded statement memory — lossy, best-effort compaction.
//!
//! An agent's view of its own (or its opponent's) statement history is
//! compacted into a small set of prioritized, summarized entries. The
//! only hard guarantees: the cap is never exceeded, and the most recent
//! statements are never dropped.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ops::{truncate_chars, LanguageOps};

/// Why a statement was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPriority {
    /// Inside the recency window.
    Recent,
    /// Older, but touches an extracted key topic.
    KeyTopic,
}

impl std::fmt::Display for MemoryPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recent => write!(f, "recent"),
            Self::KeyTopic => write!(f, "key_topic"),
        }
    }
}

/// One compacted history entry. Created on commit, never mutated,
/// dropped only by a later compaction pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// The original statement text.
    pub statement: String,
    /// Generator-produced digest (or a truncation fallback).
    pub summary: String,
    pub priority: MemoryPriority,
}

/// Compaction bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Hard cap on managed entries.
    pub max_statements: usize,
    /// Most recent statements that are always kept.
    pub recent_window: usize,
    /// Cap on extracted key topics.
    pub max_topics: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_statements: 8,
            recent_window: 6,
            max_topics: 3,
        }
    }
}

/// Compacts a statement history into at most `max_statements` entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementMemoryManager {
    config: MemoryConfig,
}

impl StatementMemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self { config }
    }

    /// Compact `statements` (chronological order) into a bounded set.
    ///
    /// At or below the cap every statement is kept. Above it, the
    /// recency window is kept unconditionally, then older statements
    /// are scanned chronologically and kept first-fit if they contain
    /// one of the extracted key topics, stopping at the cap. Statements
    /// that fit no topic are dropped — this is lossy by design.
    pub fn manage(&self, statements: &[String], ops: &dyn LanguageOps) -> Vec<MemoryEntry> {
        let cap = self.config.max_statements;
        if cap == 0 || statements.is_empty() {
            return Vec::new();
        }

        if statements.len() <= cap {
            return statements
                .iter()
                .map(|s| self.entry(s, MemoryPriority::Recent, ops))
                .collect();
        }

        let window = self.config.recent_window.min(cap);
        let split = statements.len() - window;
        let (older, recent) = statements.split_at(split);

        let mut topics = match ops.extract_topics(statements) {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "topic extraction failed; keeping recency window only");
                Vec::new()
            }
        };
        topics.truncate(self.config.max_topics);

        let budget = cap - window;
        let mut entries = Vec::with_capacity(cap);
        if !topics.is_empty() {
            for statement in older {
                if entries.len() >= budget {
                    break;
                }
                if topics.iter().any(|t| statement.contains(t.as_str())) {
                    entries.push(self.entry(statement, MemoryPriority::KeyTopic, ops));
                }
            }
        }
        for statement in recent {
            entries.push(self.entry(statement, MemoryPriority::Recent, ops));
        }
        entries
    }

    fn entry(
        &self,
        statement: &str,
        priority: MemoryPriority,
        ops: &dyn LanguageOps,
    ) -> MemoryEntry {
        let summary = match ops.summarize(statement) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summarization failed; using truncation fallback");
                truncate_chars(statement, 60)
            }
        };
        MemoryEntry {
            statement: statement.to_string(),
            summary,
            priority,
        }
    }
}
