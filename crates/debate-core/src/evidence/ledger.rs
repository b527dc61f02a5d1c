//! Shared per-stance evidence ledger.
//!
//! One ledger instance is shared by both agents and mutated only by the
//! orchestrator during a turn. Invariant: within one stance+category, no
//! two stored keys sit at/above the merge threshold — near-duplicates are
//! merged into the existing entry (updating `last_seen`) rather than
//! stored twice. The ledger never errors on malformed input; a degenerate
//! mention is skipped without aborting the rest of the statement.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalizer::{EvidenceCategory, EvidenceNormalizer};
use super::similarity::{SimilarityIndex, SimilarityThresholds};
use crate::state::Stance;

/// A normalized, categorized evidence mention.
///
/// Owned exclusively by the ledger entry it is stored under; immutable
/// except `last_seen`, which is refreshed on a repeat hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// The mention as it appeared in the statement.
    pub raw_text: String,
    /// Category the mention was extracted under.
    pub category: EvidenceCategory,
    /// Canonical ledger key.
    pub normalized_key: String,
    /// Heuristic confidence in [0, 1] — metadata only, never a gate.
    pub confidence: f64,
    /// When this evidence was last used.
    pub last_seen: DateTime<Utc>,
    /// Which side used it.
    pub stance: Stance,
}

/// Counts from one `record` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    /// New ledger entries created.
    pub inserted: usize,
    /// Mentions merged into existing entries.
    pub merged: usize,
}

/// One cross-stance evidence collision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConflict {
    /// The offending mention from the candidate statement.
    pub raw_text: String,
    /// Category in which the collision occurred.
    pub category: EvidenceCategory,
    /// The opposing ledger key that was matched.
    pub matched_key: String,
    /// Similarity score of the match (1.0 for an exact key hit).
    pub score: f64,
}

/// Every collision found in one candidate statement.
///
/// Built without short-circuiting so the caller can report all conflicts
/// at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    /// The acting stance that was checked.
    pub stance: Stance,
    pub conflicts: Vec<EvidenceConflict>,
}

impl ConflictReport {
    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// The raw offending snippets, for prompt embedding.
    pub fn raw_snippets(&self) -> Vec<String> {
        self.conflicts.iter().map(|c| c.raw_text.clone()).collect()
    }

    /// Korean warning text appended to a regeneration prompt.
    pub fn warning_text(&self) -> String {
        let listed = self
            .conflicts
            .iter()
            .map(|c| format!("- {}", c.raw_text))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "다음 근거는 상대측이 이미 사용했습니다. 다른 근거로 다시 논증하세요:\n{}",
            listed
        )
    }
}

/// Per-stance entry counts, for logging and outcome reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub progressive_entries: usize,
    pub conservative_entries: usize,
}

/// The shared evidence store. See module docs for the dedup invariant.
#[derive(Debug)]
pub struct EvidenceLedger {
    normalizer: EvidenceNormalizer,
    similarity: SimilarityIndex,
    thresholds: SimilarityThresholds,
    entries: HashMap<Stance, BTreeMap<String, EvidenceItem>>,
    /// Per-stance count of statements citing each canonical source.
    /// Kept outside the items so merging never loses a use.
    source_uses: HashMap<Stance, BTreeMap<String, usize>>,
}

impl Default for EvidenceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceLedger {
    pub fn new() -> Self {
        Self::with_thresholds(SimilarityThresholds::default())
    }

    pub fn with_thresholds(thresholds: SimilarityThresholds) -> Self {
        let mut entries = HashMap::new();
        entries.insert(Stance::Progressive, BTreeMap::new());
        entries.insert(Stance::Conservative, BTreeMap::new());
        Self {
            normalizer: EvidenceNormalizer::new(),
            similarity: SimilarityIndex::new(),
            thresholds,
            entries,
            source_uses: HashMap::new(),
        }
    }

    /// Extract every evidence mention from `statement_text` and fold it
    /// into the acting stance's store: a mention at/above the merge
    /// threshold against an existing same-category key refreshes that
    /// entry's `last_seen`; anything else becomes a new entry.
    pub fn record(&mut self, statement_text: &str, stance: Stance) -> RecordSummary {
        let mut summary = RecordSummary::default();
        for source in self.normalizer.sources_in(statement_text) {
            *self
                .source_uses
                .entry(stance)
                .or_default()
                .entry(source.to_string())
                .or_insert(0) += 1;
        }
        for (category, raws) in self.normalizer.extract(statement_text) {
            for raw in raws {
                let key = self.normalizer.normalize(&raw, category);
                if key.is_empty() {
                    // Isolate-and-continue: skip the mention, keep the rest.
                    debug!(%category, raw, "skipping evidence mention with empty key");
                    continue;
                }
                if let Some(existing) = self.merge_target(stance, category, &key) {
                    let entry = self
                        .entries
                        .get_mut(&stance)
                        .and_then(|m| m.get_mut(&existing));
                    if let Some(item) = entry {
                        item.last_seen = Utc::now();
                        summary.merged += 1;
                        continue;
                    }
                }
                let confidence = self.score_confidence(&raw);
                let item = EvidenceItem {
                    raw_text: raw,
                    category,
                    normalized_key: key.clone(),
                    confidence,
                    last_seen: Utc::now(),
                    stance,
                };
                self.entries.entry(stance).or_default().insert(key, item);
                summary.inserted += 1;
            }
        }
        summary
    }

    /// Exact-normalized-key membership test, across all categories.
    pub fn is_used(&self, evidence_text: &str, stance: Stance) -> bool {
        let Some(store) = self.entries.get(&stance) else {
            return false;
        };
        EvidenceCategory::ALL.iter().any(|&category| {
            let key = self.normalizer.normalize(evidence_text, category);
            !key.is_empty()
                && store
                    .get(&key)
                    .is_some_and(|item| item.category == category)
        })
    }

    /// Whether a named source has already been cited in `max_uses` or
    /// more recorded statements for the stance.
    pub fn is_source_overused(&self, source_name: &str, stance: Stance, max_uses: usize) -> bool {
        let canonical = self
            .normalizer
            .normalize(source_name, EvidenceCategory::Source);
        if canonical.is_empty() {
            return false;
        }
        let count = self
            .source_uses
            .get(&stance)
            .and_then(|uses| uses.get(&canonical))
            .copied()
            .unwrap_or(0);
        count >= max_uses
    }

    /// Check a candidate statement for collisions with the *opposing*
    /// stance's recorded evidence: exact key membership or similarity at
    /// or above the conflict threshold, within the same category.
    /// Exhaustive — every colliding mention is reported.
    pub fn check_conflict(&self, statement_text: &str, stance: Stance) -> ConflictReport {
        let opposing = stance.opposing();
        let mut conflicts = Vec::new();
        let Some(store) = self.entries.get(&opposing) else {
            return ConflictReport { stance, conflicts };
        };

        for (category, raws) in self.normalizer.extract(statement_text) {
            let keys: Vec<&str> = store
                .values()
                .filter(|item| item.category == category)
                .map(|item| item.normalized_key.as_str())
                .collect();
            if keys.is_empty() {
                continue;
            }
            for raw in raws {
                let key = self.normalizer.normalize(&raw, category);
                if key.is_empty() {
                    continue;
                }
                if store
                    .get(&key)
                    .is_some_and(|item| item.category == category)
                {
                    conflicts.push(EvidenceConflict {
                        raw_text: raw,
                        category,
                        matched_key: key,
                        score: 1.0,
                    });
                    continue;
                }
                if let Some((matched_key, score)) =
                    self.similarity.most_similar(&key, keys.iter().copied())
                {
                    if score >= self.thresholds.conflict {
                        conflicts.push(EvidenceConflict {
                            raw_text: raw,
                            category,
                            matched_key,
                            score,
                        });
                    }
                }
            }
        }
        ConflictReport { stance, conflicts }
    }

    /// Clear both stances' stores between sessions.
    pub fn reset(&mut self) {
        for store in self.entries.values_mut() {
            store.clear();
        }
        self.source_uses.clear();
    }

    /// Entry count for one stance.
    pub fn len(&self, stance: Stance) -> usize {
        self.entries.get(&stance).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|m| m.is_empty())
    }

    /// Recorded items for one stance, in key order.
    pub fn items(&self, stance: Stance) -> Vec<&EvidenceItem> {
        self.entries
            .get(&stance)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            progressive_entries: self.len(Stance::Progressive),
            conservative_entries: self.len(Stance::Conservative),
        }
    }

    /// Base 0.5; +0.2 for a digit, +0.2 for an authoritative source
    /// mention, +0.1 for a recent-year token; capped at 1.0.
    fn score_confidence(&self, raw: &str) -> f64 {
        let mut score: f64 = 0.5;
        if raw.chars().any(|c| c.is_ascii_digit()) {
            score += 0.2;
        }
        if self.normalizer.has_authority_mention(raw) {
            score += 0.2;
        }
        if self.normalizer.has_recent_year(raw, Utc::now().year()) {
            score += 0.1;
        }
        score.min(1.0)
    }

    /// Existing same-stance, same-category key that the candidate key
    /// should merge into, if any.
    fn merge_target(
        &self,
        stance: Stance,
        category: EvidenceCategory,
        key: &str,
    ) -> Option<String> {
        let store = self.entries.get(&stance)?;
        if store.get(key).is_some_and(|item| item.category == category) {
            return Some(key.to_string());
        }
        let keys = store
            .values()
            .filter(|item| item.category == category)
            .map(|item| item.normalized_key.as_str());
        match self.similarity.most_similar(key, keys) {
            Some((matched, score)) if score >= self.thresholds.merge => Some(matched),
            _ => None,
        }
    }
}
