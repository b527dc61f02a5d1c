//! Self-consistency auditing — advisory only.
//!
//! A candidate statement is compared against a window of the same
//! side's recent statements via an LLM contradiction judgment. Findings
//! are logged and recorded, never enforced: an inconsistent statement
//! is still committed, and a judge failure reads as "consistent".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ops::{truncate_chars, LanguageOps};

const EXCERPT_CHARS: usize = 80;

/// One recorded contradiction between a side's own statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyViolation {
    /// Excerpt of the statement that introduced the contradiction.
    pub new_excerpt: String,
    /// Excerpt of the earlier statement it contradicts.
    pub conflicting_excerpt: String,
    pub detected_at: DateTime<Utc>,
}

/// Outcome of one history check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    /// The earlier statement the candidate contradicts, if any.
    pub offending: Option<String>,
}

impl ConsistencyReport {
    fn consistent() -> Self {
        Self {
            consistent: true,
            offending: None,
        }
    }
}

/// Audits one side's statements for self-contradiction.
///
/// Violations accumulate across the debate; `reset` clears them when a
/// new debate starts.
pub struct ConsistencyChecker {
    window: usize,
    violations: Vec<ConsistencyViolation>,
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new(4)
    }
}

impl ConsistencyChecker {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            violations: Vec::new(),
        }
    }

    /// Whether `candidate` contradicts `earlier`, per the judge.
    ///
    /// A judge failure is read as "no contradiction" — the audit must
    /// never block a turn.
    pub fn is_contradictory(
        &self,
        candidate: &str,
        earlier: &str,
        ops: &dyn LanguageOps,
    ) -> bool {
        match ops.judge(candidate, earlier) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(error = %e, "contradiction judge failed; assuming consistent");
                false
            }
        }
    }

    /// Check `candidate` against the most recent `window` entries of
    /// `history` (newest first), stopping at the first contradiction.
    pub fn check_against_history(
        &mut self,
        candidate: &str,
        history: &[String],
        ops: &dyn LanguageOps,
    ) -> ConsistencyReport {
        for earlier in history.iter().rev().take(self.window) {
            if self.is_contradictory(candidate, earlier, ops) {
                warn!(
                    earlier = %truncate_chars(earlier, EXCERPT_CHARS),
                    "statement contradicts earlier statement by the same side"
                );
                self.violations.push(ConsistencyViolation {
                    new_excerpt: truncate_chars(candidate, EXCERPT_CHARS),
                    conflicting_excerpt: truncate_chars(earlier, EXCERPT_CHARS),
                    detected_at: Utc::now(),
                });
                return ConsistencyReport {
                    consistent: false,
                    offending: Some(earlier.clone()),
                };
            }
        }
        debug!(checked = history.len().min(self.window), "no self-contradiction found");
        ConsistencyReport::consistent()
    }

    /// All violations recorded since the last reset.
    pub fn violations(&self) -> &[ConsistencyViolation] {
        &self.violations
    }

    pub fn reset(&mut self) {
        self.violations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::MockOps;

    fn history(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_consistent_history() {
        let mut checker = ConsistencyChecker::default();
        let report = checker.check_against_history(
            "증세가 필요합니다",
            &history(&["복지 확대가 우선입니다"]),
            &MockOps::new(),
        );
        assert!(report.consistent);
        assert!(report.offending.is_none());
        assert!(checker.violations().is_empty());
    }

    #[test]
    fn test_contradiction_recorded() {
        let mut checker = ConsistencyChecker::default();
        let report = checker.check_against_history(
            "세금을 낮춰야 합니다",
            &history(&["세금을 올려야 합니다"]),
            &MockOps::contradictory(),
        );
        assert!(!report.consistent);
        assert_eq!(report.offending.as_deref(), Some("세금을 올려야 합니다"));
        assert_eq!(checker.violations().len(), 1);
        assert_eq!(checker.violations()[0].new_excerpt, "세금을 낮춰야 합니다");
    }

    #[test]
    fn test_short_circuits_on_first_hit() {
        // With a judge that flags everything, only one violation is
        // recorded per check.
        let mut checker = ConsistencyChecker::default();
        checker.check_against_history(
            "후보 발언",
            &history(&["발언 A", "발언 B", "발언 C"]),
            &MockOps::contradictory(),
        );
        assert_eq!(checker.violations().len(), 1);
        // Newest-first scan: the most recent statement is flagged.
        assert_eq!(checker.violations()[0].conflicting_excerpt, "발언 C");
    }

    #[test]
    fn test_window_limits_scan() {
        let mut checker = ConsistencyChecker::new(2);
        // The contradictory statement is outside the window of 2.
        struct SelectiveOps;
        impl LanguageOps for SelectiveOps {
            fn judge(
                &self,
                _candidate: &str,
                earlier: &str,
            ) -> Result<bool, crate::generator::GenerationError> {
                Ok(earlier == "오래된 발언")
            }
            fn summarize(
                &self,
                text: &str,
            ) -> Result<String, crate::generator::GenerationError> {
                Ok(text.to_string())
            }
            fn extract_topics(
                &self,
                _texts: &[String],
            ) -> Result<Vec<String>, crate::generator::GenerationError> {
                Ok(Vec::new())
            }
        }
        let report = checker.check_against_history(
            "후보 발언",
            &history(&["오래된 발언", "중간 발언", "최근 발언"]),
            &SelectiveOps,
        );
        assert!(report.consistent);
    }

    #[test]
    fn test_judge_failure_reads_as_consistent() {
        let mut checker = ConsistencyChecker::default();
        let report = checker.check_against_history(
            "후보 발언",
            &history(&["이전 발언"]),
            &MockOps::failing(),
        );
        assert!(report.consistent);
        assert!(checker.violations().is_empty());
    }

    #[test]
    fn test_empty_history_is_consistent() {
        let mut checker = ConsistencyChecker::default();
        let report =
            checker.check_against_history("첫 발언", &[], &MockOps::contradictory());
        assert!(report.consistent);
    }

    #[test]
    fn test_excerpts_are_bounded() {
        let mut checker = ConsistencyChecker::default();
        let long = "가".repeat(200);
        checker.check_against_history(&long, &history(&[&long]), &MockOps::contradictory());
        let v = &checker.violations()[0];
        assert!(v.new_excerpt.chars().count() <= EXCERPT_CHARS + 3);
        assert!(v.new_excerpt.ends_with("..."));
    }

    #[test]
    fn test_reset_clears_violations() {
        let mut checker = ConsistencyChecker::default();
        checker.check_against_history(
            "발언",
            &history(&["이전 발언"]),
            &MockOps::contradictory(),
        );
        assert_eq!(checker.violations().len(), 1);
        checker.reset();
        assert!(checker.violations().is_empty());
    }
}
