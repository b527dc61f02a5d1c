//! Debate state — stances, session phases, and the statement transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two fixed debate sides.
///
/// A partition key for the evidence ledger and statement memory,
/// never a behavior hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// 진보 side.
    Progressive,
    /// 보수 side.
    Conservative,
}

impl Stance {
    /// The opposing side.
    pub fn opposing(self) -> Self {
        match self {
            Self::Progressive => Self::Conservative,
            Self::Conservative => Self::Progressive,
        }
    }

    /// Korean label used in prompts and transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Progressive => "진보",
            Self::Conservative => "보수",
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progressive => write!(f, "progressive"),
            Self::Conservative => write!(f, "conservative"),
        }
    }
}

/// Phase of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebatePhase {
    /// Session created but not started.
    NotStarted,
    /// Turns are being exchanged.
    InRound,
    /// Debate concluded — the transcript is frozen.
    Concluded,
}

impl DebatePhase {
    /// Valid transitions from this phase.
    ///
    /// `Concluded → InRound` is allowed so a session object can be
    /// reused: `start` resets all per-session state first.
    pub fn valid_transitions(self) -> &'static [DebatePhase] {
        match self {
            Self::NotStarted => &[Self::InRound],
            Self::InRound => &[Self::Concluded],
            Self::Concluded => &[Self::InRound],
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InRound => write!(f, "in_round"),
            Self::Concluded => write!(f, "concluded"),
        }
    }
}

/// Error for invalid phase transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {} (allowed: {:?})",
            self.from,
            self.to,
            self.from.valid_transitions()
        )
    }
}

impl std::error::Error for TransitionError {}

/// One accepted statement in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRecord {
    /// Round number (1-indexed).
    pub round: u32,
    /// Which side spoke.
    pub stance: Stance,
    /// The accepted statement text.
    pub text: String,
    /// When the statement was committed.
    pub timestamp: DateTime<Utc>,
}

/// Per-session debate state.
///
/// Created at debate start, mutated by the orchestrator only, read by
/// both agents, reset between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateState {
    /// Topic under debate.
    pub topic: String,
    /// Current round number (0 before the first turn).
    pub round_number: u32,
    /// Maximum rounds for this session.
    pub max_rounds: u32,
    /// Ordered transcript of accepted statements.
    pub statements: Vec<StatementRecord>,
}

impl DebateState {
    /// Create a fresh state for a topic.
    pub fn new(topic: &str, max_rounds: u32) -> Self {
        Self {
            topic: topic.to_string(),
            round_number: 0,
            max_rounds,
            statements: Vec::new(),
        }
    }

    /// Clear the transcript and rebind to a new topic.
    pub fn reset(&mut self, topic: &str) {
        self.topic = topic.to_string();
        self.round_number = 0;
        self.statements.clear();
    }

    /// Append an accepted statement to the transcript.
    pub fn push_statement(&mut self, round: u32, stance: Stance, text: &str) {
        self.statements.push(StatementRecord {
            round,
            stance,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// The most recent statement by a given stance, if any.
    pub fn last_statement_by(&self, stance: Stance) -> Option<&StatementRecord> {
        self.statements.iter().rev().find(|s| s.stance == stance)
    }

    /// All statement texts by a given stance, in order.
    pub fn statements_by(&self, stance: Stance) -> Vec<String> {
        self.statements
            .iter()
            .filter(|s| s.stance == stance)
            .map(|s| s.text.clone())
            .collect()
    }

    /// Plain-text transcript, one line per statement.
    pub fn transcript(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("[라운드 {} | {}] {}", s.round, s.stance.label(), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
