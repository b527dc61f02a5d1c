//! Turn-by-turn debate driver.
//!
//! Owns the session state, the shared evidence ledger, and both sides'
//! histories. Sequencing violations (wrong phase, wrong side, rounds
//! exhausted) are hard errors; everything downstream of a correctly
//! sequenced turn is soft — generation failures fall back to a stock
//! statement, evidence conflicts get exactly one regeneration attempt
//! and are then accepted, and consistency findings are recorded but
//! never enforced. A debate that starts always reaches its conclusion.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consistency::{ConsistencyChecker, ConsistencyViolation};
use crate::evidence::{EvidenceLedger, LedgerStats};
use crate::generator::GenerationError;
use crate::memory::{MemoryConfig, MemoryEntry, StatementMemoryManager};
use crate::ops::LanguageOps;
use crate::state::{DebatePhase, DebateState, Stance, StatementRecord, TransitionError};

/// Session limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub max_rounds: u32,
    /// How many of a side's recent statements the consistency audit
    /// compares against.
    pub history_window: usize,
    pub memory: MemoryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            history_window: 4,
            memory: MemoryConfig::default(),
        }
    }
}

/// Everything a statement provider sees for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnContext {
    pub topic: String,
    pub round: u32,
    pub stance: Stance,
    /// The opponent's most recent statement, if any.
    pub opponent_statement: Option<String>,
    /// Compacted view of this side's own statement history.
    pub memory_digest: Vec<MemoryEntry>,
    /// Set only on a regeneration attempt after an evidence conflict.
    pub conflict_warning: Option<String>,
}

/// Produces one side's statement for a turn.
pub trait StatementProvider {
    fn propose(&mut self, context: &TurnContext) -> Result<String, GenerationError>;
}

/// What happened during one committed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub stance: Stance,
    pub round: u32,
    /// The accepted statement text.
    pub text: String,
    /// Whether an evidence conflict forced a regeneration.
    pub regenerated: bool,
    /// Conflicts remaining in the accepted statement.
    pub conflicts: usize,
    /// Whether the accepted statement passed the self-consistency audit.
    pub consistent: bool,
}

/// A side's recorded self-contradictions, for the final outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceViolations {
    pub stance: Stance,
    pub violations: Vec<ConsistencyViolation>,
}

/// Final report for a concluded debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateOutcome {
    pub topic: String,
    pub rounds_completed: u32,
    pub transcript: Vec<StatementRecord>,
    /// Generator-produced closing summary (or a stock fallback line).
    pub closing_summary: String,
    pub violations: Vec<StanceViolations>,
    pub ledger: LedgerStats,
}

/// Sequencing errors. These are the only hard failures the driver emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebateError {
    TransitionFailed(TransitionError),
    /// A turn was requested outside an active round.
    NotInRound,
    /// A side tried to speak out of turn.
    OutOfTurn { expected: Stance, got: Stance },
    /// All configured rounds have been played.
    RoundsExhausted { max_rounds: u32 },
}

impl std::fmt::Display for DebateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransitionFailed(e) => write!(f, "{}", e),
            Self::NotInRound => write!(f, "no active round"),
            Self::OutOfTurn { expected, got } => {
                write!(f, "out of turn: expected {}, got {}", expected, got)
            }
            Self::RoundsExhausted { max_rounds } => {
                write!(f, "all {} rounds have been played", max_rounds)
            }
        }
    }
}

impl std::error::Error for DebateError {}

impl From<TransitionError> for DebateError {
    fn from(e: TransitionError) -> Self {
        Self::TransitionFailed(e)
    }
}

/// Per-side mutable state. `Default` so it can be `mem::take`n while a
/// turn borrows the ops handle.
#[derive(Default)]
struct SideState {
    history: Vec<String>,
    memory_digest: Vec<MemoryEntry>,
    checker: ConsistencyChecker,
}

/// The debate driver. One instance per session; reusable via `start`.
pub struct DebateOrchestrator {
    config: OrchestratorConfig,
    phase: DebatePhase,
    state: DebateState,
    ledger: EvidenceLedger,
    ops: Box<dyn LanguageOps>,
    memory_manager: StatementMemoryManager,
    progressive: SideState,
    conservative: SideState,
    next_stance: Stance,
}

impl DebateOrchestrator {
    pub fn new(ops: Box<dyn LanguageOps>) -> Self {
        Self::with_config(ops, OrchestratorConfig::default())
    }

    pub fn with_config(ops: Box<dyn LanguageOps>, config: OrchestratorConfig) -> Self {
        Self {
            config,
            phase: DebatePhase::NotStarted,
            state: DebateState::new("", config.max_rounds),
            ledger: EvidenceLedger::new(),
            ops,
            memory_manager: StatementMemoryManager::with_config(config.memory),
            progressive: SideState::default(),
            conservative: SideState::default(),
            next_stance: Stance::Progressive,
        }
    }

    pub fn phase(&self) -> DebatePhase {
        self.phase
    }

    pub fn state(&self) -> &DebateState {
        &self.state
    }

    pub fn ledger(&self) -> &EvidenceLedger {
        &self.ledger
    }

    /// Begin a session on `topic`, clearing all per-session state.
    /// 진보 always opens.
    pub fn start(&mut self, topic: &str) -> Result<(), DebateError> {
        self.transition(DebatePhase::InRound)?;
        self.state.reset(topic);
        self.state.max_rounds = self.config.max_rounds;
        self.ledger.reset();
        self.progressive = self.fresh_side();
        self.conservative = self.fresh_side();
        self.next_stance = Stance::Progressive;
        info!(topic, max_rounds = self.config.max_rounds, "debate started");
        Ok(())
    }

    /// Play one turn for `stance`. Errors only on sequencing violations;
    /// a correctly sequenced turn always commits a statement.
    pub fn run_turn(
        &mut self,
        stance: Stance,
        provider: &mut dyn StatementProvider,
    ) -> Result<TurnOutcome, DebateError> {
        if self.phase != DebatePhase::InRound {
            return Err(DebateError::NotInRound);
        }
        if stance != self.next_stance {
            return Err(DebateError::OutOfTurn {
                expected: self.next_stance,
                got: stance,
            });
        }
        if stance == Stance::Progressive {
            if self.state.round_number >= self.config.max_rounds {
                return Err(DebateError::RoundsExhausted {
                    max_rounds: self.config.max_rounds,
                });
            }
            self.state.round_number += 1;
        }
        let round = self.state.round_number;

        let mut context = TurnContext {
            topic: self.state.topic.clone(),
            round,
            stance,
            opponent_statement: self
                .state
                .last_statement_by(stance.opposing())
                .map(|s| s.text.clone()),
            memory_digest: self.side(stance).memory_digest.clone(),
            conflict_warning: None,
        };

        let mut text = self.propose_or_fallback(provider, &context);
        let mut regenerated = false;
        let first_report = self.ledger.check_conflict(&text, stance);
        if first_report.has_conflict() {
            warn!(
                stance = %stance,
                round,
                conflicts = first_report.conflicts.len(),
                "evidence conflict; requesting one regeneration"
            );
            context.conflict_warning = Some(first_report.warning_text());
            match provider.propose(&context) {
                Ok(second) if !second.trim().is_empty() => {
                    text = second.trim().to_string();
                    regenerated = true;
                }
                Ok(_) => {
                    warn!(stance = %stance, "empty regeneration; keeping first statement");
                }
                Err(e) => {
                    warn!(stance = %stance, error = %e, "regeneration failed; keeping first statement");
                }
            }
        }

        // Accepted unconditionally past this point: at most one retry,
        // and the debate never halts on content grounds.
        let final_report = self.ledger.check_conflict(&text, stance);
        if final_report.has_conflict() {
            warn!(
                stance = %stance,
                round,
                conflicts = final_report.conflicts.len(),
                "accepting statement with unresolved evidence conflicts"
            );
        }

        let mut side = std::mem::take(self.side_mut(stance));
        let report = side
            .checker
            .check_against_history(&text, &side.history, &*self.ops);

        self.state.push_statement(round, stance, &text);
        self.ledger.record(&text, stance);
        side.history.push(text.clone());
        side.memory_digest = self.memory_manager.manage(&side.history, &*self.ops);
        *self.side_mut(stance) = side;

        self.next_stance = stance.opposing();
        info!(stance = %stance, round, regenerated, "turn committed");
        Ok(TurnOutcome {
            stance,
            round,
            text,
            regenerated,
            conflicts: final_report.conflicts.len(),
            consistent: report.consistent,
        })
    }

    /// Play one full round: 진보 then 보수.
    pub fn run_round(
        &mut self,
        progressive: &mut dyn StatementProvider,
        conservative: &mut dyn StatementProvider,
    ) -> Result<(TurnOutcome, TurnOutcome), DebateError> {
        let first = self.run_turn(Stance::Progressive, progressive)?;
        let second = self.run_turn(Stance::Conservative, conservative)?;
        Ok((first, second))
    }

    /// End the session and produce the final report.
    pub fn conclude(&mut self) -> Result<DebateOutcome, DebateError> {
        self.transition(DebatePhase::Concluded)?;
        let closing_summary = match self.ops.summarize(&self.state.transcript()) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "closing summary failed; using fallback");
                "요약을 생성하지 못했습니다.".to_string()
            }
        };
        let outcome = DebateOutcome {
            topic: self.state.topic.clone(),
            rounds_completed: self.state.round_number,
            transcript: self.state.statements.clone(),
            closing_summary,
            violations: vec![
                StanceViolations {
                    stance: Stance::Progressive,
                    violations: self.progressive.checker.violations().to_vec(),
                },
                StanceViolations {
                    stance: Stance::Conservative,
                    violations: self.conservative.checker.violations().to_vec(),
                },
            ],
            ledger: self.ledger.stats(),
        };
        info!(
            rounds = outcome.rounds_completed,
            statements = outcome.transcript.len(),
            "debate concluded"
        );
        Ok(outcome)
    }

    fn transition(&mut self, to: DebatePhase) -> Result<(), DebateError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            }
            .into());
        }
        self.phase = to;
        Ok(())
    }

    fn propose_or_fallback(
        &self,
        provider: &mut dyn StatementProvider,
        context: &TurnContext,
    ) -> String {
        match provider.propose(context) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(stance = %context.stance, "empty proposal; using fallback statement");
                self.fallback_statement(context.stance)
            }
            Err(e) => {
                warn!(stance = %context.stance, error = %e, "proposal failed; using fallback statement");
                self.fallback_statement(context.stance)
            }
        }
    }

    fn fallback_statement(&self, stance: Stance) -> String {
        format!(
            "{} 측은 기존 입장을 유지하며, 다음 발언에서 논거를 보강하겠습니다.",
            stance.label()
        )
    }

    fn fresh_side(&self) -> SideState {
        SideState {
            history: Vec::new(),
            memory_digest: Vec::new(),
            checker: ConsistencyChecker::new(self.config.history_window),
        }
    }

    fn side(&self, stance: Stance) -> &SideState {
        match stance {
            Stance::Progressive => &self.progressive,
            Stance::Conservative => &self.conservative,
        }
    }

    fn side_mut(&mut self, stance: Stance) -> &mut SideState {
        match stance {
            Stance::Progressive => &mut self.progressive,
            Stance::Conservative => &mut self.conservative,
        }
    }
}
