//! Round records, loop state and outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::verdict::Verdict;

/// The three calls made in every round, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Worker,
    Critic,
    Validator,
}

impl Stage {
    /// Human-readable activity label used in progress messages
    pub fn activity(&self) -> &'static str {
        match self {
            Stage::Worker => "worker producing",
            Stage::Critic => "critic reviewing",
            Stage::Validator => "validator deciding",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Worker => "worker",
            Stage::Critic => "critic",
            Stage::Validator => "validator",
        };
        write!(f, "{}", s)
    }
}

/// One completed worker -> critic -> validator cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round: u32,
    pub artifact: String,
    pub review: String,
    pub verdict_text: String,
    pub verdict: Verdict,
    pub timestamp: DateTime<Utc>,
}

/// Mutable state carried across rounds of a single run.
#[derive(Debug, Clone)]
pub struct LoopState {
    task: String,
    max_rounds: u32,
    current_round: u32,
    current_artifact: Option<String>,
    current_review: Option<String>,
    history: Vec<Round>,
}

impl LoopState {
    pub fn new(task: impl Into<String>, max_rounds: u32) -> Self {
        Self {
            task: task.into(),
            max_rounds,
            current_round: 0,
            current_artifact: None,
            current_review: None,
            history: Vec::new(),
        }
    }

    /// Round in flight, or the last one started; 0 before the first round.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn current_artifact(&self) -> Option<&str> {
        self.current_artifact.as_deref()
    }

    pub fn current_review(&self) -> Option<&str> {
        self.current_review.as_deref()
    }

    pub fn history(&self) -> &[Round] {
        &self.history
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round >= self.max_rounds
    }

    pub(crate) fn begin_round(&mut self) -> u32 {
        self.current_round += 1;
        self.current_round
    }

    pub(crate) fn set_artifact(&mut self, artifact: String) {
        self.current_artifact = Some(artifact);
    }

    pub(crate) fn set_review(&mut self, review: String) {
        self.current_review = Some(review);
    }

    pub(crate) fn complete_round(&mut self, round: Round) {
        self.history.push(round);
    }

    pub(crate) fn into_report(self, outcome: Outcome) -> LoopReport {
        LoopReport {
            task: self.task,
            outcome,
            rounds: self.history,
        }
    }
}

/// Terminal result of a loop run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The validator approved the artifact of round `rounds_used`
    Approved { artifact: String, rounds_used: u32 },
    /// Every allowed round ran without approval
    Exhausted { artifact: String, rounds_used: u32 },
    /// An inference call failed; the run stopped at `stage`
    Failed {
        stage: Stage,
        message: String,
        last_artifact: Option<String>,
    },
    /// Stopped by an external cancellation signal
    Cancelled {
        rounds_completed: u32,
        last_artifact: Option<String>,
    },
}

impl Outcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Outcome::Approved { .. })
    }

    /// Most recent artifact produced, if any
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Outcome::Approved { artifact, .. } | Outcome::Exhausted { artifact, .. } => Some(artifact),
            Outcome::Failed { last_artifact, .. } | Outcome::Cancelled { last_artifact, .. } => {
                last_artifact.as_deref()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Approved { .. } => "approved",
            Outcome::Exhausted { .. } => "exhausted",
            Outcome::Failed { .. } => "failed",
            Outcome::Cancelled { .. } => "cancelled",
        }
    }
}

/// Everything a caller gets back from a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopReport {
    pub task: String,
    pub outcome: Outcome,
    pub rounds: Vec<Round>,
}

/// Progress notifications published while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    RoundStarted { round: u32, max_rounds: u32 },
    StageStarted { round: u32, stage: Stage },
    StageCompleted { round: u32, stage: Stage, output: String },
    RoundCompleted(Round),
    Finished(Outcome),
}
