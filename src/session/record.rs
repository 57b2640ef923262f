//! Session record: the pollable view of one background run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::refine::{LoopEvent, Outcome, Round, Stage};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// Result attached to a session once its run has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub approved: bool,
    /// approved, exhausted, failed or cancelled
    pub outcome: String,
    pub rounds_used: u32,
    /// Latest artifact, even when the run did not finish cleanly
    pub final_work: Option<String>,
    pub completion_time: DateTime<Utc>,
}

/// Full state of a session as returned to pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub task: String,
    pub status: SessionStatus,
    /// e.g. "Round 2 - critic reviewing"
    pub status_message: String,
    pub current_round: u32,
    pub current_stage: Option<Stage>,
    pub max_rounds: u32,
    pub rounds: Vec<Round>,
    pub final_result: Option<FinalResult>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, task: impl Into<String>, max_rounds: u32) -> Self {
        Self {
            session_id: session_id.into(),
            task: task.into(),
            status: SessionStatus::Running,
            status_message: "Starting".to_string(),
            current_round: 0,
            current_stage: None,
            max_rounds,
            rounds: Vec::new(),
            final_result: None,
            error: None,
            start_time: Utc::now(),
        }
    }

    /// Fold a progress event into the record.
    pub fn apply(&mut self, event: &LoopEvent) {
        match event {
            LoopEvent::RoundStarted { round, .. } => {
                self.current_round = *round;
                self.current_stage = None;
                self.status_message = format!("Round {}", round);
            }
            LoopEvent::StageStarted { round, stage } => {
                self.current_round = *round;
                self.current_stage = Some(*stage);
                self.status_message = format!("Round {} - {}", round, stage.activity());
            }
            LoopEvent::StageCompleted { .. } => {}
            LoopEvent::RoundCompleted(round) => {
                self.current_stage = None;
                self.rounds.push(round.clone());
            }
            LoopEvent::Finished(outcome) => self.finish(outcome),
        }
    }

    /// Move to the terminal state matching `outcome`.
    pub fn finish(&mut self, outcome: &Outcome) {
        let (status, rounds_used) = match outcome {
            Outcome::Approved { rounds_used, .. } | Outcome::Exhausted { rounds_used, .. } => {
                (SessionStatus::Completed, *rounds_used)
            }
            Outcome::Failed { stage, message, .. } => {
                self.error = Some(format!("{} failed: {}", stage, message));
                (SessionStatus::Failed, self.rounds.len() as u32)
            }
            Outcome::Cancelled { rounds_completed, .. } => (SessionStatus::Cancelled, *rounds_completed),
        };

        self.status = status;
        self.current_stage = None;
        self.status_message = match outcome {
            Outcome::Approved { rounds_used, .. } => format!("Approved after {} round(s)", rounds_used),
            Outcome::Exhausted { rounds_used, .. } => format!("Maximum rounds ({}) reached", rounds_used),
            Outcome::Failed { stage, .. } => format!("Round {} - {} failed", self.current_round, stage),
            Outcome::Cancelled { .. } => "Cancelled".to_string(),
        };
        self.final_result = Some(FinalResult {
            approved: outcome.is_approved(),
            outcome: outcome.label().to_string(),
            rounds_used,
            final_work: outcome.artifact().map(str::to_string),
            completion_time: Utc::now(),
        });
    }

    /// Mark the session failed before the loop produced an outcome.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.current_stage = None;
        self.status_message = "Failed".to_string();
        self.error = Some(error.into());
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            task: self.task.clone(),
            status: self.status,
            current_round: self.current_round,
            max_rounds: self.max_rounds,
            start_time: self.start_time,
        }
    }
}

/// Short listing entry for `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub task: String,
    pub status: SessionStatus,
    pub current_round: u32,
    pub max_rounds: u32,
    pub start_time: DateTime<Utc>,
}
