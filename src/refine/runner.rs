//! RefinementLoop: drives worker -> critic -> validator rounds.
//!
//! Each round makes exactly three inference calls in order. The validator's
//! classified verdict is the only thing that ends a run early; every port
//! failure ends it immediately with no retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::prompts::{
    CRITIC_SYSTEM, VALIDATOR_SYSTEM, WORKER_SYSTEM, critic_prompt, initial_worker_prompt, revision_worker_prompt,
    validator_prompt,
};
use super::state::{LoopEvent, LoopReport, LoopState, Outcome, Round, Stage};
use super::verdict::{Verdict, classify};
use super::MAX_ROUNDS_LIMIT;
use crate::error::{Result, TriadError};
use crate::llm::{GenerateOptions, GenerateRequest, LlmClient, LlmError};

/// Configuration for the RefinementLoop.
#[derive(Debug, Clone)]
pub struct RefinementConfig {
    /// Model identifier passed on every call
    pub model: String,
    /// Sampling options passed on every call
    pub options: GenerateOptions,
    /// Upper bound on a single inference call
    pub call_timeout: Option<Duration>,
    /// Largest round limit a caller may ask for
    pub max_rounds_limit: u32,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            model: crate::llm::ollama::DEFAULT_MODEL.to_string(),
            options: GenerateOptions::default(),
            call_timeout: Some(Duration::from_secs(120)),
            max_rounds_limit: MAX_ROUNDS_LIMIT,
        }
    }
}

/// Why a stage did not produce text.
enum Interrupt {
    Cancelled,
    Failed(Stage, LlmError),
}

/// Optional sink for progress events. Sends never block.
struct Progress(Option<UnboundedSender<LoopEvent>>);

impl Progress {
    fn emit(&self, event: LoopEvent) {
        if let Some(tx) = &self.0 {
            // Observer may have gone away; the run carries on regardless
            let _ = tx.send(event);
        }
    }
}

/// Runs the three-role refinement loop against an inference port.
pub struct RefinementLoop {
    client: Arc<dyn LlmClient>,
    config: RefinementConfig,
}

impl RefinementLoop {
    pub fn new(client: Arc<dyn LlmClient>, config: RefinementConfig) -> Self {
        Self { client, config }
    }

    /// Check a run request, returning the trimmed task.
    pub fn validate<'a>(&self, task: &'a str, max_rounds: u32) -> Result<&'a str> {
        let task = task.trim();
        if task.is_empty() {
            return Err(TriadError::InvalidTask("task cannot be empty".to_string()));
        }
        if max_rounds == 0 || max_rounds > self.config.max_rounds_limit {
            return Err(TriadError::InvalidRounds {
                rounds: max_rounds,
                limit: self.config.max_rounds_limit,
            });
        }
        Ok(task)
    }

    /// Run to completion with no observer and no cancellation.
    pub async fn run(&self, task: &str, max_rounds: u32) -> Result<LoopReport> {
        self.run_with(task, max_rounds, &CancellationToken::new(), None).await
    }

    /// Run, publishing progress to `events` and honoring `cancel`.
    ///
    /// Returns `Err` only for invalid input, before any inference call.
    /// Inference failures and cancellation are reported through the outcome.
    pub async fn run_with(
        &self,
        task: &str,
        max_rounds: u32,
        cancel: &CancellationToken,
        events: Option<UnboundedSender<LoopEvent>>,
    ) -> Result<LoopReport> {
        let task = self.validate(task, max_rounds)?;

        let progress = Progress(events);
        let mut state = LoopState::new(task, max_rounds);
        info!("Starting refinement loop ({} rounds max): {}", max_rounds, task);

        let outcome = loop {
            let round = state.begin_round();
            info!("Round {}/{}", round, max_rounds);
            progress.emit(LoopEvent::RoundStarted { round, max_rounds });

            // 1. Produce
            let worker_prompt = match (state.current_artifact(), state.current_review()) {
                (Some(work), Some(review)) => revision_worker_prompt(task, work, review),
                _ => initial_worker_prompt(task),
            };
            let artifact = match self
                .call(round, Stage::Worker, worker_prompt, WORKER_SYSTEM, cancel, &progress)
                .await
            {
                Ok(text) => text,
                Err(interrupt) => break stopped(interrupt, &state),
            };
            state.set_artifact(artifact.clone());

            // 2. Review
            let review = match self
                .call(round, Stage::Critic, critic_prompt(task, &artifact), CRITIC_SYSTEM, cancel, &progress)
                .await
            {
                Ok(text) => text,
                Err(interrupt) => break stopped(interrupt, &state),
            };
            state.set_review(review.clone());

            // 3. Adjudicate
            let verdict_text = match self
                .call(
                    round,
                    Stage::Validator,
                    validator_prompt(task, &artifact, &review),
                    VALIDATOR_SYSTEM,
                    cancel,
                    &progress,
                )
                .await
            {
                Ok(text) => text,
                Err(interrupt) => break stopped(interrupt, &state),
            };

            // 4. Classify
            let verdict = classify(&verdict_text);
            match verdict {
                Verdict::Approved => info!("Round {} approved", round),
                Verdict::Rejected => info!("Round {} rejected", round),
                Verdict::Ambiguous => warn!("Round {} verdict ambiguous, treating as rejected", round),
            }

            // 5. Record
            let record = Round {
                round,
                artifact: artifact.clone(),
                review,
                verdict_text,
                verdict,
                timestamp: Utc::now(),
            };
            state.complete_round(record.clone());
            progress.emit(LoopEvent::RoundCompleted(record));

            // 6-8. Decide
            if verdict.is_approved() {
                break Outcome::Approved {
                    artifact,
                    rounds_used: round,
                };
            }
            if state.is_last_round() {
                info!("Maximum rounds ({}) reached without approval", max_rounds);
                break Outcome::Exhausted {
                    artifact,
                    rounds_used: max_rounds,
                };
            }
        };

        progress.emit(LoopEvent::Finished(outcome.clone()));
        Ok(state.into_report(outcome))
    }

    /// Make one inference call, racing it against cancellation.
    async fn call(
        &self,
        round: u32,
        stage: Stage,
        prompt: String,
        system: &str,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> std::result::Result<String, Interrupt> {
        if cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }

        progress.emit(LoopEvent::StageStarted { round, stage });
        debug!("Round {} {}: prompt is {} chars", round, stage, prompt.len());

        let request = GenerateRequest::new(&self.config.model, prompt)
            .with_system(system)
            .with_options(self.config.options.clone());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Interrupt::Cancelled),
            result = self.generate(request) => result,
        };

        match result {
            Ok(text) => {
                debug!("Round {} {}: response is {} chars", round, stage, text.len());
                progress.emit(LoopEvent::StageCompleted {
                    round,
                    stage,
                    output: text.clone(),
                });
                Ok(text)
            }
            Err(e) => {
                error!("Round {} {} failed: {}", round, stage, e);
                Err(Interrupt::Failed(stage, e))
            }
        }
    }

    async fn generate(&self, request: GenerateRequest) -> std::result::Result<String, LlmError> {
        match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.generate(request))
                .await
                .map_err(|_| LlmError::Timeout(limit.as_millis() as u64))?,
            None => self.client.generate(request).await,
        }
    }
}

fn stopped(interrupt: Interrupt, state: &LoopState) -> Outcome {
    let last_artifact = state.current_artifact().map(str::to_string);
    match interrupt {
        Interrupt::Cancelled => {
            info!("Loop cancelled after {} completed rounds", state.history().len());
            Outcome::Cancelled {
                rounds_completed: state.history().len() as u32,
                last_artifact,
            }
        }
        Interrupt::Failed(stage, e) => Outcome::Failed {
            stage,
            message: e.to_string(),
            last_artifact,
        },
    }
}
