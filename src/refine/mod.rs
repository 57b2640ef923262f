//! Worker -> critic -> validator refinement loop.
//!
//! Every round:
//!
//! 1. **Worker** - produces (or revises) the artifact
//! 2. **Critic** - reviews the artifact
//! 3. **Validator** - answers `APPROVED: ...` or `REJECTED: ...`
//!
//! The validator's answer is classified by keyword scan; approval ends the
//! run, anything else carries the artifact and review into the next round
//! until the round limit is reached.

mod prompts;
mod runner;
mod state;
pub mod verdict;

pub use prompts::{
    CRITIC_SYSTEM, VALIDATOR_SYSTEM, WORKER_SYSTEM, critic_prompt, initial_worker_prompt, revision_worker_prompt,
    validator_prompt,
};
pub use runner::{RefinementConfig, RefinementLoop};
pub use state::{LoopEvent, LoopReport, LoopState, Outcome, Round, Stage};
pub use verdict::{Verdict, classify};

/// Round limit used when the caller does not pick one.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Default ceiling on the round limit a caller may request.
pub const MAX_ROUNDS_LIMIT: u32 = 20;
