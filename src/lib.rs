//! Triad - a worker, critic and validator refinement loop over a local LLM
//!
//! A worker model drafts an answer to a task, a critic model reviews it and a
//! validator model approves or rejects it. Rejected work is revised with the
//! critic's feedback until it is approved or the round limit is reached.

pub mod config;
pub mod error;
pub mod id;
pub mod llm;
pub mod refine;
pub mod server;
pub mod session;

pub use error::{Result, TriadError};
