//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: refine a task in the console
//! - serve: start the web front end
//! - models: list models the backend can serve
//! - check: test the backend connection
//! - samples: list the built-in sample tasks

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Triad - worker, critic and validator refining a task over a local LLM
#[derive(Parser, Debug)]
#[command(name = "triad")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refine a task in the console (prompts for one when omitted)
    Run {
        /// Task description
        task: Option<String>,

        /// Use a built-in sample task (1-based)
        #[arg(short, long, conflicts_with = "task")]
        sample: Option<usize>,

        /// Maximum number of rounds
        #[arg(short = 'r', long)]
        max_rounds: Option<u32>,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start the web front end
    Serve {
        /// Address to bind, e.g. 127.0.0.1:5000
        #[arg(short, long)]
        bind: Option<String>,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List models available on the backend
    Models,

    /// Check the backend is reachable
    Check,

    /// List the built-in sample tasks
    Samples,
}
