//! CLI module for triad - command-line interface and console output.

pub mod commands;
pub mod printer;
pub mod samples;

pub use commands::Cli;
