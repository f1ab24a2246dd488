//! Subcommand implementations.

pub mod classify;
pub mod resolve;
