//! CLI command implementations for unbound-collector.
//!
//! This module provides implementations for the default collection run and
//! all CLI subcommands:
//! - `collect`: Run unbound-control and print metrics (no subcommand)
//! - `config`: Configuration file generation
//! - `graphs`: Graph section listing
//! - `parse`: Parse a saved statistics dump

pub mod collect;
pub mod config;
pub mod graphs;
pub mod parse;

// Re-export command functions
pub use collect::command_collect;
pub use config::command_config;
pub use graphs::command_graphs;
pub use parse::command_parse;
