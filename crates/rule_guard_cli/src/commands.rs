//! Command implementations for the RuleGuard CLI.
//!
//! Each submodule carries one subcommand: its clap argument struct and the
//! `execute` entry point called from `main`.

pub mod docs_cmd;
pub mod validate_cmd;
