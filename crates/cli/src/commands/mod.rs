//! Subcommand implementations

pub mod control;
pub mod monitors;
