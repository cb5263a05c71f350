//! Trust agent service
//!
//! Runs one monitor per hero metric, polls on a schedule and serves the
//! health, metrics and control API.

pub mod api;
pub mod config;
