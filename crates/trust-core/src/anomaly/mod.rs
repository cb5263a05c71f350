//! Ensemble anomaly detection
//!
//! This module provides:
//! - Population statistics and row duplication analysis
//! - The nine-detector signal bank
//! - Category-weighted ensemble scoring with persistence
//! - The SAFE / WARNING / LOCKED verdict and its fingerprint

mod detectors;
mod duplicates;
mod ensemble;
mod fingerprint;
mod persistence;
mod registry;
mod statistics;
mod verdict;

pub use detectors::{DetectionInput, DetectorBank};
pub use duplicates::{analyze_duplicates, row_fingerprint};
pub use ensemble::{score_signals, EnsembleScore};
pub use fingerprint::{explanation, generate_fingerprint, primary_signal};
pub use persistence::PersistenceTracker;
pub use registry::DetectorSpec;
pub use statistics::compute_statistics;
pub use verdict::{classify, summary_message, Verdict};
