//! Core library modules for routedrift
//!
//! This module contains the internal implementation details of the routedrift
//! library.

pub mod address;
pub mod classifier;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod routing;
pub mod signature;
pub mod spatial;

// Re-export main types for internal use
pub use classifier::{ClassifierConfig, InstabilityZone, Severity};
pub use pipeline::{analyze, AnalysisOptions, AnalysisReport, RunStats};
