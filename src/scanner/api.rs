//! Scanner API
//!
//! This module provides the public API for the scanner system, consolidating all external
//! exports and providing a controlled interface for accessing scanner functionality.
//!
//! This follows the same pattern as the pool::api and runner::api modules to maintain
//! consistent architecture across the application.

// Orchestration
pub use crate::scanner::manager::{BatchSummary, Phase, RunnerSummary, ScanOptions, ScanOrchestrator};

// Error handling
pub use crate::scanner::error::{ScanError, ScanResult};

// Fetching and process execution
pub use crate::scanner::fetch::{Fetcher, GitFetcher};
pub use crate::scanner::process::CommandSpec;

// Core data types and structures
pub use crate::scanner::types::{
    repository_name, ScanPlan, ScanTarget, VulnerabilityClass, WorkspaceLayout,
};
