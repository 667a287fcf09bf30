//! Scanner Component
//!
//! Batch orchestration for a set of repositories: the data model shared with
//! runners and the report, repository fetching, external command execution
//! and the phase-driving `ScanOrchestrator`.

pub mod error;
pub mod fetch;
pub mod manager;
pub mod process;
pub mod types;

// Public API module - the preferred interface for the scanner
pub mod api;

#[cfg(test)]
mod tests;
