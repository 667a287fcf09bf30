//! Report Module
//!
//! Folds the per-tool result tree into one `AggregationTree` and renders it:
//! HTML through a tera template, JSON through serde and a console summary
//! table.
//!
//! ```text
//! {results}/{tool}/{class}/{language}/{repository}/*.sarif
//!                          │
//!                          ▼
//!        language → repository → class → tool → [Finding]
//! ```

pub(crate) mod aggregator;
pub(crate) mod error;
pub(crate) mod finding;
pub(crate) mod render;
pub(crate) mod sarif;
pub(crate) mod summary;

// Public API module - the only public interface for reporting
pub mod api;

#[cfg(test)]
mod tests;
