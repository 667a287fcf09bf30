//! Runner Module
//!
//! Pluggable scanner dispatch. Each runner wraps one external SAST tool and
//! expands a `ScanPlan` into pool tasks, one per target. Built-in runners
//! register themselves at compile time; the configuration selects which ones
//! run and in what order.

pub(crate) mod builtin;
pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod registry;
pub(crate) mod traits;

// Public API module - the only public interface for runners
pub mod api;

#[cfg(test)]
mod tests;
