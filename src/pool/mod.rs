//! Worker Pool Module
//!
//! Bounded-concurrency task execution shared by the fetch phase and every
//! runner. At most `capacity` tasks execute at once; `submit` waits for a free
//! slot, `join_all` is the phase barrier, `cancel_all` is the hard stop.

pub(crate) mod error;
pub(crate) mod manager;
pub(crate) mod task;

// Public API module - the only public interface for the pool
pub mod api;

#[cfg(test)]
mod tests;
