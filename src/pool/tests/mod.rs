//! Test modules for the worker pool

mod cancellation;
mod summary;
