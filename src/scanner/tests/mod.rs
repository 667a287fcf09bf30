//! Test modules for the scanner system
//!
//! This module organizes the test suites for the scanner system,
//! including orchestrator tests and types tests.

pub mod types;
