//! CLI integration test modules

pub mod run;
