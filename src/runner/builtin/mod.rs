//! Built-in scanner runners
//!
//! Each runner drives one containerised SAST tool and registers itself with
//! the `runner!` macro.

pub mod api;
pub mod container;

pub mod codeql;
pub mod horusec;
pub mod semgrep;
pub mod snyk;
pub mod sonarqube;
pub mod trivy;
