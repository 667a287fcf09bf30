//! Test modules for argument parsing and configuration
