//! CLI module containing argument parsing and configuration loading

pub mod api;
pub mod args;
pub mod config;

#[cfg(test)]
mod tests;
