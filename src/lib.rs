pub mod app;
pub mod core;
pub mod pool;
pub mod report;
pub mod runner;
pub mod scanner;
