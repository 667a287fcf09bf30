//! Scanner integration test modules

pub mod pipeline;
pub mod pool;
