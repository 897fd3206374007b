//! Utility modules

pub mod format;
pub mod memory_backend;
pub mod validation;

pub use format::*;
pub use memory_backend::*;
pub use validation::*;
