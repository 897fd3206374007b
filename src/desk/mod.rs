//! Fee desk: statement loading and payment processing

pub mod core;
pub mod payment;
pub mod statement;

pub use self::core::*;
pub use payment::*;
pub use statement::*;
