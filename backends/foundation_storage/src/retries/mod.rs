//! Backoff policies for sequential request retries.

mod core;
mod exponential;
mod same;

pub use self::core::*;
pub use exponential::*;
pub use same::*;
