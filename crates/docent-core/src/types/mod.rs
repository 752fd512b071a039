//! Core types for docent.

mod candidate;
mod chunk;
mod filter;

pub use candidate::*;
pub use chunk::*;
pub use filter::*;
