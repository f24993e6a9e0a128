//! Pluggable strategies consulted while building triggers.

mod comparer;
mod optimizer;

pub use comparer::*;
pub use optimizer::*;
