//! Income statistics over the full patient set.

mod aggregator;
mod labels;

pub use aggregator::*;
pub use labels::*;
