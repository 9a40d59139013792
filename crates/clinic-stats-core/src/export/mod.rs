//! Export of computed statistics.

mod customers;

pub use customers::*;
