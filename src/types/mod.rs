//! Type definitions for tracemeter

mod error;
mod query;
mod records;
mod report;

pub use error::*;
pub use query::*;
pub use records::*;
pub use report::*;
