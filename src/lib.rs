//! Daily token usage and cost rollups over stored traces and generations.
//!
//! ```
//! use tracemeter::services::Aggregator;
//! use tracemeter::types::RecordSet;
//!
//! let days = Aggregator::daily(&RecordSet::default()).unwrap();
//! assert!(days.is_empty());
//! ```

pub mod config;
pub mod services;
pub mod types;
