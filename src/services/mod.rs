//! Services for record loading, normalization and aggregation

pub mod aggregator;
pub mod data_loader;
pub mod grouping;
pub mod metrics;
pub mod normalizer;

pub use aggregator::Aggregator;
pub use data_loader::DataLoaderService;
pub use metrics::daily_metrics;
pub use normalizer::{day_key, normalize_generation, NormalizedGeneration};
