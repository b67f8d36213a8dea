//! Daily metrics report types

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// Grouping key for a model row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKey {
    Named(String),
    /// The generation carried no model; serialized as JSON `null`
    Unspecified,
}

impl ModelKey {
    /// Empty or missing model ids map to `Unspecified`
    pub fn from_model(model: Option<&str>) -> Self {
        match model {
            Some(m) if !m.is_empty() => Self::Named(m.to_string()),
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Named(m) => Some(m),
            Self::Unspecified => None,
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(m) => f.write_str(m),
            Self::Unspecified => f.write_str("(no model)"),
        }
    }
}

impl Serialize for ModelKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Named(m) => serializer.serialize_str(m),
            Self::Unspecified => serializer.serialize_none(),
        }
    }
}

/// Usage of one model within one day
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsageRow {
    pub model: ModelKey,
    pub input_usage: u64,
    pub output_usage: u64,
    pub total_usage: u64,
    pub count_observations: u64,
    pub count_traces: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
}

/// One day of the report
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    /// UTC day, `YYYY-MM-DD`
    pub date: String,
    pub count_traces: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    pub usage: Vec<ModelUsageRow>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

/// A window of the descending day list plus paging metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyMetricsPage {
    pub data: Vec<DailyMetrics>,
    pub meta: PageMeta,
}
