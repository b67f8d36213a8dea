//! Daily metrics query parameters and their validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Result, TracemeterError};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 50;

/// Record filters and paging for a daily metrics request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsQuery {
    pub page: u32,
    pub limit: u32,
    pub trace_name: Option<String>,
    pub user_id: Option<String>,
    /// A trace must carry every listed tag
    pub tags: Vec<String>,
    pub project_id: Option<String>,
    /// Inclusive
    pub from_timestamp: Option<DateTime<Utc>>,
    /// Exclusive
    pub to_timestamp: Option<DateTime<Utc>>,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            trace_name: None,
            user_id: None,
            tags: Vec::new(),
            project_id: None,
            from_timestamp: None,
            to_timestamp: None,
        }
    }
}

impl MetricsQuery {
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(TracemeterError::InvalidQuery("page starts at 1".into()));
        }
        if self.limit == 0 {
            return Err(TracemeterError::InvalidQuery("limit must be at least 1".into()));
        }
        if let (Some(from), Some(to)) = (self.from_timestamp, self.to_timestamp) {
            if from >= to {
                return Err(TracemeterError::InvalidQuery(format!(
                    "fromTimestamp {} is not before toTimestamp {}",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }
        }
        Ok(())
    }

    /// Whether `ts` falls in `[from, to)`
    pub fn in_range(&self, ts: DateTime<Utc>) -> bool {
        self.from_timestamp.is_none_or(|from| ts >= from)
            && self.to_timestamp.is_none_or(|to| ts < to)
    }

    pub fn has_time_range(&self) -> bool {
        self.from_timestamp.is_some() || self.to_timestamp.is_some()
    }
}
