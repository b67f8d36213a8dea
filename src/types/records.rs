//! Stored trace and generation records, as exported by the ingestion path

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::IntegrityError;

/// Top-level recorded execution unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub id: String,
    /// Creation time; buckets the trace only when it has no dated generation
    pub timestamp: DateTime<Utc>,
    pub project_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Token counts as stored; any field may be missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageBlock {
    #[serde(default)]
    pub input: Option<u64>,
    #[serde(default)]
    pub output: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
}

/// A model invocation recorded under a trace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: String,
    pub trace_id: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Authoritative for day bucketing
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage: Option<UsageBlock>,
    #[serde(default, alias = "calculatedTotalCost")]
    pub total_cost: Option<Decimal>,
}

impl GenerationRecord {
    /// Stored cost: the generation's own field wins over `usage.totalCost`
    pub fn cost(&self) -> Option<Decimal> {
        self.total_cost
            .or_else(|| self.usage.as_ref().and_then(|u| u.total_cost))
    }
}

/// A materialized, already-scoped collection of traces and their generations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordSet {
    #[serde(default)]
    pub traces: Vec<TraceRecord>,
    #[serde(default)]
    pub generations: Vec<GenerationRecord>,
}

impl RecordSet {
    pub fn new(traces: Vec<TraceRecord>, generations: Vec<GenerationRecord>) -> Self {
        Self {
            traces,
            generations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty() && self.generations.is_empty()
    }

    /// Append another set, keeping supplied order
    pub fn extend(&mut self, other: RecordSet) {
        self.traces.extend(other.traces);
        self.generations.extend(other.generations);
    }

    /// Check identifier uniqueness and that every generation's trace is present.
    pub fn validate(&self) -> std::result::Result<(), IntegrityError> {
        let mut trace_ids: HashSet<&str> = HashSet::with_capacity(self.traces.len());
        for trace in &self.traces {
            if !trace_ids.insert(trace.id.as_str()) {
                return Err(IntegrityError::DuplicateTrace(trace.id.clone()));
            }
        }

        let mut generation_ids: HashSet<&str> = HashSet::with_capacity(self.generations.len());
        for generation in &self.generations {
            if !generation_ids.insert(generation.id.as_str()) {
                return Err(IntegrityError::DuplicateGeneration(generation.id.clone()));
            }
            if !trace_ids.contains(generation.trace_id.as_str()) {
                return Err(IntegrityError::UnknownTrace {
                    generation_id: generation.id.clone(),
                    trace_id: generation.trace_id.clone(),
                });
            }
        }

        Ok(())
    }
}
