//! Generation record normalization
//!
//! Resolves every optional field of a stored generation to a concrete value
//! before any arithmetic happens, so the aggregator never sees an absent
//! number or an ambiguous model id.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{GenerationRecord, ModelKey};

/// A generation with all defaults applied, ready for grouping
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGeneration<'a> {
    pub date: NaiveDate,
    pub model: ModelKey,
    pub input: u64,
    pub output: u64,
    pub total: u64,
    pub cost: Decimal,
    pub trace_id: &'a str,
}

/// Normalize a generation record.
///
/// Returns `None` when the generation has no start time and so cannot be
/// placed on a day.
///
/// Defaults:
/// - missing input/output: 0
/// - missing total: input + output; a stored total is kept as-is
/// - missing cost: 0
/// - missing or empty model: `ModelKey::Unspecified`
pub fn normalize_generation(generation: &GenerationRecord) -> Option<NormalizedGeneration<'_>> {
    let Some(start_time) = generation.start_time else {
        tracing::debug!(
            generation_id = %generation.id,
            trace_id = %generation.trace_id,
            "generation has no start time, skipping"
        );
        return None;
    };

    let usage = generation.usage.as_ref();
    let input = usage.and_then(|u| u.input).unwrap_or(0);
    let output = usage.and_then(|u| u.output).unwrap_or(0);
    let total = usage
        .and_then(|u| u.total)
        .unwrap_or_else(|| input.saturating_add(output));

    Some(NormalizedGeneration {
        date: start_time.date_naive(),
        model: ModelKey::from_model(generation.model.as_deref()),
        input,
        output,
        total,
        cost: generation.cost().unwrap_or(Decimal::ZERO),
        trace_id: &generation.trace_id,
    })
}

/// Format a day key as `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
