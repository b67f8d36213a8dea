//! Daily metrics queries: record filters, aggregation and paging

use std::collections::HashSet;

use super::Aggregator;
use crate::types::{
    DailyMetrics, DailyMetricsPage, GenerationRecord, MetricsQuery, PageMeta, RecordSet, Result,
    TraceRecord,
};

/// Run a daily metrics query over a record set.
///
/// The whole set is validated first, so an integrity error surfaces even when
/// the offending records would be filtered out.
pub fn daily_metrics(records: &RecordSet, query: &MetricsQuery) -> Result<DailyMetricsPage> {
    query.validate()?;
    records.validate()?;

    let (traces, generations) = select_records(records, query);
    tracing::debug!(
        traces = traces.len(),
        generations = generations.len(),
        "records selected for daily metrics"
    );

    let days = Aggregator::aggregate(traces, generations);
    Ok(paginate(days, query.page, query.limit))
}

fn trace_matches(trace: &TraceRecord, query: &MetricsQuery) -> bool {
    let eq = |want: &Option<String>, have: &Option<String>| {
        want.as_ref().is_none_or(|w| have.as_deref() == Some(w.as_str()))
    };

    eq(&query.trace_name, &trace.name)
        && eq(&query.user_id, &trace.user_id)
        && query
            .project_id
            .as_ref()
            .is_none_or(|p| &trace.project_id == p)
        && query.tags.iter().all(|tag| trace.tags.contains(tag))
}

/// Apply trace filters and the time range, keeping supplied order.
fn select_records<'a>(
    records: &'a RecordSet,
    query: &MetricsQuery,
) -> (Vec<&'a TraceRecord>, Vec<&'a GenerationRecord>) {
    let kept: HashSet<&str> = records
        .traces
        .iter()
        .filter(|t| trace_matches(t, query))
        .map(|t| t.id.as_str())
        .collect();

    let generations: Vec<&GenerationRecord> = records
        .generations
        .iter()
        .filter(|g| kept.contains(g.trace_id.as_str()))
        .collect();

    if !query.has_time_range() {
        let traces = records
            .traces
            .iter()
            .filter(|t| kept.contains(t.id.as_str()))
            .collect();
        return (traces, generations);
    }

    // Decided before the range applies: a trace with dated generations never
    // falls back to its own timestamp.
    let dated: HashSet<&str> = generations
        .iter()
        .filter(|g| g.start_time.is_some())
        .map(|g| g.trace_id.as_str())
        .collect();

    let generations: Vec<&GenerationRecord> = generations
        .into_iter()
        .filter(|g| g.start_time.is_none_or(|ts| query.in_range(ts)))
        .collect();

    let dated_in_range: HashSet<&str> = generations
        .iter()
        .filter(|g| g.start_time.is_some())
        .map(|g| g.trace_id.as_str())
        .collect();

    let traces = records
        .traces
        .iter()
        .filter(|t| kept.contains(t.id.as_str()))
        .filter(|t| {
            if dated.contains(t.id.as_str()) {
                dated_in_range.contains(t.id.as_str())
            } else {
                query.in_range(t.timestamp)
            }
        })
        .collect();

    (traces, generations)
}

/// Slice the descending day list into a 1-based page.
pub fn paginate(days: Vec<DailyMetrics>, page: u32, limit: u32) -> DailyMetricsPage {
    let total_items = days.len() as u64;
    let total_pages = total_items.div_ceil(u64::from(limit.max(1)));
    let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);

    DailyMetricsPage {
        data: days.into_iter().skip(skip).take(limit as usize).collect(),
        meta: PageMeta {
            page,
            limit,
            total_items,
            total_pages,
        },
    }
}
