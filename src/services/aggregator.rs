//! Aggregator service for computing daily usage metrics

use rust_decimal::Decimal;
use std::collections::HashSet;

use super::grouping::{group_by_day_and_model, DayGroup, ModelGroup};
use super::normalizer::{day_key, normalize_generation};
use crate::types::{DailyMetrics, GenerationRecord, ModelUsageRow, RecordSet, Result, TraceRecord};

/// Running sums for one (day, model) group
#[derive(Debug, Default)]
struct RowAccumulator<'a> {
    input: u64,
    output: u64,
    total: u64,
    cost: Decimal,
    count: u64,
    traces: HashSet<&'a str>,
}

impl<'a> RowAccumulator<'a> {
    fn from_group(group: &ModelGroup<'a>) -> Self {
        let mut acc = Self::default();
        for record in &group.records {
            acc.input = acc.input.saturating_add(record.input);
            acc.output = acc.output.saturating_add(record.output);
            acc.total = acc.total.saturating_add(record.total);
            acc.cost = acc.cost.saturating_add(record.cost);
            acc.count = acc.count.saturating_add(1);
            acc.traces.insert(record.trace_id);
        }
        acc
    }
}

/// Aggregator for computing daily metrics
pub struct Aggregator;

impl Aggregator {
    /// Validate the record set, then aggregate it by day (most recent first).
    pub fn daily(records: &RecordSet) -> Result<Vec<DailyMetrics>> {
        records.validate()?;
        Ok(Self::aggregate(&records.traces, &records.generations))
    }

    /// Aggregate already-validated records by day (most recent first).
    ///
    /// Generations are bucketed by their start time. A trace none of whose
    /// generations has a start time is counted on the day of its own
    /// timestamp instead.
    pub fn aggregate<'a, T, G>(traces: T, generations: G) -> Vec<DailyMetrics>
    where
        T: IntoIterator<Item = &'a TraceRecord>,
        G: IntoIterator<Item = &'a GenerationRecord>,
    {
        let normalized: Vec<_> = generations
            .into_iter()
            .filter_map(normalize_generation)
            .collect();

        let dated_traces: HashSet<&str> = normalized.iter().map(|n| n.trace_id).collect();
        let mut days = group_by_day_and_model(normalized);

        for trace in traces {
            if !dated_traces.contains(trace.id.as_str()) {
                days.entry(trace.timestamp.date_naive())
                    .or_default()
                    .add_trace_only(&trace.id);
            }
        }

        // Most recent day first
        days.into_iter()
            .rev()
            .map(|(date, day)| Self::assemble_day(day_key(date), &day))
            .collect()
    }

    fn assemble_day(date: String, day: &DayGroup<'_>) -> DailyMetrics {
        let mut day_traces: HashSet<&str> = HashSet::new();
        let mut total_cost = Decimal::ZERO;
        let mut usage = Vec::with_capacity(day.models().len());

        for group in day.models() {
            let acc = RowAccumulator::from_group(group);
            total_cost = total_cost.saturating_add(acc.cost);
            day_traces.extend(acc.traces.iter().copied());
            usage.push(ModelUsageRow {
                model: group.model.clone(),
                input_usage: acc.input,
                output_usage: acc.output,
                total_usage: acc.total,
                count_observations: acc.count,
                count_traces: acc.traces.len() as u64,
                total_cost: acc.cost,
            });
        }
        day_traces.extend(day.trace_only().iter().copied());

        DailyMetrics {
            date,
            count_traces: day_traces.len() as u64,
            total_cost,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntegrityError, ModelKey, TracemeterError, UsageBlock};
    use chrono::{DateTime, TimeZone, Utc};
    use std::str::FromStr;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn make_trace(id: &str, timestamp: DateTime<Utc>) -> TraceRecord {
        TraceRecord {
            id: id.into(),
            timestamp,
            project_id: "project-daily-metrics".into(),
            name: None,
            user_id: None,
            tags: Vec::new(),
        }
    }

    fn make_generation(
        id: &str,
        trace_id: &str,
        model: Option<&str>,
        usage: (Option<u64>, Option<u64>, Option<u64>),
        cost: Option<&str>,
        start_time: Option<DateTime<Utc>>,
    ) -> GenerationRecord {
        GenerationRecord {
            id: id.into(),
            trace_id: trace_id.into(),
            model: model.map(String::from),
            start_time,
            usage: Some(UsageBlock {
                input: usage.0,
                output: usage.1,
                total: usage.2,
                total_cost: None,
            }),
            total_cost: cost.map(|c| Decimal::from_str(c).unwrap()),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Two traces on consecutive days, four generations, one without model
    fn two_day_fixture() -> RecordSet {
        RecordSet::new(
            vec![
                make_trace("trace-1", at(2021, 1, 1)),
                make_trace("trace-2", at(2021, 1, 2)),
            ],
            vec![
                make_generation(
                    "gen-1",
                    "trace-1",
                    Some("modelA"),
                    (Some(100), Some(200), Some(300)),
                    None,
                    Some(at(2021, 1, 1)),
                ),
                make_generation(
                    "gen-2",
                    "trace-2",
                    Some("modelB"),
                    (Some(333), None, None),
                    None,
                    Some(at(2021, 1, 2)),
                ),
                make_generation(
                    "gen-3",
                    "trace-2",
                    Some("modelC"),
                    (Some(666), Some(777), None),
                    Some("1024.22"),
                    Some(at(2021, 1, 2)),
                ),
                make_generation(
                    "gen-4",
                    "trace-2",
                    None,
                    (None, Some(300), None),
                    None,
                    Some(at(2021, 1, 2)),
                ),
            ],
        )
    }

    // ========== Reference scenarios ==========

    #[test]
    fn test_daily_two_days_most_recent_first() {
        let result = Aggregator::daily(&two_day_fixture()).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].date, "2021-01-02");
        assert_eq!(result[0].count_traces, 1);
        assert_eq!(result[0].total_cost, dec("1024.22"));
        assert_eq!(
            result[0].usage,
            vec![
                ModelUsageRow {
                    model: ModelKey::Named("modelB".into()),
                    input_usage: 333,
                    output_usage: 0,
                    total_usage: 333,
                    count_observations: 1,
                    count_traces: 1,
                    total_cost: Decimal::ZERO,
                },
                ModelUsageRow {
                    model: ModelKey::Named("modelC".into()),
                    input_usage: 666,
                    output_usage: 777,
                    total_usage: 1443,
                    count_observations: 1,
                    count_traces: 1,
                    total_cost: dec("1024.22"),
                },
                ModelUsageRow {
                    model: ModelKey::Unspecified,
                    input_usage: 0,
                    output_usage: 300,
                    total_usage: 300,
                    count_observations: 1,
                    count_traces: 1,
                    total_cost: Decimal::ZERO,
                },
            ]
        );

        assert_eq!(result[1].date, "2021-01-01");
        assert_eq!(result[1].count_traces, 1);
        assert_eq!(result[1].total_cost, Decimal::ZERO);
        assert_eq!(
            result[1].usage,
            vec![ModelUsageRow {
                model: ModelKey::Named("modelA".into()),
                input_usage: 100,
                output_usage: 200,
                total_usage: 300,
                count_observations: 1,
                count_traces: 1,
                total_cost: Decimal::ZERO,
            }]
        );
    }

    #[test]
    fn test_daily_json_shape() {
        let result = Aggregator::daily(&two_day_fixture()).unwrap();
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value[0]["date"], "2021-01-02");
        assert_eq!(value[0]["totalCost"].as_f64(), Some(1024.22));
        assert_eq!(value[0]["usage"][2]["model"], serde_json::Value::Null);
        assert_eq!(value[0]["usage"][0]["totalUsage"], 333);
        assert_eq!(value[1]["usage"][0]["model"], "modelA");
    }

    #[test]
    fn test_daily_empty() {
        let result = Aggregator::daily(&RecordSet::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_daily_trace_without_generations() {
        let records = RecordSet::new(vec![make_trace("trace-1", at(2021, 1, 1))], Vec::new());
        let result = Aggregator::daily(&records).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2021-01-01");
        assert_eq!(result[0].count_traces, 1);
        assert_eq!(result[0].total_cost, Decimal::ZERO);
        assert!(result[0].usage.is_empty());
    }

    // ========== Day bucketing ==========

    #[test]
    fn test_generation_day_overrides_trace_day() {
        // Trace created on the 1st, its only generation starts on the 3rd
        let records = RecordSet::new(
            vec![make_trace("trace-1", at(2021, 1, 1))],
            vec![make_generation(
                "gen-1",
                "trace-1",
                Some("modelA"),
                (Some(1), Some(1), None),
                None,
                Some(at(2021, 1, 3)),
            )],
        );
        let result = Aggregator::daily(&records).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2021-01-03");
        assert_eq!(result[0].count_traces, 1);
    }

    #[test]
    fn test_undated_generation_skipped_trace_falls_back() {
        let records = RecordSet::new(
            vec![make_trace("trace-1", at(2021, 1, 5))],
            vec![make_generation(
                "gen-1",
                "trace-1",
                Some("modelA"),
                (Some(10), Some(10), None),
                Some("3.5"),
                None,
            )],
        );
        let result = Aggregator::daily(&records).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2021-01-05");
        assert_eq!(result[0].count_traces, 1);
        assert_eq!(result[0].total_cost, Decimal::ZERO);
        assert!(result[0].usage.is_empty());
    }

    #[test]
    fn test_trace_only_day_merges_with_generation_day() {
        let records = RecordSet::new(
            vec![
                make_trace("trace-1", at(2021, 1, 1)),
                make_trace("trace-2", at(2021, 1, 1)),
            ],
            vec![make_generation(
                "gen-1",
                "trace-1",
                Some("modelA"),
                (Some(1), None, None),
                None,
                Some(at(2021, 1, 1)),
            )],
        );
        let result = Aggregator::daily(&records).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].count_traces, 2);
        assert_eq!(result[0].usage.len(), 1);
        assert_eq!(result[0].usage[0].count_traces, 1);
    }

    #[test]
    fn test_days_strictly_descending() {
        let traces: Vec<TraceRecord> = [3, 1, 7, 5]
            .iter()
            .map(|d| make_trace(&format!("trace-{d}"), at(2021, 1, *d)))
            .collect();
        let records = RecordSet::new(traces, Vec::new());
        let result = Aggregator::daily(&records).unwrap();

        let dates: Vec<&str> = result.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2021-01-07", "2021-01-05", "2021-01-03", "2021-01-01"]);
        for pair in result.windows(2) {
            assert!(pair[0].date > pair[1].date);
        }
    }

    // ========== Counting ==========

    #[test]
    fn test_trace_counted_once_per_day_but_per_model_row() {
        let day = Some(at(2021, 2, 1));
        let records = RecordSet::new(
            vec![make_trace("trace-1", at(2021, 2, 1))],
            vec![
                make_generation("g1", "trace-1", Some("a"), (Some(1), None, None), None, day),
                make_generation("g2", "trace-1", Some("b"), (Some(1), None, None), None, day),
            ],
        );
        let result = Aggregator::daily(&records).unwrap();

        assert_eq!(result[0].count_traces, 1);
        assert_eq!(result[0].usage[0].count_traces, 1);
        assert_eq!(result[0].usage[1].count_traces, 1);
    }

    #[test]
    fn test_distinct_traces_and_observations_within_row() {
        let day = Some(at(2021, 2, 1));
        let records = RecordSet::new(
            vec![
                make_trace("t1", at(2021, 2, 1)),
                make_trace("t2", at(2021, 2, 1)),
            ],
            vec![
                make_generation("g1", "t1", Some("a"), (Some(1), Some(2), None), Some("0.1"), day),
                make_generation("g2", "t1", Some("a"), (Some(3), Some(4), None), Some("0.2"), day),
                make_generation("g3", "t2", Some("a"), (Some(5), Some(6), None), None, day),
            ],
        );
        let result = Aggregator::daily(&records).unwrap();
        let row = &result[0].usage[0];

        assert_eq!(row.count_observations, 3);
        assert_eq!(row.count_traces, 2);
        assert_eq!(row.input_usage, 9);
        assert_eq!(row.output_usage, 12);
        assert_eq!(row.total_usage, 21);
        assert_eq!(row.total_cost, dec("0.3")); // exact, no float drift
    }

    #[test]
    fn test_absent_usage_block_counts_observation() {
        let mut generation = make_generation(
            "g1",
            "t1",
            Some("a"),
            (None, None, None),
            None,
            Some(at(2021, 3, 1)),
        );
        generation.usage = None;
        let records = RecordSet::new(vec![make_trace("t1", at(2021, 3, 1))], vec![generation]);
        let result = Aggregator::daily(&records).unwrap();
        let row = &result[0].usage[0];

        assert_eq!((row.input_usage, row.output_usage, row.total_usage), (0, 0, 0));
        assert_eq!(row.count_observations, 1);
    }

    #[test]
    fn test_day_cost_is_sum_of_rows() {
        let day = Some(at(2021, 4, 1));
        let records = RecordSet::new(
            vec![make_trace("t1", at(2021, 4, 1))],
            vec![
                make_generation("g1", "t1", Some("a"), (None, None, None), Some("0.1"), day),
                make_generation("g2", "t1", Some("b"), (None, None, None), Some("0.2"), day),
                make_generation("g3", "t1", None, (None, None, None), Some("0.000001"), day),
            ],
        );
        let result = Aggregator::daily(&records).unwrap();
        let row_sum: Decimal = result[0].usage.iter().map(|r| r.total_cost).sum();

        assert_eq!(result[0].total_cost, dec("0.300001"));
        assert_eq!(result[0].total_cost, row_sum);
    }

    #[test]
    fn test_day_trace_count_is_union_of_rows() {
        let day = Some(at(2021, 5, 1));
        let traces = ["t1", "t2", "t3"]
            .iter()
            .map(|id| make_trace(id, at(2021, 5, 1)))
            .collect();
        let records = RecordSet::new(
            traces,
            vec![
                make_generation("g1", "t1", Some("a"), (None, None, None), None, day),
                make_generation("g2", "t2", Some("a"), (None, None, None), None, day),
                make_generation("g3", "t2", Some("b"), (None, None, None), None, day),
                make_generation("g4", "t3", Some("b"), (None, None, None), None, day),
            ],
        );
        let result = Aggregator::daily(&records).unwrap();

        assert_eq!(result[0].usage[0].count_traces, 2);
        assert_eq!(result[0].usage[1].count_traces, 2);
        assert_eq!(result[0].count_traces, 3);
    }

    // ========== Determinism & integrity ==========

    #[test]
    fn test_daily_idempotent() {
        let records = two_day_fixture();
        let first = serde_json::to_string(&Aggregator::daily(&records).unwrap()).unwrap();
        let second = serde_json::to_string(&Aggregator::daily(&records).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_daily_unknown_trace_is_error() {
        let mut records = two_day_fixture();
        records.generations[0].trace_id = "missing".into();

        let err = Aggregator::daily(&records).unwrap_err();
        assert!(matches!(
            err,
            TracemeterError::Integrity(IntegrityError::UnknownTrace { .. })
        ));
    }

    #[test]
    fn test_aggregate_accepts_borrowed_subsets() {
        let records = two_day_fixture();
        let result = Aggregator::aggregate(
            records.traces.iter().filter(|t| t.id == "trace-1"),
            records.generations.iter().filter(|g| g.trace_id == "trace-1"),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2021-01-01");
    }
}
