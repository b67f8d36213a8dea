//! Day → model partitioning of normalized generations

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use super::normalizer::NormalizedGeneration;
use crate::types::ModelKey;

/// All normalized generations sharing a (day, model) key
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup<'a> {
    pub model: ModelKey,
    pub records: Vec<NormalizedGeneration<'a>>,
}

/// Everything placed on one day
///
/// Model groups keep the order in which each model first appeared.
#[derive(Debug, Clone, Default)]
pub struct DayGroup<'a> {
    models: Vec<ModelGroup<'a>>,
    index: HashMap<ModelKey, usize>,
    /// Traces with no dated generation, bucketed here by their own timestamp
    trace_only: Vec<&'a str>,
}

impl<'a> DayGroup<'a> {
    fn push(&mut self, record: NormalizedGeneration<'a>) {
        match self.index.get(&record.model) {
            Some(&i) => self.models[i].records.push(record),
            None => {
                self.index.insert(record.model.clone(), self.models.len());
                self.models.push(ModelGroup {
                    model: record.model.clone(),
                    records: vec![record],
                });
            }
        }
    }

    pub fn models(&self) -> &[ModelGroup<'a>] {
        &self.models
    }

    pub fn trace_only(&self) -> &[&'a str] {
        &self.trace_only
    }

    pub fn add_trace_only(&mut self, trace_id: &'a str) {
        self.trace_only.push(trace_id);
    }
}

/// Day-keyed groups; `BTreeMap` so days come out in calendar order
pub type DayGroups<'a> = BTreeMap<NaiveDate, DayGroup<'a>>;

/// Partition normalized generations by day, then by model.
///
/// Every record lands in exactly one (day, model) group.
pub fn group_by_day_and_model<'a, I>(records: I) -> DayGroups<'a>
where
    I: IntoIterator<Item = NormalizedGeneration<'a>>,
{
    let mut days: DayGroups<'a> = BTreeMap::new();
    for record in records {
        days.entry(record.date).or_default().push(record);
    }
    days
}
