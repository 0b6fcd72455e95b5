use crate::models::{Kilometers, Run};
use std::collections::{BTreeMap, BTreeSet};

/// Run count and distance for one day. Only values that parse as numbers
/// contribute to either field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotals {
    pub count: usize,
    pub sum: f64,
}

/// Known runs grouped by date-key.
///
/// The index is only ever rebuilt from a complete run set; there is no
/// incremental insert.
#[derive(Debug, Default)]
pub struct RunAggregator {
    index: BTreeMap<String, Vec<Kilometers>>,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, records: &[Run]) {
        let mut index: BTreeMap<String, Vec<Kilometers>> = BTreeMap::new();
        for run in records {
            index
                .entry(run.date.clone())
                .or_default()
                .push(run.kilometers.clone());
        }
        self.index = index;
    }

    pub fn totals_for(&self, date_key: &str) -> DayTotals {
        self.runs_for(date_key)
            .into_iter()
            .fold(DayTotals::default(), |totals, km| DayTotals {
                count: totals.count + 1,
                sum: totals.sum + km,
            })
    }

    /// Parsed distances for one day, in the order the store returned them.
    pub fn runs_for(&self, date_key: &str) -> Vec<f64> {
        self.index
            .get(date_key)
            .map(|values| values.iter().filter_map(Kilometers::value).collect())
            .unwrap_or_default()
    }

    /// True when any record exists for the day, parseable or not.
    pub fn has_runs(&self, date_key: &str) -> bool {
        self.index.contains_key(date_key)
    }

    pub fn dates_with_runs(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    /// Number of indexed records, parseable or not.
    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
