//! Consolidated cost report
//!
//! Entries and their labels are kept in `BTreeMap`s so the flattened output
//! is sorted by primary key and label.

use cloudbill_common::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One amount landing on a (primary key, label) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution<'a> {
    /// Account id or dimension value
    pub primary: &'a str,
    /// Metric name or account id
    pub label: &'a str,
    pub amount: f64,
    pub unit: &'a str,
}

/// Metrics accumulated under one primary key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedEntry {
    metrics: BTreeMap<String, Metric>,
}

impl AggregatedEntry {
    pub fn get(&self, label: &str) -> Option<&Metric> {
        self.metrics.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Sum of every label's amount
    pub fn total(&self) -> f64 {
        self.metrics.values().map(|m| m.amount).sum()
    }
}

/// Serialized form of one report entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "Keys")]
    pub keys: String,
    #[serde(rename = "Metrics")]
    pub metrics: BTreeMap<String, Metric>,
}

/// Report for a single request, one entry per primary key observed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    entries: BTreeMap<String, AggregatedEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contribution. The first contribution to a label inserts it with
    /// its unit; later ones only add to the amount.
    pub fn fold(&mut self, contribution: Contribution<'_>) {
        let entry = self
            .entries
            .entry(contribution.primary.to_string())
            .or_default();

        match entry.metrics.get_mut(contribution.label) {
            Some(metric) => metric.accumulate(contribution.amount),
            None => {
                entry.metrics.insert(
                    contribution.label.to_string(),
                    Metric::new(contribution.amount, contribution.unit),
                );
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&AggregatedEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `label` across all entries
    pub fn total(&self, label: &str) -> f64 {
        self.entries
            .values()
            .filter_map(|entry| entry.get(label))
            .map(|m| m.amount)
            .sum()
    }

    /// Flatten for serialization, ordered by primary key
    pub fn into_entries(self) -> Vec<ReportEntry> {
        self.entries
            .into_iter()
            .map(|(keys, entry)| ReportEntry {
                keys,
                metrics: entry.metrics,
            })
            .collect()
    }
}
