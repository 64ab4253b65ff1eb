//! Cost records as reported by the billing collaborator
//!
//! A [`CostRecord`] is one (account, time bucket, dimension value) row. Records
//! are produced per request and discarded once folded into a report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single numeric measurement with its unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Monetary or usage amount
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Currency or usage unit (e.g. "USD", "Hrs")
    #[serde(rename = "Unit")]
    pub unit: String,
}

impl Metric {
    pub fn new(amount: f64, unit: impl Into<String>) -> Self {
        Self {
            amount,
            unit: unit.into(),
        }
    }

    /// Accumulate another amount in place. The unit is kept as first observed.
    pub fn accumulate(&mut self, amount: f64) {
        self.amount += amount;
    }
}

/// Half-open date interval `[start, end)` of a time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One row of cost-and-usage data for an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Account the row belongs to
    pub account: String,
    /// Time bucket the row covers
    pub bucket: TimeBucket,
    /// Value of the grouping dimension (e.g. "m5.large")
    pub dimension_value: String,
    /// Metric name to measurement
    pub metrics: HashMap<String, Metric>,
    /// Upstream flagged the bucket as not yet final
    #[serde(default)]
    pub estimated: bool,
}

impl CostRecord {
    pub fn new(
        account: impl Into<String>,
        bucket: TimeBucket,
        dimension_value: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            bucket,
            dimension_value: dimension_value.into(),
            metrics: HashMap::new(),
            estimated: false,
        }
    }

    /// Builder-style metric insertion
    pub fn with_metric(mut self, name: impl Into<String>, metric: Metric) -> Self {
        self.metrics.insert(name.into(), metric);
        self
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }
}
