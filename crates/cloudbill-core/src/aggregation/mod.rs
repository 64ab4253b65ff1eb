//! Aggregation module
//!
//! Folds per-account cost records into one consolidated report:
//! - Report: entries keyed by account or dimension value
//! - CostAggregator: queries every account and folds the results

pub mod engine;
pub mod report;

pub use engine::{fold_records, CostAggregator, KeySelector};
pub use report::{AggregatedEntry, Contribution, Report, ReportEntry};
