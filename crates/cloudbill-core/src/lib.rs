//! # CloudBill Core
//!
//! Cross-account cloud cost aggregation.
//!
//! ## Flow
//!
//! ```text
//! BillingRequest ──► CostAggregator ──► for each account in AccountRegistry
//!                                          │
//!                                          ├─ CostExplorer::query_cost_and_usage
//!                                          └─ fold_records ──► Report
//! ```
//!
//! Reports are keyed by account (labels are metric names) or by dimension
//! value (labels are accounts). Amounts landing on the same key and label are
//! summed across time buckets and groups.

pub mod accounts;
pub mod aggregation;
pub mod explorer;

pub use accounts::{AccountClient, AccountRegistry};
pub use aggregation::{
    fold_records, AggregatedEntry, Contribution, CostAggregator, KeySelector, Report, ReportEntry,
};
pub use explorer::{AwsCostExplorer, CostExplorer};
