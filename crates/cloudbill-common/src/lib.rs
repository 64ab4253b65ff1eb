//! # CloudBill Common
//!
//! Shared types and errors for the CloudBill cost aggregation service.
//!
//! ## Core Types
//!
//! - [`Metric`]: an amount with its unit
//! - [`CostRecord`]: one (account, time bucket, dimension value) row from the billing API
//! - [`CostQuery`]: validated time range, granularity, metrics, and dimension
//! - [`SortMode`]: primary axis of the consolidated report
//! - [`BillingRequest`]: a parsed `/billing` request

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{CloudBillError, ErrorKind, Result};
pub use types::{
    cost_record::{CostRecord, Metric, TimeBucket},
    query::{
        BillingRequest, CostQuery, Dimension, Granularity, SortMode, TimeRange, DEFAULT_DIMENSION,
        DEFAULT_METRIC,
    },
};

/// CloudBill version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
