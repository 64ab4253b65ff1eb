//! Billing query adapter
//!
//! One [`CostExplorer`] answers cost-and-usage queries for the accounts it is
//! authorized for. The aggregation engine only sees this trait:
//! - [`AwsCostExplorer`]: AWS Cost Explorer `GetCostAndUsage`, one client per credential profile
//! - [`profiles`]: discovery of credential profile names

pub mod aws;
pub mod profiles;

use async_trait::async_trait;
use cloudbill_common::{CostQuery, CostRecord, Result};

pub use aws::AwsCostExplorer;

/// Account-scoped cost-and-usage query
#[async_trait]
pub trait CostExplorer: Send + Sync {
    /// Run one query for `account` and return every record the billing API
    /// reports for it. No retries, no caching.
    async fn query_cost_and_usage(&self, account: &str, query: &CostQuery) -> Result<Vec<CostRecord>>;
}
