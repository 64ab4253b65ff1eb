//! Cross-account aggregation engine
//!
//! Both sort modes run the same fold; they differ only in which of
//! (account, metric name, dimension value) becomes the primary key and which
//! becomes the label.

use std::sync::Arc;

use cloudbill_common::{BillingRequest, CloudBillError, CostRecord, Result, SortMode};
use tracing::{debug, error, info, instrument, warn};

use super::report::{Contribution, Report};
use crate::accounts::AccountRegistry;

/// Chooses the (primary key, label) pair for a contribution
pub trait KeySelector {
    fn select<'a>(&self, account: &'a str, metric: &'a str, dimension_value: &'a str) -> (&'a str, &'a str);
}

impl KeySelector for SortMode {
    fn select<'a>(&self, account: &'a str, metric: &'a str, dimension_value: &'a str) -> (&'a str, &'a str) {
        match self {
            SortMode::Account => (account, metric),
            SortMode::Dimension => (dimension_value, account),
        }
    }
}

/// Fold one account's records into `report`.
///
/// Every requested metric must be present in every record. On error the
/// report is left partially folded and must be discarded.
pub fn fold_records<K: KeySelector>(
    report: &mut Report,
    selector: &K,
    account: &str,
    metrics: &[String],
    records: &[CostRecord],
) -> Result<()> {
    for record in records {
        for name in metrics {
            let metric = record
                .metric(name)
                .ok_or_else(|| CloudBillError::MetricNotFound {
                    account: account.to_string(),
                    metric: name.clone(),
                    key: record.dimension_value.clone(),
                })?;

            let (primary, label) = selector.select(account, name, &record.dimension_value);
            report.fold(Contribution {
                primary,
                label,
                amount: metric.amount,
                unit: &metric.unit,
            });
        }
    }
    Ok(())
}

/// Records whose amounts the billing API still reports as estimates
pub fn estimated_records(records: &[CostRecord]) -> usize {
    records.iter().filter(|record| record.estimated).count()
}

/// Queries every configured account and folds the results into one report
#[derive(Debug, Clone)]
pub struct CostAggregator {
    registry: Arc<AccountRegistry>,
}

impl CostAggregator {
    pub fn new(registry: Arc<AccountRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Build the report for one request.
    ///
    /// Accounts are queried one after another. The first failure aborts the
    /// whole aggregation; no partial report is returned.
    #[instrument(skip(self, request), fields(
        sort = %request.sort,
        dimension = %request.query.dimension,
        accounts = self.registry.len(),
    ))]
    pub async fn aggregate(&self, request: &BillingRequest) -> Result<Report> {
        let metrics = &request.query.metrics;
        if request.sort == SortMode::Dimension && metrics.len() > 1 {
            warn!(
                metrics = ?metrics,
                "Dimension sort labels by account; amounts of all requested metrics share one label"
            );
        }

        let mut report = Report::new();
        for client in self.registry.iter() {
            let account = client.account.as_str();

            let records = client
                .explorer
                .query_cost_and_usage(account, &request.query)
                .await
                .map_err(|e| {
                    error!(account, error = %e, "Cost query failed, aborting aggregation");
                    e
                })?;

            debug!(
                account,
                records = records.len(),
                estimated = estimated_records(&records),
                "Folding cost records"
            );

            fold_records(&mut report, &request.sort, account, metrics, &records).map_err(|e| {
                error!(account, error = %e, "Cost records rejected, aborting aggregation");
                e
            })?;
        }

        info!(entries = report.len(), "Aggregated cost report");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cloudbill_common::{Metric, TimeBucket};

    fn record(account: &str, dimension_value: &str, cost: f64) -> CostRecord {
        CostRecord::new(
            account,
            TimeBucket {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            },
            dimension_value,
        )
        .with_metric("BlendedCost", Metric::new(cost, "USD"))
    }

    fn blended() -> Vec<String> {
        vec!["BlendedCost".to_string()]
    }

    #[test]
    fn test_key_selection() {
        assert_eq!(SortMode::Account.select("prod", "BlendedCost", "m5.large"), ("prod", "BlendedCost"));
        assert_eq!(SortMode::Dimension.select("prod", "BlendedCost", "m5.large"), ("m5.large", "prod"));
    }

    #[test]
    fn test_fold_by_account_sums_buckets_and_groups() {
        let mut report = Report::new();
        let records = vec![record("B", "m5.large", 5.0), record("B", "t2.micro", 3.0)];

        fold_records(&mut report, &SortMode::Account, "B", &blended(), &records).unwrap();

        let entry = report.get("B").unwrap();
        assert_eq!(entry.get("BlendedCost").unwrap().amount, 8.0);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_fold_by_dimension_nests_accounts() {
        let mut report = Report::new();
        fold_records(&mut report, &SortMode::Dimension, "A", &blended(), &[record("A", "m5.large", 10.0)]).unwrap();
        fold_records(
            &mut report,
            &SortMode::Dimension,
            "B",
            &blended(),
            &[record("B", "m5.large", 5.0), record("B", "t2.micro", 3.0)],
        )
        .unwrap();

        let large = report.get("m5.large").unwrap();
        assert_eq!(large.get("A").unwrap().amount, 10.0);
        assert_eq!(large.get("B").unwrap().amount, 5.0);
        assert_eq!(report.get("t2.micro").unwrap().get("B").unwrap().amount, 3.0);
    }

    #[test]
    fn test_missing_metric_fails() {
        let mut report = Report::new();
        let metrics = vec!["BlendedCost".to_string(), "UnblendedCost".to_string()];

        let err = fold_records(&mut report, &SortMode::Account, "A", &metrics, &[record("A", "m5.large", 1.0)])
            .unwrap_err();

        match err {
            CloudBillError::MetricNotFound { account, metric, key } => {
                assert_eq!(account, "A");
                assert_eq!(metric, "UnblendedCost");
                assert_eq!(key, "m5.large");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_records_no_keys() {
        let mut report = Report::new();
        fold_records(&mut report, &SortMode::Account, "A", &blended(), &[]).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_estimated_records_fold_like_final_ones() {
        let mut estimated = record("A", "m5.large", 2.0);
        estimated.estimated = true;
        let records = vec![record("A", "m5.large", 1.0), estimated];

        assert_eq!(estimated_records(&records), 1);

        let mut report = Report::new();
        fold_records(&mut report, &SortMode::Account, "A", &blended(), &records).unwrap();
        assert_eq!(report.get("A").unwrap().get("BlendedCost").unwrap().amount, 3.0);
    }
}
