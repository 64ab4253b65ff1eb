//! AWS Cost Explorer adapter

use std::future::Future;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_costexplorer::{
    error::DisplayErrorContext,
    operation::get_cost_and_usage::GetCostAndUsageOutput,
    types::{
        DateInterval, Granularity as AwsGranularity, GroupDefinition, GroupDefinitionType,
        MetricValue, ResultByTime,
    },
    Client,
};
use chrono::NaiveDate;
use cloudbill_common::{
    types::query::DATE_FORMAT, CloudBillError, CostQuery, CostRecord, Metric, Result, TimeBucket,
};
use tracing::{debug, error, instrument};

use super::{profiles, CostExplorer};

/// Cost Explorer is served from a single region
pub const COST_EXPLORER_REGION: &str = "us-east-1";

/// Cost Explorer client bound to one credential profile
#[derive(Clone)]
pub struct AwsCostExplorer {
    client: Client,
}

impl AwsCostExplorer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from a named profile of the given credentials file.
    ///
    /// Credentials are resolved lazily, so a broken profile surfaces as a
    /// query error on first use rather than here.
    pub async fn from_profile(profile: &str, credentials: &Path, region: Option<&str>) -> Self {
        let region = region.unwrap_or(COST_EXPLORER_REGION).to_string();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .profile_files(profiles::credentials_file(credentials))
            .profile_name(profile)
            .region(aws_config::Region::new(region))
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl CostExplorer for AwsCostExplorer {
    #[instrument(skip(self, query), fields(
        granularity = %query.granularity,
        dimension = %query.dimension,
        start = %query.time_range.start,
        end = %query.time_range.end,
    ))]
    async fn query_cost_and_usage(&self, account: &str, query: &CostQuery) -> Result<Vec<CostRecord>> {
        let period = DateInterval::builder()
            .start(query.time_range.start_str())
            .end(query.time_range.end_str())
            .build()
            .map_err(|e| CloudBillError::query(account, e.to_string()))?;

        let group_by = GroupDefinition::builder()
            .r#type(GroupDefinitionType::Dimension)
            .key(query.dimension.as_str())
            .build();

        let request = self
            .client
            .get_cost_and_usage()
            .time_period(period)
            .granularity(AwsGranularity::from(query.granularity.as_str()))
            .group_by(group_by)
            .set_metrics(Some(query.metrics.clone()));

        collect_pages(account, |token| {
            let request = request.clone().set_next_page_token(token);
            async move {
                request.send().await.map_err(|e| {
                    let message = DisplayErrorContext(&e).to_string();
                    error!(account, error = %message, "Cost Explorer query failed");
                    CloudBillError::query(account, message)
                })
            }
        })
        .await
    }
}

/// Follow `NextPageToken` until the last page and return every page's records
/// in arrival order. `fetch` is called with the token of the page to request,
/// `None` for the first one.
pub async fn collect_pages<F, Fut>(account: &str, mut fetch: F) -> Result<Vec<CostRecord>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<GetCostAndUsageOutput>>,
{
    let mut records = Vec::new();
    let mut next_page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let response = fetch(next_page_token.take()).await?;
        pages += 1;

        for result in response.results_by_time() {
            records.extend(records_from_result(account, result)?);
        }

        match response.next_page_token() {
            Some(token) if !token.is_empty() => next_page_token = Some(token.to_string()),
            _ => break,
        }
    }

    debug!(account, pages, records = records.len(), "Fetched cost records");
    Ok(records)
}

/// Convert one time bucket of a response into cost records, one per group
pub fn records_from_result(account: &str, result: &ResultByTime) -> Result<Vec<CostRecord>> {
    let period = result
        .time_period()
        .ok_or_else(|| CloudBillError::query(account, "result without time period"))?;
    let bucket = TimeBucket {
        start: parse_date(account, period.start())?,
        end: parse_date(account, period.end())?,
    };

    let mut records = Vec::with_capacity(result.groups().len());
    for group in result.groups() {
        // Exactly one group-by dimension is requested
        let key = group
            .keys()
            .first()
            .ok_or_else(|| CloudBillError::query(account, "group without dimension key"))?;

        let mut record = CostRecord::new(account, bucket, key.as_str());
        record.estimated = result.estimated();

        if let Some(metrics) = group.metrics() {
            for (name, value) in metrics {
                record
                    .metrics
                    .insert(name.clone(), parse_metric(account, name, value)?);
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Parse an upstream metric value. A missing or non-numeric amount is an
/// error, never zero.
pub fn parse_metric(account: &str, name: &str, value: &MetricValue) -> Result<Metric> {
    let raw = value.amount().unwrap_or_default();
    let amount = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CloudBillError::MetricParse {
            account: account.to_string(),
            metric: name.to_string(),
            amount: raw.to_string(),
        })?;
    Ok(Metric::new(amount, value.unit().unwrap_or_default()))
}

fn parse_date(account: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| CloudBillError::query(account, format!("bad bucket date {raw:?}: {e}")))
}
