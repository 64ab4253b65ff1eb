//! Cost query parameters
//!
//! Parsing of the `/billing` query string into a validated [`BillingRequest`].
//! Everything here runs before any upstream call is made, so a rejected
//! request never reaches an account.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CloudBillError, Result};

/// Query-string parameter names
pub mod params {
    pub const START_TIME: &str = "startTime";
    pub const END_TIME: &str = "endTime";
    pub const SORT: &str = "sort";
    pub const GRANULARITY: &str = "granularity";
    pub const METRICS: &str = "metrics";
    pub const DIMENSION: &str = "dimension";
}

/// Metric queried when the caller names none
pub const DEFAULT_METRIC: &str = "BlendedCost";

/// Dimension grouped by when the caller names none
pub const DEFAULT_DIMENSION: &str = "INSTANCE_TYPE";

/// Date format used by the billing API
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time bucket size of returned records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    #[default]
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

impl FromStr for Granularity {
    type Err = CloudBillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Granularity::Daily),
            "MONTHLY" => Ok(Granularity::Monthly),
            other => Err(CloudBillError::input(format!(
                "granularity must be DAILY or MONTHLY, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing dimension key, always upper case (e.g. `INSTANCE_TYPE`, `SERVICE`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension(String);

impl Dimension {
    pub fn new(key: &str) -> Self {
        Self(key.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self(DEFAULT_DIMENSION.to_string())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open calendar date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(CloudBillError::input(format!(
                "startTime ({start}) must fall on an earlier day than endTime ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Build from Unix epoch seconds. Sub-day precision is discarded (UTC).
    pub fn from_epoch_secs(start: i64, end: i64) -> Result<Self> {
        Self::new(
            epoch_to_date(params::START_TIME, start)?,
            epoch_to_date(params::END_TIME, end)?,
        )
    }

    /// Build from raw query values. Both must be present.
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if !s.trim().is_empty() && !e.trim().is_empty() => (s, e),
            _ => {
                return Err(CloudBillError::input(
                    "both startTime and endTime are required",
                ))
            }
        };
        Self::from_epoch_secs(
            parse_epoch(params::START_TIME, start)?,
            parse_epoch(params::END_TIME, end)?,
        )
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn first_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| k == name && !v.trim().is_empty())
        .map(|(_, v)| v.as_str())
}

fn parse_epoch(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CloudBillError::input(format!("{name} must be Unix epoch seconds, got {raw:?}")))
}

fn epoch_to_date(name: &str, secs: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| CloudBillError::input(format!("{name} {secs} is out of range")))
}

/// A validated cost-and-usage query, identical for every account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostQuery {
    pub time_range: TimeRange,
    pub granularity: Granularity,
    /// Never empty, no duplicates
    pub metrics: Vec<String>,
    pub dimension: Dimension,
}

impl CostQuery {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            granularity: Granularity::default(),
            metrics: vec![DEFAULT_METRIC.to_string()],
            dimension: Dimension::default(),
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    /// Replace the metric set. Blank names and duplicates are dropped; an
    /// empty result falls back to the default metric.
    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in metrics {
            let name = name.as_ref().trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            names.push(DEFAULT_METRIC.to_string());
        }
        self.metrics = names;
        self
    }
}

/// Primary axis of the consolidated report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Entries keyed by account, labelled by metric name
    #[default]
    Account,
    /// Entries keyed by dimension value, labelled by account
    Dimension,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Account => "account",
            SortMode::Dimension => "dimension",
        }
    }
}

impl FromStr for SortMode {
    type Err = CloudBillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account" => Ok(SortMode::Account),
            "dimension" => Ok(SortMode::Dimension),
            other => Err(CloudBillError::input(format!(
                "sort must be account or dimension, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one `/billing` request asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRequest {
    pub query: CostQuery,
    pub sort: SortMode,
}

impl BillingRequest {
    /// Parse decoded query-string pairs. Single-valued parameters use their
    /// first occurrence; `metrics` may repeat. Empty values count as absent.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let first = |name: &str| first_value(pairs, name);

        let time_range = TimeRange::from_params(first(params::START_TIME), first(params::END_TIME))?;

        let granularity = first(params::GRANULARITY)
            .map(str::parse::<Granularity>)
            .transpose()?
            .unwrap_or_default();

        let dimension = first(params::DIMENSION)
            .map(Dimension::new)
            .unwrap_or_default();

        let sort = first(params::SORT)
            .map(str::parse::<SortMode>)
            .transpose()?
            .unwrap_or_default();

        let metrics = pairs
            .iter()
            .filter(|(k, _)| k == params::METRICS)
            .map(|(_, v)| v.as_str());

        let query = CostQuery::new(time_range)
            .with_granularity(granularity)
            .with_dimension(dimension)
            .with_metrics(metrics);

        Ok(Self { query, sort })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // 2024-01-01T00:00:00Z and 2024-02-01T00:00:00Z
    const JAN_1: &str = "1704067200";
    const FEB_1: &str = "1706745600";

    #[test]
    fn test_defaults() {
        let req = BillingRequest::from_pairs(&pairs(&[("startTime", JAN_1), ("endTime", FEB_1)]))
            .unwrap();

        assert_eq!(req.sort, SortMode::Account);
        assert_eq!(req.query.granularity, Granularity::Monthly);
        assert_eq!(req.query.metrics, vec!["BlendedCost".to_string()]);
        assert_eq!(req.query.dimension.as_str(), "INSTANCE_TYPE");
        assert_eq!(req.query.time_range.start_str(), "2024-01-01");
        assert_eq!(req.query.time_range.end_str(), "2024-02-01");
    }

    #[test]
    fn test_case_normalization_and_repeated_metrics() {
        let req = BillingRequest::from_pairs(&pairs(&[
            ("startTime", JAN_1),
            ("endTime", FEB_1),
            ("granularity", "daily"),
            ("dimension", "service"),
            ("sort", "Dimension"),
            ("metrics", "UnblendedCost"),
            ("metrics", "UsageQuantity"),
            ("metrics", "UnblendedCost"),
        ]))
        .unwrap();

        assert_eq!(req.query.granularity, Granularity::Daily);
        assert_eq!(req.query.dimension.as_str(), "SERVICE");
        assert_eq!(req.sort, SortMode::Dimension);
        assert_eq!(req.query.metrics, vec!["UnblendedCost", "UsageQuantity"]);
    }

    #[test]
    fn test_missing_start_time_is_rejected() {
        let err = BillingRequest::from_pairs(&pairs(&[("endTime", FEB_1)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidation);

        let err = BillingRequest::from_pairs(&pairs(&[("startTime", ""), ("endTime", FEB_1)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidation);
    }

    #[test]
    fn test_non_numeric_time_is_rejected() {
        let err = BillingRequest::from_pairs(&pairs(&[("startTime", "2024-01-01"), ("endTime", FEB_1)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidation);
        assert!(err.to_string().contains("startTime"));
    }

    #[test]
    fn test_sub_day_precision_is_discarded() {
        // 2024-01-01T23:59:59Z and 2024-01-02T00:00:01Z
        let range = TimeRange::from_epoch_secs(1704153599, 1704153601).unwrap();
        assert_eq!(range.start_str(), "2024-01-01");
        assert_eq!(range.end_str(), "2024-01-02");
    }

    #[test]
    fn test_same_day_range_is_rejected() {
        let err = TimeRange::from_epoch_secs(1704067200, 1704070800).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidation);
    }

    #[test]
    fn test_unknown_enums_are_rejected() {
        assert!("HOURLY_ISH".parse::<Granularity>().is_err());
        assert!("region".parse::<SortMode>().is_err());
        assert_eq!(" monthly ".parse::<Granularity>().unwrap(), Granularity::Monthly);
    }

    #[test]
    fn test_blank_metrics_fall_back_to_default() {
        let range = TimeRange::from_epoch_secs(1704067200, 1706745600).unwrap();
        let query = CostQuery::new(range).with_metrics(["", "  "]);
        assert_eq!(query.metrics, vec![DEFAULT_METRIC.to_string()]);
    }
}
