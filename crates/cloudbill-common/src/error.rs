//! Error types for CloudBill
//!
//! Every failure is terminal for the request that produced it. The gateway
//! maps [`CloudBillError::kind`] onto an HTTP status.

use thiserror::Error;

/// Result type alias using CloudBillError
pub type Result<T> = std::result::Result<T, CloudBillError>;

/// Unified error type for CloudBill operations
#[derive(Debug, Error)]
pub enum CloudBillError {
    /// Missing or malformed request parameter
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Upstream billing call failed for an account
    #[error("Cost query failed for account {account}: {message}")]
    Query { account: String, message: String },

    /// A requested metric was absent from a returned record
    #[error("Metric {metric} missing for account {account} (group {key})")]
    MetricNotFound {
        account: String,
        metric: String,
        key: String,
    },

    /// Upstream returned an amount that is not a number
    #[error("Unparseable amount {amount:?} for metric {metric} in account {account}")]
    MetricParse {
        account: String,
        metric: String,
        amount: String,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used for responses and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    Query,
    MetricNotFound,
    MetricParse,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputValidation => "InputValidationError",
            ErrorKind::Query => "QueryError",
            ErrorKind::MetricNotFound => "MetricNotFoundError",
            ErrorKind::MetricParse => "MetricParseError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl CloudBillError {
    pub fn input(msg: impl Into<String>) -> Self {
        CloudBillError::InputValidation(msg.into())
    }

    pub fn query(account: impl Into<String>, message: impl Into<String>) -> Self {
        CloudBillError::Query {
            account: account.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudBillError::InputValidation(_) => ErrorKind::InputValidation,
            CloudBillError::Query { .. } => ErrorKind::Query,
            CloudBillError::MetricNotFound { .. } => ErrorKind::MetricNotFound,
            CloudBillError::MetricParse { .. } => ErrorKind::MetricParse,
            CloudBillError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Account the failure is attributed to, if any
    pub fn account(&self) -> Option<&str> {
        match self {
            CloudBillError::Query { account, .. }
            | CloudBillError::MetricNotFound { account, .. }
            | CloudBillError::MetricParse { account, .. } => Some(account),
            _ => None,
        }
    }
}
