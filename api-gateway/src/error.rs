//! HTTP mapping of CloudBill errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use cloudbill_common::{CloudBillError, ErrorKind};
use tracing::{error, warn};

/// Error returned from handlers; renders as a JSON body with a non-2xx status
#[derive(Debug)]
pub struct ApiError(pub CloudBillError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InputValidation => StatusCode::BAD_REQUEST,
            ErrorKind::Query | ErrorKind::MetricNotFound | ErrorKind::MetricParse => {
                StatusCode::BAD_GATEWAY
            }
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CloudBillError> for ApiError {
    fn from(err: CloudBillError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind().as_str();
        let account = self.0.account().unwrap_or("-");

        if status.is_server_error() {
            error!(status = status.as_u16(), kind, account, error = %self.0, "Billing request failed");
        } else {
            warn!(status = status.as_u16(), kind, error = %self.0, "Billing request rejected");
        }

        let body = serde_json::json!({
            "error": kind,
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(CloudBillError::input("missing startTime")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(CloudBillError::query("prod", "throttled")).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError(CloudBillError::MetricParse {
                account: "prod".into(),
                metric: "BlendedCost".into(),
                amount: "x".into(),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(CloudBillError::Config("no profiles".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
