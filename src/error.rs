//! Errors surfaced to the browser.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::views::render_error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The summary query failed. Nothing can be shown without it.
    #[error("Failed to load the trip summaries: {0:#}")]
    DataUnavailable(anyhow::Error),

    /// A form submission could not be decoded.
    #[error("Invalid form submission: {reason}")]
    InvalidForm { reason: String },
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::DataUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::InvalidForm { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self, "Request failed");
        (status, Html(render_error(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = DashboardError::DataUnavailable(anyhow::anyhow!("403 Forbidden"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("403 Forbidden"));

        let err = DashboardError::InvalidForm {
            reason: "missing field".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_response_carries_error_page() {
        let response = DashboardError::DataUnavailable(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
