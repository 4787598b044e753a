//! Error types for the proxy handler.
//!
//! `ProxyError` is what `/api/rss` can fail with. It maps onto an HTTP
//! status and a small JSON body so the viewer can show `message` as-is.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const MISSING_URL_MESSAGE: &str = "Missing required query parameter: url";
pub const INVALID_URL_MESSAGE: &str = "Invalid URL format";
pub const UNREACHABLE_MESSAGE: &str =
    "Unable to reach the RSS feed URL. Please check the URL and try again.";
pub const INTERNAL_MESSAGE: &str = "An error occurred while processing the request";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(&'static str),

    /// Upstream answered, but not with a 2xx.
    #[error("Unable to fetch RSS feed: {status_text}")]
    Upstream {
        status: StatusCode,
        status_text: String,
    },

    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable(#[source] reqwest::Error),

    #[error("{}", INTERNAL_MESSAGE)]
    Internal(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::BadRequest(_) => "BadRequest",
            ProxyError::Upstream { .. } => "UpstreamError",
            ProxyError::Unreachable(_) => "Unreachable",
            ProxyError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body sent for every proxy failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl From<&ProxyError> for ErrorBody {
    fn from(err: &ProxyError) -> Self {
        let status_code = match err {
            ProxyError::Upstream { status, .. } => Some(status.as_u16()),
            _ => None,
        };

        ErrorBody {
            error: err.kind(),
            message: err.to_string(),
            status_code,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_bad_request_status_and_message() {
        let err = ProxyError::BadRequest(MISSING_URL_MESSAGE);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "BadRequest");
        assert_eq!(err.to_string(), "Missing required query parameter: url");
    }

    #[test]
    fn test_upstream_passes_status_through() {
        let err = ProxyError::Upstream {
            status: StatusCode::FORBIDDEN,
            status_text: "Forbidden".to_string(),
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Unable to fetch RSS feed: Forbidden");
    }

    #[test]
    fn test_error_body_omits_status_code_unless_upstream() {
        let body = serde_json::to_value(ErrorBody::from(&ProxyError::BadRequest(
            INVALID_URL_MESSAGE,
        )))
        .unwrap();

        assert_eq!(body["error"], "BadRequest");
        assert_eq!(body["message"], "Invalid URL format");
        assert!(body.get("statusCode").is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_response_body() {
        let err = ProxyError::Upstream {
            status: StatusCode::NOT_FOUND,
            status_text: "Not Found".to_string(),
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "UpstreamError");
        assert_eq!(json["message"], "Unable to fetch RSS feed: Not Found");
        assert_eq!(json["statusCode"], 404);
    }
}
