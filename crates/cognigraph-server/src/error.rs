//! Error-to-response mapping for the HTTP boundary.
//!
//! Every rejected operation yields a classified `{detail}` body. Rate
//! limits additionally carry the numeric `retry_after_seconds` field and
//! embed the `wait <N>s` pattern in `detail` — clients parse that exact
//! substring, so it must survive any rewording.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use cognigraph_core::Error;

/// Wrapper turning the core taxonomy into HTTP responses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let retry_after = self.0.retry_after_secs();
        let detail = detail_message(&self.0);

        let body = match retry_after {
            Some(secs) => json!({ "detail": detail, "retry_after_seconds": secs }),
            None => json!({ "detail": detail }),
        };

        (status, Json(body)).into_response()
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UnsupportedFormat(_)
        | Error::ExtractionFailed(_)
        | Error::NoDocument
        | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::GraphExtractionFailed {
            retry_after_secs, ..
        } => {
            if retry_after_secs.is_some() {
                StatusCode::TOO_MANY_REQUESTS
            } else {
                StatusCode::BAD_GATEWAY
            }
        }
        Error::Provider(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
        Error::Io(_) | Error::Json(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Human-readable detail. Rate-limited errors embed both a readable
/// duration and the machine-parseable `wait <N>s` form.
pub fn detail_message(err: &Error) -> String {
    match err.retry_after_secs() {
        Some(secs) => format!(
            "{}. Please wait {} (wait {}s) before trying again.",
            err,
            human_duration(secs),
            secs
        ),
        None => err.to_string(),
    }
}

fn human_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_detail_contains_wait_pattern() {
        let detail = detail_message(&Error::RateLimited {
            retry_after_secs: 45,
        });
        assert!(detail.contains("wait 45s"), "detail was: {}", detail);
    }

    #[test]
    fn test_graph_extraction_rate_limit_propagates_wait_pattern() {
        let detail = detail_message(&Error::GraphExtractionFailed {
            message: "every extraction call failed".into(),
            retry_after_secs: Some(90),
        });
        assert!(detail.contains("wait 90s"), "detail was: {}", detail);
        assert!(detail.contains("1m 30s"));
    }

    #[test]
    fn test_plain_errors_have_no_wait_pattern() {
        let detail = detail_message(&Error::NoDocument);
        assert!(!detail.contains("wait "));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::RateLimited {
                retry_after_secs: 1
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&Error::NoDocument), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&Error::UnsupportedFormat("docx".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::Provider("boom".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::GraphExtractionFailed {
                message: "failed".into(),
                retry_after_secs: None,
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::GraphExtractionFailed {
                message: "failed".into(),
                retry_after_secs: Some(30),
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(45), "45s");
        assert_eq!(human_duration(90), "1m 30s");
        assert_eq!(human_duration(3700), "1h 1m");
    }
}
