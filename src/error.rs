use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the ads backend, or input rejected before a request
/// was ever sent.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    /// Build a status error from a response body, preferring the backend's
    /// `{"detail": ...}` message over the raw text.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_owned()
                } else {
                    trimmed.to_owned()
                }
            });

        ApiError::Status { status, detail }
    }

    /// Message suitable for an operator-facing notice.
    pub fn notice(&self) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            ApiError::Invalid(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_backend_detail() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"domain already in blacklist"}"#,
        );
        assert_eq!(err.notice(), "domain already in blacklist");
    }

    #[test]
    fn status_error_falls_back_to_reason_phrase() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.notice(), "Not Found");

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.notice(), "upstream down");
    }
}
