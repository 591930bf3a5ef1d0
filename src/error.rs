use reqwest::StatusCode;
use thiserror::Error;

/// Anything that aborts a page load. All variants take the same fallback path.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP {}", .0.as_u16())]
    Status(StatusCode),

    #[error("snapshot request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_reads_like_http_code() {
        let err = LoadError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "HTTP 500");
    }
}
