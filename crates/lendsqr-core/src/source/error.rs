use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => FetchError::AccessDenied(truncated),
            404 => FetchError::NotFound(truncated),
            500..=599 => FetchError::ServerError(truncated),
            _ => FetchError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            FetchError::from_status(StatusCode::NOT_FOUND, "missing"),
            FetchError::NotFound(body) if body == "missing"
        ));
        assert!(matches!(
            FetchError::from_status(StatusCode::BAD_GATEWAY, ""),
            FetchError::ServerError(_)
        ));
        assert!(matches!(
            FetchError::from_status(StatusCode::FORBIDDEN, ""),
            FetchError::AccessDenied(_)
        ));
        assert!(matches!(
            FetchError::from_status(StatusCode::IM_A_TEAPOT, "short"),
            FetchError::InvalidResponse(msg) if msg.contains("418")
        ));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "₦".repeat(400);
        let truncated = FetchError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < body.len());
    }
}
