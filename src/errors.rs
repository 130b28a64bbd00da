use http::StatusCode;
use serde::Deserialize;

use crate::models::OperationResult;

/// User-facing message for requests that never produced a usable response.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// Failure taxonomy inside the transport. Nothing of this type escapes the
/// transport boundary; every variant is folded into an [`OperationResult`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to save {filename}: {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Error body shapes the backend is known to send on non-OK responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendErrorBody {
    /// Extracts the most specific message from a raw error body, if any.
    pub(crate) fn message_from(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<BackendErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message.or(parsed.error))
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    }
}

impl TransportError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(status: StatusCode, body: &[u8]) -> Self {
        Self::Status {
            status,
            message: BackendErrorBody::message_from(body),
        }
    }

    /// True when the user should see the generic network message.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_) | Self::Url(_))
    }

    /// Message shown to the user. `fallback` names the failed operation and is
    /// used when the backend did not explain a non-OK status.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Status { message: None, .. } => fallback.to_string(),
            Self::Io { filename, .. } => format!("Failed to save {}", filename),
            Self::Network(_) | Self::Decode(_) | Self::Url(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    /// Diagnostic detail kept alongside the user message.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Validation(_) => None,
            Self::Status { status, .. } => Some(format!("HTTP {}", status.as_u16())),
            _ => Some(self.to_string()),
        }
    }

    pub fn into_result<T>(self, fallback: &str) -> OperationResult<T> {
        OperationResult::failure(self.user_message(fallback), self.detail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefers_backend_message() {
        let err = TransportError::status(
            StatusCode::BAD_REQUEST,
            br#"{"message":"Report name is required"}"#,
        );
        assert_eq!(
            err.user_message("Failed to generate report"),
            "Report name is required"
        );
        assert_eq!(err.detail().as_deref(), Some("HTTP 400"));
    }

    #[test]
    fn status_accepts_error_field() {
        let err = TransportError::status(StatusCode::FORBIDDEN, br#"{"error":"Admin only"}"#);
        assert_eq!(err.user_message("Failed to fetch reports"), "Admin only");
    }

    #[test]
    fn status_without_body_uses_fallback() {
        let err = TransportError::status(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(
            err.user_message("Failed to download report"),
            "Failed to download report"
        );
    }

    #[test]
    fn blank_backend_message_is_ignored() {
        let err = TransportError::status(StatusCode::BAD_GATEWAY, br#"{"message":"   "}"#);
        assert_eq!(err.user_message("Failed to send email"), "Failed to send email");
    }

    #[test]
    fn decode_errors_surface_as_network_errors() {
        let err = TransportError::Decode("expected value at line 1".into());
        assert!(err.is_network());
        assert_eq!(err.user_message("ignored"), NETWORK_ERROR_MESSAGE);
        assert!(err.detail().unwrap().contains("expected value"));
    }

    #[test]
    fn io_failures_name_the_file() {
        let err = TransportError::Io {
            filename: "Monthly_42.pdf".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let result: OperationResult<()> = err.into_result("Failed to download report");
        assert!(!result.success);
        assert_eq!(result.message, "Failed to save Monthly_42.pdf");
        assert!(result.error.is_some());
    }
}
