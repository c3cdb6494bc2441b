use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback used when the error body of a failed response could not be read
/// and no status message is available.
pub const SERVER_ERROR_FALLBACK: &str = "server error";

/// Message for a failed response without any error body, and for consumers
/// that failed without a message of their own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Message of an [`NetworkError::Unexpected`] whose cause had nothing to say.
pub const UNEXPECTED_ERROR_FALLBACK: &str = "error occurred";

/// Failure modes produced by the request executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The request succeeded but carried no payload.
    #[error("response body is empty")]
    EmptyBody,
    /// The request raised an error or panicked before it could be classified.
    #[error("{message}")]
    Unexpected {
        /// Message of the contained error.
        message: String,
    },
    /// Non-2xx response or a failure reported by the API itself.
    #[error("{message} (code {code})")]
    Api {
        /// Error body text or best-effort fallback.
        message: String,
        /// Status code, `0` when unknown.
        code: u16,
    },
}

impl NetworkError {
    /// Build an [`NetworkError::Unexpected`] from any message.
    ///
    /// A blank message is replaced by [`UNEXPECTED_ERROR_FALLBACK`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNEXPECTED_ERROR_FALLBACK.to_owned()
        } else {
            message
        };
        Self::Unexpected { message }
    }

    /// Build an [`NetworkError::Api`] with an unknown (`0`) code.
    pub fn api(message: impl Into<String>) -> Self {
        Self::api_with_code(message, 0)
    }

    /// Build an [`NetworkError::Api`] carrying a status code.
    pub fn api_with_code(message: impl Into<String>, code: u16) -> Self {
        Self::Api {
            message: message.into(),
            code,
        }
    }
}

/// Catch-all for failures that do not originate in the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UnknownAppError {
    /// Human-readable message.
    pub message: String,
}

impl UnknownAppError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Root of every error that reaches presentation code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum AppError {
    /// Failure classified by the request executor.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Failure from outside the transport.
    #[error(transparent)]
    Unknown(#[from] UnknownAppError),
}

impl AppError {
    /// Text presentation code should show for this error.
    ///
    /// `EmptyBody` is a silent condition and yields `None`.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Network(NetworkError::EmptyBody) => None,
            Self::Network(NetworkError::Unexpected { message })
            | Self::Network(NetworkError::Api { message, .. })
            | Self::Unknown(UnknownAppError { message }) => Some(message.as_str()),
        }
    }

    /// Wrap a plain message as an [`UnknownAppError`].
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(UnknownAppError::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_code_defaults_to_zero() {
        assert_eq!(
            NetworkError::api("bad request"),
            NetworkError::Api {
                message: "bad request".into(),
                code: 0
            }
        );
    }

    #[test]
    fn empty_body_is_silent() {
        let err = AppError::from(NetworkError::EmptyBody);
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn surfaces_messages_for_visible_errors() {
        let api = AppError::from(NetworkError::api_with_code("not found", 404));
        let unexpected = AppError::from(NetworkError::unexpected("timed out"));
        let unknown = AppError::unknown("disk full");

        assert_eq!(api.user_message(), Some("not found"));
        assert_eq!(unexpected.user_message(), Some("timed out"));
        assert_eq!(unknown.user_message(), Some("disk full"));
    }

    #[test]
    fn blank_unexpected_message_uses_fallback() {
        let err = AppError::from(NetworkError::unexpected("  "));
        assert_eq!(err.user_message(), Some("error occurred"));
    }

    #[test]
    fn display_includes_api_code() {
        let err = NetworkError::api_with_code("not found", 404);
        assert_eq!(err.to_string(), "not found (code 404)");
    }

    #[test]
    fn serializes_with_stable_variant_names() {
        let err = AppError::from(NetworkError::api_with_code("gone", 410));
        let json = serde_json::to_string(&err).expect("error should serialize");
        assert_eq!(json, r#"{"Network":{"Api":{"message":"gone","code":410}}}"#);
    }
}
