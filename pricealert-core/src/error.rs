//! Error types of the subscription flow.
//!
//! None of these are fatal: every variant ends up as a notice to the user
//! and the flow stays on its current screen.

/// Failure of [`crate::alert_request::AlertRequest::request_otp`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The address didn't pass [`crate::email::validate_email`]. No request was made.
    #[error("invalid email address")]
    InvalidEmail,
    /// The server answered, but neither the status code nor the body signalled success.
    #[error("OTP request rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        /// Message supplied by the server, if any
        message: Option<String>,
    },
    /// The request never got an answer.
    #[error("network error: {0}")]
    Network(#[from] ApiError),
}

/// Failure of [`crate::verification::Verification::verify`] before any request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The entered code is not exactly six digits.
    #[error("the verification code must be exactly 6 digits")]
    InvalidFormat,
}

/// Transport-level failure talking to the alert endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Sending the request or receiving the response failed.
    #[error(transparent)]
    Transport(#[from] reqwest_middleware::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.into())
    }
}

/// Failure reading or writing the secure store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("secure store io error: {0}")]
    Io(#[from] std::io::Error),
    /// The store file exists but isn't a JSON object of strings
    #[error("secure store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_rejected_display_uses_server_message() {
        let err = RequestError::Rejected {
            message: Some("Email not registered".to_string()),
        };
        assert_eq!(err.to_string(), "OTP request rejected: Email not registered");

        let err = RequestError::Rejected { message: None };
        assert_eq!(err.to_string(), "OTP request rejected: no message");
    }
}
