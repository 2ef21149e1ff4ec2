//! Email addresses as entered by the user.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RequestError;

/// Returns whether `candidate` is acceptable as an email address.
///
/// This is deliberately permissive: any non-empty string containing an `@`
/// passes. The server is the authority on deliverability.
pub fn validate_email(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.contains('@')
}

/// An email address that passed [`validate_email`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse a user-entered address.
    pub fn parse(candidate: impl Into<String>) -> Result<Self, RequestError> {
        let candidate = candidate.into();
        if validate_email(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(RequestError::InvalidEmail)
        }
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
