//! Request and response bodies of the alert endpoints, and how replies are judged.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::verification::VerificationResult;

/// Body of a request for a new code
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct OtpRequest {
    /// The address the code is sent to
    pub email: String,
}

/// Body of a code confirmation
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct OtpConfirmRequest {
    /// The address the code was sent to
    pub email: String,
    /// The six digit code
    pub otp: String,
}

/// Whatever subset of fields the proxy chose to answer with.
///
/// The upstream isn't consistent about types, so every field is kept as raw JSON.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct OtpResponse {
    /// `"ok"` or `"not ok"`, usually
    #[serde(default)]
    pub status: Option<Value>,
    /// Echo of the generated code on some deployments
    #[serde(default)]
    pub otp: Option<Value>,
    /// Human readable message, or `"ok"`
    #[serde(default)]
    pub message: Option<Value>,
}

impl OtpResponse {
    /// `status` if it is a string
    pub fn status_str(&self) -> Option<&str> {
        self.status.as_ref().and_then(Value::as_str)
    }

    /// `message` if it is a non-empty string
    pub fn message_text(&self) -> Option<String> {
        self.message
            .as_ref()
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// A received HTTP response: status code and the body, if it parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiReply {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body. `None` when missing or unparseable.
    pub body: Option<OtpResponse>,
}

impl ApiReply {
    /// Build a reply from raw response bytes. Parse failures yield an empty body.
    pub fn from_bytes(status: StatusCode, bytes: &[u8]) -> Self {
        let body = match serde_json::from_slice::<OtpResponse>(bytes) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!(%status, %e, "Response body is not a JSON object");
                None
            }
        };
        Self { status, body }
    }

    /// A reply carrying `body` as JSON.
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: serde_json::from_value(body).ok(),
        }
    }

    fn message(&self) -> Option<String> {
        self.body.as_ref().and_then(OtpResponse::message_text)
    }
}

/// Verdict on a request for a new code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OtpRequestOutcome {
    /// A code is on its way
    Accepted,
    /// The server declined, possibly explaining why
    Rejected {
        /// Server supplied message
        message: Option<String>,
    },
}

/// Decide whether a code request succeeded.
///
/// The proxy signals success inconsistently, so any of these counts: a 2xx
/// status, `status == "ok"`, a truthy `otp`, or `message == "ok"`.
pub fn interpret_otp_request_response(reply: &ApiReply) -> OtpRequestOutcome {
    let http_ok = reply.status.is_success();
    let api_ok = reply.body.as_ref().is_some_and(|body| {
        body.status_str() == Some("ok")
            || body.otp.as_ref().is_some_and(is_truthy)
            || body.message.as_ref().and_then(Value::as_str) == Some("ok")
    });

    if http_ok || api_ok {
        OtpRequestOutcome::Accepted
    } else {
        OtpRequestOutcome::Rejected {
            message: reply.message(),
        }
    }
}

/// Decide the outcome of a code confirmation from the JSON `status` field alone.
pub fn interpret_confirmation_response(reply: &ApiReply) -> VerificationResult {
    match reply.body.as_ref().and_then(OtpResponse::status_str) {
        Some("ok") => VerificationResult::Success,
        Some("not ok") => VerificationResult::InvalidCode,
        _ => VerificationResult::UnexpectedResponse {
            message: reply.message(),
        },
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
