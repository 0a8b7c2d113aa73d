//! Host calls and their replies.
//!
//! Every call the local end makes is a [`Request`] carrying a fresh
//! [`RequestId`]. The extension answers each one with exactly one
//! [`Response`] under the same ID, either a result or a failure.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// One host API call.
///
/// ```json
/// { "id": "uuid", "method": "tabs.highlight", "params": { "windowId": 1, "tabs": [0, 2] } }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Correlates the reply.
    pub id: RequestId,

    /// Method and params, flattened into the message.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Wraps `command` under a freshly generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self::with_id(RequestId::generate(), command)
    }

    /// Wraps `command` under a caller-chosen ID.
    #[inline]
    #[must_use]
    pub fn with_id(id: RequestId, command: Command) -> Self {
        Self { id, command }
    }

    /// Returns the wire method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.command.method()
    }
}

// ============================================================================
// Response
// ============================================================================

/// The extension's reply to a [`Request`].
///
/// ```json
/// { "id": "uuid", "type": "success", "result": [{ "id": 4, "windowId": 1 }] }
/// { "id": "uuid", "type": "error", "error": "tabs", "message": "Invalid tab ID: 99" }
/// ```
///
/// The READY handshake arrives in the same shape under the nil ID.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// ID of the request being answered.
    pub id: RequestId,

    /// Outcome.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Listener return value on success. Absent for `void` host calls.
    #[serde(default)]
    pub result: Option<Value>,

    /// Short failure category, e.g. the host namespace that threw.
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable failure text.
    #[serde(default)]
    pub message: Option<String>,
}

impl Response {
    /// Returns `true` if the call succeeded.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.response_type, ResponseType::Success)
    }

    /// Returns `true` if the host reported a failure.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    /// Converts the reply into the call's return value.
    ///
    /// A successful `void` call yields `null`.
    ///
    /// # Errors
    ///
    /// [`Error::HostCall`] for `operation` when the host reported a failure.
    /// The message prefers `message`, then `error`.
    pub fn into_result(self, operation: &str) -> Result<Value> {
        if self.is_success() {
            return Ok(self.result.unwrap_or_default());
        }

        let reason = self
            .message
            .or(self.error)
            .unwrap_or_else(|| "no reason given".to_string());
        Err(Error::host_call(operation, reason))
    }

    /// Looks up a string field of an object result.
    ///
    /// Missing fields and non-strings read as `""`.
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.field(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default()
    }

    /// Looks up an unsigned integer field of an object result.
    ///
    /// Missing fields and non-integers read as `0`.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> u64 {
        self.field(key).and_then(Value::as_u64).unwrap_or_default()
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.result.as_ref()?.get(key)
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Outcome tag of a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// The host call returned.
    Success,
    /// The host call threw.
    Error,
}

// ============================================================================
// Tests
// ============================================================================
