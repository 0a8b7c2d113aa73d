//! Failure modes of the toolkit.
//!
//! Every fallible call returns [`Result<T>`]. Handlers never let an
//! [`Error`] escape the dispatcher: it is logged against the event that
//! caused it and the extension keeps running.
//!
//! | Raised by | Variants |
//! |-----------|----------|
//! | Settings and storage | [`Error::Config`], [`Error::MissingConfiguration`] |
//! | Browser API | [`Error::HostCall`], [`Error::TabNotFound`], [`Error::BookmarkNotFound`] |
//! | Event routing | [`Error::UnknownCommand`], [`Error::InvalidArgument`] |
//! | Extension link | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Wire format | [`Error::Protocol`], [`Error::RequestTimeout`] |
//! | Wrapped | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`], [`Error::ChannelClosed`] |
//!
//! Relationship queries that match nothing succeed with an empty set; the
//! user sees a notification instead of an error.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{BookmarkId, RequestId, TabId};

/// Shorthand for results carrying this crate's [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Error
// ============================================================================

/// Everything that can go wrong while handling a browser event.
#[derive(Error, Debug)]
pub enum Error {
    /// Settings could not be used, e.g. a port that does not parse.
    #[error("Invalid configuration: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    /// A storage key the action depends on is unset or has the wrong shape.
    ///
    /// Logged at info level; the action is skipped.
    #[error("Missing configuration: {key}")]
    MissingConfiguration {
        /// Storage key that was read.
        key: String,
    },

    /// The extension reported a failed `module.method` call.
    #[error("Host call {operation} failed: {message}")]
    HostCall {
        /// Called method, such as `tabs.group`.
        operation: String,
        /// Reason given by the browser.
        message: String,
    },

    /// No tab with this ID is open.
    #[error("No such tab: {tab_id}")]
    TabNotFound {
        /// Requested tab.
        tab_id: TabId,
    },

    /// No bookmark or folder with this ID exists.
    #[error("No such bookmark: {bookmark_id}")]
    BookmarkNotFound {
        /// Requested bookmark.
        bookmark_id: BookmarkId,
    },

    /// A menu item or keyboard shortcut nobody handles.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// Menu item ID or command name as received.
        command: String,
    },

    /// An event arrived without data its handler needs.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was missing or out of range.
        message: String,
    },

    /// The WebSocket link to the extension could not be set up.
    #[error("Extension link failed: {message}")]
    Connection {
        /// Underlying reason.
        message: String,
    },

    /// The extension did not connect in time.
    #[error("Extension did not connect within {timeout_ms}ms")]
    ConnectionTimeout {
        /// Time waited.
        timeout_ms: u64,
    },

    /// The extension went away while calls were in flight.
    #[error("Extension disconnected")]
    ConnectionClosed,

    /// A frame that does not fit the message format.
    #[error("Protocol error: {message}")]
    Protocol {
        /// What did not fit.
        message: String,
    },

    /// A host call got no response in time.
    #[error("No response to {request_id} within {timeout_ms}ms")]
    RequestTimeout {
        /// Unanswered request.
        request_id: RequestId,
        /// Time waited.
        timeout_ms: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A pending call's reply channel was dropped.
    #[error("Reply channel dropped")]
    ChannelClosed(#[from] RecvError),
}

impl Error {
    // ========================================================================
    // Constructors
    // ========================================================================

    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[inline]
    pub fn missing_configuration(key: impl Into<String>) -> Self {
        Self::MissingConfiguration { key: key.into() }
    }

    /// Failure of the browser method `operation`.
    #[inline]
    pub fn host_call(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostCall {
            operation: operation.into(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn tab_not_found(tab_id: TabId) -> Self {
        Self::TabNotFound { tab_id }
    }

    #[inline]
    pub fn bookmark_not_found(bookmark_id: BookmarkId) -> Self {
        Self::BookmarkNotFound { bookmark_id }
    }

    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Something was waited on for too long.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// The link to the extension is unusable.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// The browser rejected a call or the target entity is gone.
    #[inline]
    #[must_use]
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            Self::HostCall { .. } | Self::TabNotFound { .. } | Self::BookmarkNotFound { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_host_call_names_method() {
        let err = Error::host_call("tabs.executeScript", "Missing host permission");
        assert_eq!(
            err.to_string(),
            "Host call tabs.executeScript failed: Missing host permission"
        );
        assert!(err.is_host_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_missing_configuration_names_key() {
        let err = Error::missing_configuration("selectors");
        assert_eq!(err.to_string(), "Missing configuration: selectors");
        assert!(!err.is_host_error());
    }

    #[test]
    fn test_timeouts() {
        let request = RequestId::generate();
        assert!(Error::connection_timeout(5000).is_timeout());
        assert!(Error::request_timeout(request, 30_000).is_timeout());
        assert!(!Error::ConnectionClosed.is_timeout());
    }

    #[test]
    fn test_link_failures() {
        assert!(Error::connection("refused").is_connection_error());
        assert!(Error::connection_timeout(10).is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("bad port").is_connection_error());
        assert!(!Error::protocol("garbage").is_connection_error());
    }

    #[test]
    fn test_missing_entities_are_host_errors() {
        let tab = TabId::new(3).expect("valid tab id");
        assert!(Error::tab_not_found(tab).is_host_error());
        assert!(Error::bookmark_not_found(BookmarkId::new("menu________")).is_host_error());
        assert!(!Error::unknown_command("Frobnicate").is_host_error());
        assert!(!Error::invalid_argument("no srcUrl").is_host_error());
    }

    #[test]
    fn test_wrapped_errors() {
        let err: Error = IoError::new(ErrorKind::NotFound, "file not found").into();
        assert!(matches!(err, Error::Io(_)));

        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::Url(_)));

        let err: Error = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
