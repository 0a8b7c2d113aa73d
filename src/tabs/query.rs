//! Tab query filters and URL match patterns.
//!
//! [`TabQuery`] mirrors the host's `tabs.query` filter object: every field is
//! optional and unset fields are omitted from the wire format.
//!
//! # Example
//!
//! ```ignore
//! use webext_tabkit::TabQuery;
//!
//! let query = TabQuery::current_window()
//!     .with_pinned(false)
//!     .with_url("*://example.com/*");
//! ```

// ============================================================================
// Imports
// ============================================================================

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::{GroupId, WindowId};

use super::tab::{Tab, TabStatus};

// ============================================================================
// Constants
// ============================================================================

/// Match pattern accepted by the host for "every URL the extension may touch".
pub const ALL_URLS: &str = "<all_urls>";

/// Schemes matched by [`ALL_URLS`].
const ALL_URLS_REGEX: &str = r"^(?:https?|wss?|ftp|file|data):";

// ============================================================================
// TabQuery
// ============================================================================

/// Filter for the host `tabs.query` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    /// Only tabs in the current window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,

    /// Only tabs in this window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,

    /// Active state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Highlighted state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,

    /// Hidden state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Pinned state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,

    /// Muted state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,

    /// Audible state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audible: Option<bool>,

    /// Discarded state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discarded: Option<bool>,

    /// Loading status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,

    /// URL match pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_store_id: Option<String>,

    /// Tab group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

// ============================================================================
// Constructors
// ============================================================================

impl TabQuery {
    /// Creates an empty query matching every tab.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible tabs of the current window.
    ///
    /// This is the base filter every selection handler starts from.
    #[inline]
    #[must_use]
    pub fn current_window() -> Self {
        Self {
            current_window: Some(true),
            hidden: Some(false),
            ..Default::default()
        }
    }

    /// The active tab of the current window.
    #[inline]
    #[must_use]
    pub fn active_tab() -> Self {
        Self {
            current_window: Some(true),
            active: Some(true),
            ..Default::default()
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TabQuery {
    /// Restricts to a window.
    #[inline]
    #[must_use]
    pub fn with_window(mut self, window_id: WindowId) -> Self {
        self.window_id = Some(window_id);
        self
    }

    /// Filters on active state.
    #[inline]
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Filters on highlighted state.
    #[inline]
    #[must_use]
    pub fn with_highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = Some(highlighted);
        self
    }

    /// Filters on hidden state.
    #[inline]
    #[must_use]
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Filters on pinned state.
    #[inline]
    #[must_use]
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    /// Filters on muted state.
    #[inline]
    #[must_use]
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }

    /// Filters on audible state.
    #[inline]
    #[must_use]
    pub fn with_audible(mut self, audible: bool) -> Self {
        self.audible = Some(audible);
        self
    }

    /// Filters on discarded state.
    #[inline]
    #[must_use]
    pub fn with_discarded(mut self, discarded: bool) -> Self {
        self.discarded = Some(discarded);
        self
    }

    /// Filters on loading status.
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TabStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters on a URL match pattern.
    #[inline]
    #[must_use]
    pub fn with_url(mut self, pattern: impl Into<String>) -> Self {
        self.url = Some(pattern.into());
        self
    }

    /// Filters on container.
    #[inline]
    #[must_use]
    pub fn with_cookie_store(mut self, cookie_store_id: impl Into<String>) -> Self {
        self.cookie_store_id = Some(cookie_store_id.into());
        self
    }

    /// Filters on tab group.
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

// ============================================================================
// Matching
// ============================================================================

impl TabQuery {
    /// Evaluates the filter against a tab.
    ///
    /// `current_window` is the window the host considers current; a query with
    /// `current_window: true` never matches when it is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the URL pattern is malformed.
    pub fn matches(&self, tab: &Tab, current_window: Option<WindowId>) -> Result<bool> {
        if self.current_window == Some(true) && current_window != Some(tab.window_id) {
            return Ok(false);
        }

        let flags = [
            (self.active, tab.active),
            (self.highlighted, tab.highlighted),
            (self.hidden, tab.hidden),
            (self.pinned, tab.pinned),
            (self.muted, tab.is_muted()),
            (self.audible, tab.audible),
            (self.discarded, tab.discarded),
        ];
        if flags
            .iter()
            .any(|(wanted, actual)| wanted.is_some_and(|w| w != *actual))
        {
            return Ok(false);
        }

        if self.window_id.is_some_and(|w| w != tab.window_id)
            || self.status.is_some_and(|s| s != tab.status)
            || self.group_id.is_some_and(|g| Some(g) != tab.group_id)
        {
            return Ok(false);
        }

        if let Some(ref store) = self.cookie_store_id
            && tab.cookie_store_id.as_deref() != Some(store.as_str())
        {
            return Ok(false);
        }

        if let Some(ref pattern) = self.url {
            return Ok(MatchPattern::parse(pattern)?.matches(&tab.url));
        }

        Ok(true)
    }
}

// ============================================================================
// MatchPattern
// ============================================================================

/// A compiled WebExtension URL match pattern (`<scheme>://<host><path>`).
#[derive(Debug, Clone)]
pub struct MatchPattern {
    regex: Regex,
}

impl MatchPattern {
    /// Compiles a match pattern.
    ///
    /// Supports `<all_urls>`, `*` and literal schemes, `*`, `*.domain` and
    /// literal hosts, and `*` wildcards in the path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for patterns without `://` or a path.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern == ALL_URLS {
            return Self::compile(ALL_URLS_REGEX);
        }

        let (scheme, rest) = pattern
            .split_once("://")
            .ok_or_else(|| Error::invalid_argument(format!("invalid match pattern: {pattern}")))?;
        let slash = rest
            .find('/')
            .ok_or_else(|| Error::invalid_argument(format!("match pattern has no path: {pattern}")))?;
        let (host, path) = rest.split_at(slash);

        let scheme_re = match scheme {
            "*" => "https?".to_string(),
            other => regex::escape(other),
        };

        let host_re = match host {
            "*" => "[^/]*".to_string(),
            h if h.starts_with("*.") => format!(r"(?:[^/]*\.)?{}", regex::escape(&h[2..])),
            h => regex::escape(h),
        };

        let path_re = regex::escape(path).replace(r"\*", ".*");

        Self::compile(&format!("^{scheme_re}://{host_re}(?::\\d+)?{path_re}$"))
    }

    fn compile(source: &str) -> Result<Self> {
        let regex = Regex::new(source)
            .map_err(|e| Error::invalid_argument(format!("match pattern regex: {e}")))?;
        Ok(Self { regex })
    }

    /// Returns `true` if the URL (without fragment) matches.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let without_fragment = url.split('#').next().unwrap_or_default();
        self.regex.is_match(without_fragment)
    }
}

// ============================================================================
// Tests
// ============================================================================
