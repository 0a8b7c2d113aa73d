//! Tab data model as reported by the host browser.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::identifiers::{GroupId, TabId, WindowId, deserialize_optional_group};

// ============================================================================
// TabStatus
// ============================================================================

/// Loading status of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    /// Page is loading.
    Loading,
    /// Page finished loading.
    #[default]
    Complete,
    /// Tab content was unloaded.
    Unloaded,
}

impl TabStatus {
    /// Returns the host string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Complete => "complete",
            Self::Unloaded => "unloaded",
        }
    }
}

// ============================================================================
// MutedInfo
// ============================================================================

/// Mute state of a tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutedInfo {
    /// Whether the tab is muted.
    #[serde(default)]
    pub muted: bool,
}

// ============================================================================
// Tab
// ============================================================================

/// A snapshot of one browser tab.
///
/// Tabs are owned and mutated by the host; values of this type are read-only
/// copies taken at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Tab ID.
    pub id: TabId,

    /// Tab that spawned this one, if it is still open in the same window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener_tab_id: Option<TabId>,

    /// Window containing the tab.
    pub window_id: WindowId,

    /// Zero-based position within the window.
    #[serde(default)]
    pub index: u32,

    /// Current URL.
    #[serde(default)]
    pub url: String,

    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Whether the tab is the active tab of its window.
    #[serde(default)]
    pub active: bool,

    /// Whether the tab is pinned.
    #[serde(default)]
    pub pinned: bool,

    /// Whether the tab is highlighted (selected).
    #[serde(default)]
    pub highlighted: bool,

    /// Whether the tab is hidden.
    #[serde(default)]
    pub hidden: bool,

    /// Whether the tab is producing sound.
    #[serde(default)]
    pub audible: bool,

    /// Whether the tab content is discarded.
    #[serde(default)]
    pub discarded: bool,

    /// Mute state.
    #[serde(default)]
    pub muted_info: MutedInfo,

    /// Loading status.
    #[serde(default)]
    pub status: TabStatus,

    /// Contextual identity (container) of the tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_store_id: Option<String>,

    /// Tab group, if grouped.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_group",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_id: Option<GroupId>,
}

// ============================================================================
// Constructors
// ============================================================================

impl Tab {
    /// Creates a tab with default flags.
    #[must_use]
    pub fn new(id: TabId, window_id: WindowId) -> Self {
        Self {
            id,
            opener_tab_id: None,
            window_id,
            index: 0,
            url: String::new(),
            title: None,
            active: false,
            pinned: false,
            highlighted: false,
            hidden: false,
            audible: false,
            discarded: false,
            muted_info: MutedInfo::default(),
            status: TabStatus::Complete,
            cookie_store_id: None,
            group_id: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Tab {
    /// Sets the opener tab.
    #[inline]
    #[must_use]
    pub fn with_opener(mut self, opener: TabId) -> Self {
        self.opener_tab_id = Some(opener);
        self
    }

    /// Sets the window index.
    #[inline]
    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Sets the URL.
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Marks the tab active.
    #[inline]
    #[must_use]
    pub fn with_active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Marks the tab pinned.
    #[inline]
    #[must_use]
    pub fn with_pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Marks the tab highlighted.
    #[inline]
    #[must_use]
    pub fn with_highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }

    /// Marks the tab hidden.
    #[inline]
    #[must_use]
    pub fn with_hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks the tab audible.
    #[inline]
    #[must_use]
    pub fn with_audible(mut self) -> Self {
        self.audible = true;
        self
    }

    /// Marks the tab muted.
    #[inline]
    #[must_use]
    pub fn with_muted(mut self) -> Self {
        self.muted_info.muted = true;
        self
    }

    /// Marks the tab discarded.
    #[inline]
    #[must_use]
    pub fn with_discarded(mut self) -> Self {
        self.discarded = true;
        self
    }

    /// Sets the loading status.
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TabStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the container.
    #[inline]
    #[must_use]
    pub fn with_cookie_store(mut self, cookie_store_id: impl Into<String>) -> Self {
        self.cookie_store_id = Some(cookie_store_id.into());
        self
    }

    /// Sets the tab group.
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Tab {
    /// Returns `true` if the tab is muted.
    #[inline]
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted_info.muted
    }

    /// Returns the hostname of the tab URL, if it has one.
    #[must_use]
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Returns `true` if the URL uses an `http` or `https` scheme.
    #[inline]
    #[must_use]
    pub fn is_web_page(&self) -> bool {
        self.url.starts_with("http")
    }
}

// ============================================================================
// Tests
// ============================================================================
