//! Command definitions organized by host API namespace.
//!
//! Commands follow the host's `namespace.methodName` naming so the remote
//! end can dispatch them straight onto `browser.*`.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `tabs` | query, get, create, highlight, group, executeScript |
//! | `tabGroups` | update |
//! | `bookmarks` | search, get, getChildren |
//! | `storage` | local get/set |
//! | `clipboard` | writeText, writeHtml |
//! | `downloads` | download |
//! | `notifications` | create |
//! | `menus` | create, removeAll |
//! | `browserAction` | blink |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{BookmarkId, GroupId, TabId, WindowId};
use crate::tabs::TabQuery;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by namespace.
///
/// This enum wraps namespace-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// `tabs` namespace.
    Tabs(TabsCommand),
    /// `tabGroups` namespace.
    TabGroups(TabGroupsCommand),
    /// `bookmarks` namespace.
    Bookmarks(BookmarksCommand),
    /// `storage` namespace.
    Storage(StorageCommand),
    /// Clipboard writes.
    Clipboard(ClipboardCommand),
    /// `downloads` namespace.
    Downloads(DownloadsCommand),
    /// `notifications` namespace.
    Notifications(NotificationsCommand),
    /// `menus` namespace.
    Menus(MenusCommand),
    /// `browserAction` namespace.
    BrowserAction(BrowserActionCommand),
}

impl Command {
    /// Returns the wire method name, used in logs and error messages.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Tabs(TabsCommand::Query(_)) => "tabs.query",
            Self::Tabs(TabsCommand::Get { .. }) => "tabs.get",
            Self::Tabs(TabsCommand::Create(_)) => "tabs.create",
            Self::Tabs(TabsCommand::Highlight { .. }) => "tabs.highlight",
            Self::Tabs(TabsCommand::Group { .. }) => "tabs.group",
            Self::Tabs(TabsCommand::ExecuteScript { .. }) => "tabs.executeScript",
            Self::TabGroups(TabGroupsCommand::Update { .. }) => "tabGroups.update",
            Self::Bookmarks(BookmarksCommand::Search { .. }) => "bookmarks.search",
            Self::Bookmarks(BookmarksCommand::Get { .. }) => "bookmarks.get",
            Self::Bookmarks(BookmarksCommand::GetChildren { .. }) => "bookmarks.getChildren",
            Self::Storage(StorageCommand::Get { .. }) => "storage.local.get",
            Self::Storage(StorageCommand::Set { .. }) => "storage.local.set",
            Self::Clipboard(ClipboardCommand::WriteText { .. }) => "clipboard.writeText",
            Self::Clipboard(ClipboardCommand::WriteHtml { .. }) => "clipboard.writeHtml",
            Self::Downloads(DownloadsCommand::Download { .. }) => "downloads.download",
            Self::Notifications(NotificationsCommand::Create { .. }) => "notifications.create",
            Self::Menus(MenusCommand::Create(_)) => "menus.create",
            Self::Menus(MenusCommand::RemoveAll) => "menus.removeAll",
            Self::BrowserAction(BrowserActionCommand::Blink) => "browserAction.blink",
        }
    }
}

// ============================================================================
// Tabs Commands
// ============================================================================

/// `tabs` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabsCommand {
    /// Query tabs matching a filter.
    #[serde(rename = "tabs.query")]
    Query(TabQuery),

    /// Get one tab by ID.
    #[serde(rename = "tabs.get")]
    Get {
        /// Tab ID.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },

    /// Open a new tab.
    #[serde(rename = "tabs.create")]
    Create(CreateTab),

    /// Highlight tabs by index within one window.
    #[serde(rename = "tabs.highlight")]
    Highlight {
        /// Target window.
        #[serde(rename = "windowId")]
        window_id: WindowId,
        /// Tab indices; the first becomes active.
        tabs: Vec<u32>,
        /// Whether the host should return populated window info.
        populate: bool,
    },

    /// Move tabs into a new group.
    #[serde(rename = "tabs.group")]
    Group {
        /// Tabs to group.
        #[serde(rename = "tabIds")]
        tab_ids: Vec<TabId>,
    },

    /// Run a script in a tab.
    ///
    /// `args` are passed to the script as structured values, never spliced
    /// into its source.
    #[serde(rename = "tabs.executeScript")]
    ExecuteScript {
        /// Target tab (`None` = active tab of the current window).
        #[serde(rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
        /// Script source.
        code: String,
        /// Script arguments.
        #[serde(default)]
        args: Vec<Value>,
    },
}

// ============================================================================
// TabGroups Commands
// ============================================================================

/// `tabGroups` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabGroupsCommand {
    /// Rename and collapse/expand a group.
    #[serde(rename = "tabGroups.update")]
    Update {
        /// Target group.
        #[serde(rename = "groupId")]
        group_id: GroupId,
        /// New properties.
        #[serde(flatten)]
        update: GroupUpdate,
    },
}

// ============================================================================
// Bookmarks Commands
// ============================================================================

/// `bookmarks` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum BookmarksCommand {
    /// Search bookmarks (empty query returns all).
    #[serde(rename = "bookmarks.search")]
    Search {
        /// Search string.
        query: String,
    },

    /// Get one bookmark node.
    #[serde(rename = "bookmarks.get")]
    Get {
        /// Node ID.
        id: BookmarkId,
    },

    /// Get the direct children of a folder.
    #[serde(rename = "bookmarks.getChildren")]
    GetChildren {
        /// Folder ID.
        id: BookmarkId,
    },
}

// ============================================================================
// Storage Commands
// ============================================================================

/// `storage.local` commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum StorageCommand {
    /// Read one key.
    #[serde(rename = "storage.local.get")]
    Get {
        /// Storage key.
        key: String,
    },

    /// Write one key.
    #[serde(rename = "storage.local.set")]
    Set {
        /// Storage key.
        key: String,
        /// Stored value.
        value: Value,
    },
}

// ============================================================================
// Clipboard Commands
// ============================================================================

/// Clipboard commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ClipboardCommand {
    /// Write plain text.
    #[serde(rename = "clipboard.writeText")]
    WriteText {
        /// Text to copy.
        text: String,
    },

    /// Write `text/html` (with a plain text fallback on the remote end).
    #[serde(rename = "clipboard.writeHtml")]
    WriteHtml {
        /// HTML to copy.
        html: String,
    },
}

// ============================================================================
// Downloads Commands
// ============================================================================

/// `downloads` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum DownloadsCommand {
    /// Download a URL (data URLs carry generated content).
    #[serde(rename = "downloads.download")]
    Download {
        /// Source URL.
        url: String,
        /// Suggested file name.
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        /// Ask the user where to save.
        #[serde(rename = "saveAs")]
        save_as: bool,
    },
}

// ============================================================================
// Notifications Commands
// ============================================================================

/// `notifications` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum NotificationsCommand {
    /// Show a basic notification.
    #[serde(rename = "notifications.create")]
    Create {
        /// Notification title.
        title: String,
        /// Notification body.
        message: String,
        /// Icon path inside the extension.
        #[serde(rename = "iconUrl")]
        icon_url: String,
    },
}

// ============================================================================
// Menus Commands
// ============================================================================

/// `menus` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum MenusCommand {
    /// Create a menu item.
    #[serde(rename = "menus.create")]
    Create(MenuItem),

    /// Remove every menu item of the extension.
    #[serde(rename = "menus.removeAll")]
    RemoveAll,
}

// ============================================================================
// BrowserAction Commands
// ============================================================================

/// `browserAction` namespace commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowserActionCommand {
    /// Briefly flash the toolbar badge to acknowledge an action.
    #[serde(rename = "browserAction.blink")]
    Blink,
}

// ============================================================================
// CreateTab
// ============================================================================

/// Properties for a new tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTab {
    /// URL to open.
    pub url: String,
    /// Whether the new tab becomes active.
    pub active: bool,
    /// Container for the new tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_store_id: Option<String>,
}

impl CreateTab {
    /// Creates a background tab request.
    #[inline]
    #[must_use]
    pub fn background(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            active: false,
            cookie_store_id: None,
        }
    }

    /// Creates a foreground tab request.
    #[inline]
    #[must_use]
    pub fn foreground(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            active: true,
            cookie_store_id: None,
        }
    }

    /// Sets the container.
    #[inline]
    #[must_use]
    pub fn with_cookie_store(mut self, cookie_store_id: Option<String>) -> Self {
        self.cookie_store_id = cookie_store_id;
        self
    }
}

// ============================================================================
// GroupUpdate
// ============================================================================

/// New properties for a tab group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdate {
    /// Group label.
    pub title: String,
    /// Whether the group is collapsed.
    pub collapsed: bool,
}

impl GroupUpdate {
    /// Creates a group update.
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, collapsed: bool) -> Self {
        Self {
            title: title.into(),
            collapsed,
        }
    }
}

// ============================================================================
// BookmarkNode
// ============================================================================

/// A bookmark or bookmark folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    /// Node ID.
    pub id: BookmarkId,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// URL (`None` for folders and separators).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Parent folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BookmarkId>,
}

impl BookmarkNode {
    /// Creates a bookmark.
    #[must_use]
    pub fn bookmark(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: BookmarkId::new(id),
            title: title.into(),
            url: Some(url.into()),
            parent_id: None,
        }
    }

    /// Creates a folder.
    #[must_use]
    pub fn folder(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: BookmarkId::new(id),
            title: title.into(),
            url: None,
            parent_id: None,
        }
    }

    /// Sets the parent folder.
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: BookmarkId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Returns `true` for nodes with a URL.
    #[inline]
    #[must_use]
    pub fn is_bookmark(&self) -> bool {
        self.url.is_some()
    }
}

// ============================================================================
// MenuItem
// ============================================================================

/// Where a menu item is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuContext {
    /// Tab strip context menu.
    Tab,
    /// Page context menu.
    Page,
    /// Bookmark context menu.
    Bookmark,
    /// Image context menu.
    Image,
}

/// Kind of menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemType {
    /// Clickable entry.
    #[default]
    Normal,
    /// Divider line.
    Separator,
}

/// A context menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Item ID, reported back in `menus.onClicked`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Parent item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Contexts the item appears in.
    pub contexts: Vec<MenuContext>,
    /// Item kind.
    #[serde(default, rename = "type")]
    pub item_type: MenuItemType,
}

impl MenuItem {
    /// Creates a normal item.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, contexts: &[MenuContext]) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            parent_id: None,
            contexts: contexts.to_vec(),
            item_type: MenuItemType::Normal,
        }
    }

    /// Creates an anonymous separator.
    #[must_use]
    pub fn separator(contexts: &[MenuContext]) -> Self {
        Self {
            id: None,
            title: None,
            parent_id: None,
            contexts: contexts.to_vec(),
            item_type: MenuItemType::Separator,
        }
    }

    /// Nests the item under a parent.
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
