//! Host browser collaborator.
//!
//! Every handler in this crate talks to the browser only through the
//! [`Host`] trait, so the same decision logic runs against the live
//! extension ([`RemoteHost`]) or an in-memory model ([`MemoryHost`]).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `remote` | [`Host`] over the WebSocket [`Connection`](crate::transport::Connection) |
//! | `memory` | Recording in-memory browser |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{BookmarkId, GroupId, TabId, WindowId};
use crate::protocol::{BookmarkNode, CreateTab, GroupUpdate, MenuItem};
use crate::tabs::{Tab, TabQuery};

// ============================================================================
// Submodules
// ============================================================================

mod memory;
mod remote;

pub use memory::{MemoryHost, ScriptCall, ScriptHandler};
pub use remote::RemoteHost;

// ============================================================================
// Host
// ============================================================================

/// Browser API surface used by the extension handlers.
///
/// Each method maps onto one host API call. Implementations must be cheap
/// to share between tasks.
#[async_trait]
pub trait Host: Send + Sync {
    /// Returns tabs matching `query`, in window/index order.
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>>;

    /// Returns one tab.
    ///
    /// # Errors
    ///
    /// [`Error::TabNotFound`](crate::Error::TabNotFound) if the tab is gone.
    async fn get_tab(&self, tab_id: TabId) -> Result<Tab>;

    /// Opens a tab.
    async fn create_tab(&self, props: &CreateTab) -> Result<Tab>;

    /// Highlights the tabs at `indices` in `window_id`. The first index
    /// becomes the active tab.
    async fn highlight_tabs(&self, window_id: WindowId, indices: &[u32]) -> Result<()>;

    /// Moves tabs into a new group.
    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId>;

    /// Retitles and collapses/expands a group.
    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<()>;

    /// Runs `code` in a tab (`None` = active tab) and returns its completion
    /// value. `args` reach the script as structured values.
    async fn execute_in_tab(
        &self,
        tab_id: Option<TabId>,
        code: &str,
        args: &[Value],
    ) -> Result<Value>;

    /// Writes plain text to the clipboard.
    async fn write_clipboard_text(&self, text: &str) -> Result<()>;

    /// Writes HTML to the clipboard.
    async fn write_clipboard_html(&self, html: &str) -> Result<()>;

    /// Offers `text` as a single download, asking the user where to save.
    async fn save_text_to_file(&self, text: &str, filename: &str) -> Result<()>;

    /// Downloads each output as its own file.
    async fn download_each_as_file(&self, outputs: &[String]) -> Result<()>;

    /// Reads a local storage key.
    async fn storage_get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a local storage key.
    async fn storage_set(&self, key: &str, value: Value) -> Result<()>;

    /// Searches bookmarks. An empty query returns every node.
    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkNode>>;

    /// Returns one bookmark node.
    async fn get_bookmark(&self, id: &BookmarkId) -> Result<BookmarkNode>;

    /// Returns the direct children of a folder.
    async fn bookmark_children(&self, id: &BookmarkId) -> Result<Vec<BookmarkNode>>;

    /// Shows a basic notification.
    async fn notify(&self, title: &str, message: &str) -> Result<()>;

    /// Adds a context menu item.
    async fn create_menu(&self, item: &MenuItem) -> Result<()>;

    /// Removes every context menu item this extension created.
    async fn remove_all_menus(&self) -> Result<()>;

    /// Blinks the toolbar badge to acknowledge an action.
    async fn blink_badge(&self) -> Result<()>;

    /// Returns the active tab of the current window, if any.
    async fn active_tab(&self) -> Result<Option<Tab>> {
        let mut tabs = self.query_tabs(&TabQuery::active_tab()).await?;
        Ok(if tabs.is_empty() {
            None
        } else {
            Some(tabs.swap_remove(0))
        })
    }
}
