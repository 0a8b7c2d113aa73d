//! In-memory [`Host`] that models a browser and records every mutating call.
//!
//! `MemoryHost` answers tab queries with the same filter semantics the host
//! uses ([`TabQuery::matches`]) and keeps highlight/group state consistent
//! with the calls made, so handler tests can assert on both the calls and
//! the resulting browser state.
//!
//! # Example
//!
//! ```ignore
//! let host = MemoryHost::new(WindowId::new(1)).with_tabs(tabs);
//! Selection::Children.run(&host, &ctx).await?;
//! assert_eq!(host.highlights(), vec![(WindowId::new(1), vec![1, 2])]);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::{BookmarkId, GroupId, TabId, WindowId};
use crate::protocol::{BookmarkNode, CreateTab, GroupUpdate, MenuItem};
use crate::tabs::{Tab, TabQuery, TabStatus};

use super::Host;

// ============================================================================
// Types
// ============================================================================

/// One recorded `execute_in_tab` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
    /// Target tab, already resolved (`None` only if no tab was active).
    pub tab_id: Option<TabId>,
    /// Script source.
    pub code: String,
    /// Structured script arguments.
    pub args: Vec<Value>,
}

/// Computes the completion value of a script call.
pub type ScriptHandler = Arc<dyn Fn(&ScriptCall) -> Result<Value> + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    tabs: Vec<Tab>,
    next_tab_id: u32,
    next_group_id: u32,
    storage: FxHashMap<String, Value>,
    bookmarks: Vec<BookmarkNode>,
    failing: FxHashSet<String>,

    highlights: Vec<(WindowId, Vec<u32>)>,
    groups: Vec<(GroupId, Vec<TabId>)>,
    group_updates: Vec<(GroupId, GroupUpdate)>,
    script_calls: Vec<ScriptCall>,
    clipboard_text: Vec<String>,
    clipboard_html: Vec<String>,
    saved_files: Vec<(String, String)>,
    downloads: Vec<Vec<String>>,
    notifications: Vec<(String, String)>,
    menus: Vec<MenuItem>,
    menu_resets: usize,
    blinks: usize,
}

// ============================================================================
// MemoryHost
// ============================================================================

/// In-memory browser model.
///
/// Cloning shares state.
#[derive(Clone)]
pub struct MemoryHost {
    current_window: WindowId,
    state: Arc<Mutex<MemoryState>>,
    script_handler: Option<ScriptHandler>,
}

impl MemoryHost {
    /// Creates an empty browser whose current window is `current_window`.
    #[must_use]
    pub fn new(current_window: WindowId) -> Self {
        Self {
            current_window,
            state: Arc::new(Mutex::new(MemoryState {
                next_tab_id: 1,
                next_group_id: 1,
                ..MemoryState::default()
            })),
            script_handler: None,
        }
    }

    /// Adds tabs. Tab order is the order the host reports them in.
    #[must_use]
    pub fn with_tabs(self, tabs: impl IntoIterator<Item = Tab>) -> Self {
        {
            let mut state = self.state.lock();
            for tab in tabs {
                state.next_tab_id = state.next_tab_id.max(tab.id.as_u32() + 1);
                if let Some(group) = tab.group_id {
                    state.next_group_id = state.next_group_id.max(group.as_u32() + 1);
                }
                state.tabs.push(tab);
            }
        }
        self
    }

    /// Seeds a storage key.
    #[must_use]
    pub fn with_storage(self, key: impl Into<String>, value: Value) -> Self {
        self.state.lock().storage.insert(key.into(), value);
        self
    }

    /// Adds bookmark nodes.
    #[must_use]
    pub fn with_bookmarks(self, nodes: impl IntoIterator<Item = BookmarkNode>) -> Self {
        self.state.lock().bookmarks.extend(nodes);
        self
    }

    /// Sets the function that produces script results.
    ///
    /// Without a handler every script completes with `null`.
    #[must_use]
    pub fn with_script_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ScriptCall) -> Result<Value> + Send + Sync + 'static,
    {
        self.script_handler = Some(Arc::new(handler));
        self
    }

    /// Makes every call of the named host operation fail.
    ///
    /// Operation names are the protocol methods, e.g. `storage.local.get`.
    #[must_use]
    pub fn with_failure(self, operation: impl Into<String>) -> Self {
        self.state.lock().failing.insert(operation.into());
        self
    }

    fn check(&self, operation: &str) -> Result<()> {
        trace!(operation, "MemoryHost call");
        if self.state.lock().failing.contains(operation) {
            return Err(Error::host_call(operation, "injected failure"));
        }
        Ok(())
    }
}

// ============================================================================
// Inspection
// ============================================================================

impl MemoryHost {
    /// Returns the current state of one tab.
    #[must_use]
    pub fn tab(&self, tab_id: TabId) -> Option<Tab> {
        self.state.lock().tabs.iter().find(|t| t.id == tab_id).cloned()
    }

    /// Returns every tab.
    #[must_use]
    pub fn tabs(&self) -> Vec<Tab> {
        self.state.lock().tabs.clone()
    }

    /// Changes a tab's load status.
    pub fn set_status(&self, tab_id: TabId, status: TabStatus) {
        if let Some(tab) = self.state.lock().tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.status = status;
        }
    }

    /// Returns a storage value.
    #[must_use]
    pub fn storage(&self, key: &str) -> Option<Value> {
        self.state.lock().storage.get(key).cloned()
    }

    /// Returns `(window, indices)` for each highlight call.
    #[must_use]
    pub fn highlights(&self) -> Vec<(WindowId, Vec<u32>)> {
        self.state.lock().highlights.clone()
    }

    /// Returns `(group, tabs)` for each group call.
    #[must_use]
    pub fn groups(&self) -> Vec<(GroupId, Vec<TabId>)> {
        self.state.lock().groups.clone()
    }

    /// Returns each group update.
    #[must_use]
    pub fn group_updates(&self) -> Vec<(GroupId, GroupUpdate)> {
        self.state.lock().group_updates.clone()
    }

    /// Returns each script call.
    #[must_use]
    pub fn script_calls(&self) -> Vec<ScriptCall> {
        self.state.lock().script_calls.clone()
    }

    /// Returns each plain-text clipboard write.
    #[must_use]
    pub fn clipboard_text(&self) -> Vec<String> {
        self.state.lock().clipboard_text.clone()
    }

    /// Returns each HTML clipboard write.
    #[must_use]
    pub fn clipboard_html(&self) -> Vec<String> {
        self.state.lock().clipboard_html.clone()
    }

    /// Returns `(filename, text)` for each single-file save.
    #[must_use]
    pub fn saved_files(&self) -> Vec<(String, String)> {
        self.state.lock().saved_files.clone()
    }

    /// Returns the outputs of each multi-file download.
    #[must_use]
    pub fn downloads(&self) -> Vec<Vec<String>> {
        self.state.lock().downloads.clone()
    }

    /// Returns `(title, message)` for each notification.
    #[must_use]
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.state.lock().notifications.clone()
    }

    /// Returns menu items created since the last reset.
    #[must_use]
    pub fn menus(&self) -> Vec<MenuItem> {
        self.state.lock().menus.clone()
    }

    /// Returns how many times all menus were removed.
    #[must_use]
    pub fn menu_resets(&self) -> usize {
        self.state.lock().menu_resets
    }

    /// Returns how many times the badge blinked.
    #[must_use]
    pub fn blinks(&self) -> usize {
        self.state.lock().blinks
    }
}

// ============================================================================
// Host
// ============================================================================

#[async_trait]
impl Host for MemoryHost {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>> {
        self.check("tabs.query")?;
        let state = self.state.lock();
        let mut out = Vec::new();
        for tab in &state.tabs {
            if query.matches(tab, Some(self.current_window))? {
                out.push(tab.clone());
            }
        }
        out.sort_by_key(|t| (t.window_id, t.index));
        Ok(out)
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab> {
        self.check("tabs.get")?;
        self.tab(tab_id).ok_or_else(|| Error::tab_not_found(tab_id))
    }

    async fn create_tab(&self, props: &CreateTab) -> Result<Tab> {
        self.check("tabs.create")?;
        let mut state = self.state.lock();

        let raw_id = state.next_tab_id;
        state.next_tab_id += 1;
        let id = TabId::new(raw_id).ok_or_else(|| Error::protocol("tab id overflow"))?;

        let window = self.current_window;
        let index = state.tabs.iter().filter(|t| t.window_id == window).count() as u32;

        if props.active {
            for tab in state.tabs.iter_mut().filter(|t| t.window_id == window) {
                tab.active = false;
                tab.highlighted = false;
            }
        }

        let mut tab = Tab::new(id, window)
            .with_index(index)
            .with_url(props.url.clone())
            .with_status(TabStatus::Loading);
        tab.active = props.active;
        tab.highlighted = props.active;
        tab.cookie_store_id = props.cookie_store_id.clone();

        state.tabs.push(tab.clone());
        Ok(tab)
    }

    async fn highlight_tabs(&self, window_id: WindowId, indices: &[u32]) -> Result<()> {
        self.check("tabs.highlight")?;
        let mut state = self.state.lock();

        let first = indices.first().copied();
        for tab in state.tabs.iter_mut().filter(|t| t.window_id == window_id) {
            tab.highlighted = indices.contains(&tab.index);
            tab.active = Some(tab.index) == first;
        }
        state.highlights.push((window_id, indices.to_vec()));
        Ok(())
    }

    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        self.check("tabs.group")?;
        if tab_ids.is_empty() {
            return Err(Error::invalid_argument("tabs.group needs at least one tab"));
        }

        let mut state = self.state.lock();
        let group_id = GroupId::new(state.next_group_id);
        state.next_group_id += 1;

        for tab in state.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = Some(group_id);
        }
        state.groups.push((group_id, tab_ids.to_vec()));
        Ok(group_id)
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<()> {
        self.check("tabGroups.update")?;
        self.state
            .lock()
            .group_updates
            .push((group_id, update.clone()));
        Ok(())
    }

    async fn execute_in_tab(
        &self,
        tab_id: Option<TabId>,
        code: &str,
        args: &[Value],
    ) -> Result<Value> {
        self.check("tabs.executeScript")?;

        let tab_id = match tab_id {
            Some(id) => Some(id),
            None => self.active_tab().await?.map(|t| t.id),
        };

        let call = ScriptCall {
            tab_id,
            code: code.to_string(),
            args: args.to_vec(),
        };
        self.state.lock().script_calls.push(call.clone());

        match self.script_handler {
            Some(ref handler) => handler(&call),
            None => Ok(Value::Null),
        }
    }

    async fn write_clipboard_text(&self, text: &str) -> Result<()> {
        self.check("clipboard.writeText")?;
        self.state.lock().clipboard_text.push(text.to_string());
        Ok(())
    }

    async fn write_clipboard_html(&self, html: &str) -> Result<()> {
        self.check("clipboard.writeHtml")?;
        self.state.lock().clipboard_html.push(html.to_string());
        Ok(())
    }

    async fn save_text_to_file(&self, text: &str, filename: &str) -> Result<()> {
        self.check("downloads.download")?;
        self.state
            .lock()
            .saved_files
            .push((filename.to_string(), text.to_string()));
        Ok(())
    }

    async fn download_each_as_file(&self, outputs: &[String]) -> Result<()> {
        self.check("downloads.download")?;
        self.state.lock().downloads.push(outputs.to_vec());
        Ok(())
    }

    async fn storage_get(&self, key: &str) -> Result<Option<Value>> {
        self.check("storage.local.get")?;
        Ok(self.storage(key))
    }

    async fn storage_set(&self, key: &str, value: Value) -> Result<()> {
        self.check("storage.local.set")?;
        self.state.lock().storage.insert(key.to_string(), value);
        Ok(())
    }

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkNode>> {
        self.check("bookmarks.search")?;
        let needle = query.to_lowercase();
        Ok(self
            .state
            .lock()
            .bookmarks
            .iter()
            .filter(|node| {
                needle.is_empty()
                    || node.title.to_lowercase().contains(&needle)
                    || node
                        .url
                        .as_deref()
                        .is_some_and(|u| u.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn get_bookmark(&self, id: &BookmarkId) -> Result<BookmarkNode> {
        self.check("bookmarks.get")?;
        self.state
            .lock()
            .bookmarks
            .iter()
            .find(|node| &node.id == id)
            .cloned()
            .ok_or_else(|| Error::bookmark_not_found(id.clone()))
    }

    async fn bookmark_children(&self, id: &BookmarkId) -> Result<Vec<BookmarkNode>> {
        self.check("bookmarks.getChildren")?;
        Ok(self
            .state
            .lock()
            .bookmarks
            .iter()
            .filter(|node| node.parent_id.as_ref() == Some(id))
            .cloned()
            .collect())
    }

    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        self.check("notifications.create")?;
        self.state
            .lock()
            .notifications
            .push((title.to_string(), message.to_string()));
        Ok(())
    }

    async fn create_menu(&self, item: &MenuItem) -> Result<()> {
        self.check("menus.create")?;
        self.state.lock().menus.push(item.clone());
        Ok(())
    }

    async fn remove_all_menus(&self) -> Result<()> {
        self.check("menus.removeAll")?;
        let mut state = self.state.lock();
        state.menus.clear();
        state.menu_resets += 1;
        Ok(())
    }

    async fn blink_badge(&self) -> Result<()> {
        self.check("browserAction.blink")?;
        self.state.lock().blinks += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn tab(id: u32, window: u32, index: u32) -> Tab {
        Tab::new(TabId::new(id).expect("valid id"), WindowId::new(window)).with_index(index)
    }

    fn id(raw: u32) -> TabId {
        TabId::new(raw).expect("valid id")
    }

    #[tokio::test]
    async fn test_query_current_window() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 1, 0),
            tab(2, 2, 0),
            tab(3, 1, 1).with_hidden(),
        ]);

        let tabs = host
            .query_tabs(&TabQuery::current_window())
            .await
            .expect("query");
        assert_eq!(tabs.iter().map(|t| t.id.as_u32()).collect::<Vec<_>>(), [1]);
    }

    #[tokio::test]
    async fn test_highlight_updates_state() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 1, 0).with_active().with_highlighted(),
            tab(2, 1, 1),
            tab(3, 1, 2),
        ]);

        host.highlight_tabs(WindowId::new(1), &[2, 1])
            .await
            .expect("highlight");

        assert!(!host.tab(id(1)).expect("tab").highlighted);
        let third = host.tab(id(3)).expect("tab");
        assert!(third.highlighted && third.active);
        assert_eq!(host.highlights(), vec![(WindowId::new(1), vec![2, 1])]);
    }

    #[tokio::test]
    async fn test_group_assigns_group_id() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(1, 1, 0), tab(2, 1, 1)]);

        let group = host.group_tabs(&[id(2)]).await.expect("group");
        assert_eq!(host.tab(id(2)).expect("tab").group_id, Some(group));
        assert_eq!(host.tab(id(1)).expect("tab").group_id, None);

        let err = host.group_tabs(&[]).await.expect_err("empty group");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_create_tab_appends_to_current_window() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(4, 1, 0)]);

        let created = host
            .create_tab(&CreateTab::background("https://example.com/"))
            .await
            .expect("create");

        assert_eq!(created.id.as_u32(), 5);
        assert_eq!(created.index, 1);
        assert_eq!(created.status, TabStatus::Loading);
        assert!(!created.active);
    }

    #[tokio::test]
    async fn test_script_handler_and_failure() {
        let host = MemoryHost::new(WindowId::new(1))
            .with_tabs([tab(1, 1, 0).with_active()])
            .with_script_handler(|call| Ok(json!(call.args.len())));

        let value = host
            .execute_in_tab(None, "1", &[json!(1), json!(2)])
            .await
            .expect("execute");
        assert_eq!(value, json!(2));
        assert_eq!(host.script_calls()[0].tab_id, Some(id(1)));

        let failing = host.clone().with_failure("tabs.executeScript");
        let err = failing
            .execute_in_tab(Some(id(1)), "1", &[])
            .await
            .expect_err("injected");
        assert!(err.is_host_error());
    }

    #[tokio::test]
    async fn test_bookmark_children() {
        let folder = BookmarkNode::folder("f", "Reading");
        let host = MemoryHost::new(WindowId::new(1)).with_bookmarks([
            folder.clone(),
            BookmarkNode::bookmark("a", "A", "https://a.example/").with_parent(folder.id.clone()),
            BookmarkNode::bookmark("b", "B", "https://b.example/"),
        ]);

        let children = host
            .bookmark_children(&folder.id)
            .await
            .expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(host.search_bookmarks("").await.expect("search").len(), 3);
        assert!(host.get_bookmark(&BookmarkId::new("zz")).await.is_err());
    }
}
