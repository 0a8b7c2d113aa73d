//! [`Host`] implementation over the extension WebSocket.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{BookmarkId, GroupId, TabId, WindowId};
use crate::protocol::{
    BookmarkNode, BookmarksCommand, BrowserActionCommand, ClipboardCommand, Command, CreateTab,
    DownloadsCommand, GroupUpdate, MenuItem, MenusCommand, NotificationsCommand, Request,
    StorageCommand, TabGroupsCommand, TabsCommand,
};
use crate::tabs::{Tab, TabQuery};
use crate::transport::Connection;

use super::Host;

// ============================================================================
// Constants
// ============================================================================

/// Default notification icon inside the extension package.
const DEFAULT_ICON: &str = "icon.png";

// ============================================================================
// RemoteHost
// ============================================================================

/// Forwards host calls to the extension background page.
#[derive(Clone)]
pub struct RemoteHost {
    connection: Connection,
    icon_url: String,
}

impl RemoteHost {
    /// Creates a host over an accepted connection.
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            icon_url: DEFAULT_ICON.to_string(),
        }
    }

    /// Sets the icon used for notifications.
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = icon_url.into();
        self
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn call(&self, command: Command) -> Result<Value> {
        let request = Request::new(command);
        let method = request.method();
        trace!(id = %request.id, method, "Host call");

        let response = self.connection.send(request).await?;
        response.into_result(method)
    }

    async fn call_as<T: DeserializeOwned>(&self, command: Command) -> Result<T> {
        let value = self.call(command).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn download(&self, text: &str, filename: Option<String>, save_as: bool) -> Result<()> {
        let command = Command::Downloads(DownloadsCommand::Download {
            url: text_data_url(text),
            filename,
            save_as,
        });
        self.call(command).await.map(drop)
    }
}

/// Encodes `text` as a `data:` URL the downloads API accepts.
fn text_data_url(text: &str) -> String {
    format!(
        "data:text/plain;charset=utf-8;base64,{}",
        STANDARD.encode(text.as_bytes())
    )
}

/// Script execution reports one result per frame; the top frame comes first.
fn first_frame_result(value: Value) -> Value {
    match value {
        Value::Array(mut frames) if !frames.is_empty() => frames.swap_remove(0),
        Value::Array(_) => Value::Null,
        other => other,
    }
}

#[async_trait]
impl Host for RemoteHost {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>> {
        self.call_as(Command::Tabs(TabsCommand::Query(query.clone())))
            .await
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab> {
        let value = self.call(Command::Tabs(TabsCommand::Get { tab_id })).await?;
        if value.is_null() {
            return Err(Error::tab_not_found(tab_id));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn create_tab(&self, props: &CreateTab) -> Result<Tab> {
        let tab: Tab = self
            .call_as(Command::Tabs(TabsCommand::Create(props.clone())))
            .await?;
        debug!(tab_id = %tab.id, url = %props.url, "Tab created");
        Ok(tab)
    }

    async fn highlight_tabs(&self, window_id: WindowId, indices: &[u32]) -> Result<()> {
        let command = Command::Tabs(TabsCommand::Highlight {
            window_id,
            tabs: indices.to_vec(),
            populate: false,
        });
        self.call(command).await.map(drop)
    }

    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        let command = Command::Tabs(TabsCommand::Group {
            tab_ids: tab_ids.to_vec(),
        });
        let value = self.call(command).await?;
        value
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .map(GroupId::new)
            .ok_or_else(|| Error::protocol(format!("tabs.group returned {value}")))
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<()> {
        let command = Command::TabGroups(TabGroupsCommand::Update {
            group_id,
            update: update.clone(),
        });
        self.call(command).await.map(drop)
    }

    async fn execute_in_tab(
        &self,
        tab_id: Option<TabId>,
        code: &str,
        args: &[Value],
    ) -> Result<Value> {
        let command = Command::Tabs(TabsCommand::ExecuteScript {
            tab_id,
            code: code.to_string(),
            args: args.to_vec(),
        });
        self.call(command).await.map(first_frame_result)
    }

    async fn write_clipboard_text(&self, text: &str) -> Result<()> {
        let command = Command::Clipboard(ClipboardCommand::WriteText {
            text: text.to_string(),
        });
        self.call(command).await.map(drop)
    }

    async fn write_clipboard_html(&self, html: &str) -> Result<()> {
        let command = Command::Clipboard(ClipboardCommand::WriteHtml {
            html: html.to_string(),
        });
        self.call(command).await.map(drop)
    }

    async fn save_text_to_file(&self, text: &str, filename: &str) -> Result<()> {
        let filename = (!filename.is_empty()).then(|| filename.to_string());
        self.download(text, filename, true).await
    }

    async fn download_each_as_file(&self, outputs: &[String]) -> Result<()> {
        for (i, output) in outputs.iter().enumerate() {
            self.download(output, Some(format!("{}.txt", i + 1)), false)
                .await?;
        }
        Ok(())
    }

    async fn storage_get(&self, key: &str) -> Result<Option<Value>> {
        let value = self
            .call(Command::Storage(StorageCommand::Get {
                key: key.to_string(),
            }))
            .await?;

        // storage.local.get resolves to `{ key: value }`, or `{}` when unset.
        Ok(match value {
            Value::Object(mut items) => items.remove(key),
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn storage_set(&self, key: &str, value: Value) -> Result<()> {
        let command = Command::Storage(StorageCommand::Set {
            key: key.to_string(),
            value,
        });
        self.call(command).await.map(drop)
    }

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkNode>> {
        self.call_as(Command::Bookmarks(BookmarksCommand::Search {
            query: query.to_string(),
        }))
        .await
    }

    async fn get_bookmark(&self, id: &BookmarkId) -> Result<BookmarkNode> {
        let nodes: Vec<BookmarkNode> = self
            .call_as(Command::Bookmarks(BookmarksCommand::Get { id: id.clone() }))
            .await?;
        nodes
            .into_iter()
            .next()
            .ok_or_else(|| Error::bookmark_not_found(id.clone()))
    }

    async fn bookmark_children(&self, id: &BookmarkId) -> Result<Vec<BookmarkNode>> {
        self.call_as(Command::Bookmarks(BookmarksCommand::GetChildren {
            id: id.clone(),
        }))
        .await
    }

    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let command = Command::Notifications(NotificationsCommand::Create {
            title: title.to_string(),
            message: message.to_string(),
            icon_url: self.icon_url.clone(),
        });
        self.call(command).await.map(drop)
    }

    async fn create_menu(&self, item: &MenuItem) -> Result<()> {
        self.call(Command::Menus(MenusCommand::Create(item.clone())))
            .await
            .map(drop)
    }

    async fn remove_all_menus(&self) -> Result<()> {
        self.call(Command::Menus(MenusCommand::RemoveAll))
            .await
            .map(drop)
    }

    async fn blink_badge(&self) -> Result<()> {
        self.call(Command::BrowserAction(BrowserActionCommand::Blink))
            .await
            .map(drop)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_text_data_url() {
        assert_eq!(
            text_data_url("hi"),
            "data:text/plain;charset=utf-8;base64,aGk="
        );
    }

    #[test]
    fn test_first_frame_result() {
        assert_eq!(first_frame_result(json!([true, false])), json!(true));
        assert_eq!(first_frame_result(json!([])), Value::Null);
        assert_eq!(first_frame_result(json!("x")), json!("x"));
    }
}
