//! Opening a bookmark or bookmark folder into a new tab group.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info};

use crate::error::Result;
use crate::host::Host;
use crate::identifiers::{BookmarkId, GroupId};
use crate::protocol::{CreateTab, GroupUpdate, MenuContext, MenuItem};

// ============================================================================
// Constants
// ============================================================================

/// Menu item ID on the bookmark context menu.
pub const MENU_OPEN_IN_GROUP: &str = "open-bookmark-in-tabgroup";

// ============================================================================
// Functions
// ============================================================================

/// Bookmark context menu item titled `title`.
#[must_use]
pub fn menu_item(title: &str) -> MenuItem {
    MenuItem::new(MENU_OPEN_IN_GROUP, title, &[MenuContext::Bookmark])
}

/// Opens `id` in background tabs and groups them under the bookmark title.
///
/// A bookmark opens one tab. A folder opens one tab per direct child that
/// has a URL. The group starts collapsed. Returns `None` when no tab was
/// opened.
///
/// # Errors
///
/// [`Error::BookmarkNotFound`](crate::Error::BookmarkNotFound) for an
/// unknown ID; host errors propagate.
pub async fn open_in_group(host: &dyn Host, id: &BookmarkId) -> Result<Option<GroupId>> {
    let node = host.get_bookmark(id).await?;

    let urls: Vec<String> = match node.url {
        Some(ref url) => vec![url.clone()],
        None => host
            .bookmark_children(&node.id)
            .await?
            .into_iter()
            .filter_map(|child| child.url)
            .collect(),
    };

    let mut tab_ids = Vec::with_capacity(urls.len());
    for url in urls {
        let tab = host.create_tab(&CreateTab::background(url)).await?;
        tab_ids.push(tab.id);
    }

    if tab_ids.is_empty() {
        debug!(bookmark_id = %id, "Bookmark folder has no links");
        return Ok(None);
    }

    let group_id = host.group_tabs(&tab_ids).await?;
    host.update_group(group_id, &GroupUpdate::new(node.title.clone(), true))
        .await?;

    info!(bookmark_id = %id, %group_id, tabs = tab_ids.len(), "Bookmark opened in group");
    Ok(Some(group_id))
}

// ============================================================================
// Tests
// ============================================================================
