//! Grouping tabs by hostname.

// ============================================================================
// Imports
// ============================================================================

use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::host::Host;
use crate::identifiers::{GroupId, TabId};
use crate::protocol::{GroupUpdate, MenuClick, MenuContext, MenuItem};
use crate::tabs::{Tab, TabQuery};

// ============================================================================
// Constants
// ============================================================================

/// Menu item grouping the clicked tab's site, or every highlighted site.
pub const MENU_SELECTED_SITES: &str = "Selected Sites";

/// Menu item grouping every site.
pub const MENU_ALL_SITES: &str = "All Sites";

// ============================================================================
// SiteCommand
// ============================================================================

/// Keyboard commands of the site grouper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteCommand {
    /// Group every site.
    GroupAll {
        /// Collapse the new groups.
        collapsed: bool,
    },
    /// Group the sites of the highlighted tabs.
    GroupSelected {
        /// Collapse the new groups.
        collapsed: bool,
    },
}

impl FromStr for SiteCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "group-all" => Ok(Self::GroupAll { collapsed: true }),
            "group-selected" => Ok(Self::GroupSelected { collapsed: true }),
            "group-all-uncollapsed" => Ok(Self::GroupAll { collapsed: false }),
            "group-selected-uncollapsed" => Ok(Self::GroupSelected { collapsed: false }),
            other => Err(Error::unknown_command(other)),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Group title for a hostname: a leading `www.` is dropped.
#[must_use]
pub fn group_title(hostname: &str) -> &str {
    hostname.strip_prefix("www.").unwrap_or(hostname)
}

/// Tabs eligible for site grouping: unpinned, visible, current window.
fn groupable_query() -> TabQuery {
    TabQuery::current_window().with_pinned(false)
}

/// Buckets tabs by hostname in first-seen order.
fn bucket_by_host(tabs: &[Tab]) -> Vec<(String, Vec<TabId>)> {
    let mut buckets: Vec<(String, Vec<TabId>)> = Vec::new();

    for tab in tabs.iter().filter(|t| t.is_web_page()) {
        let Some(hostname) = tab.hostname() else {
            continue;
        };
        match buckets.iter_mut().find(|(h, _)| *h == hostname) {
            Some((_, ids)) => ids.push(tab.id),
            None => buckets.push((hostname, vec![tab.id])),
        }
    }

    buckets
}

async fn create_groups(
    host: &dyn Host,
    buckets: Vec<(String, Vec<TabId>)>,
    collapsed: bool,
) -> Result<Vec<GroupId>> {
    let mut groups = Vec::with_capacity(buckets.len());

    for (hostname, tab_ids) in buckets {
        let group_id = host.group_tabs(&tab_ids).await?;
        let update = GroupUpdate::new(group_title(&hostname), collapsed);
        host.update_group(group_id, &update).await?;

        debug!(%group_id, hostname = %hostname, tabs = tab_ids.len(), "Site grouped");
        groups.push(group_id);
    }

    Ok(groups)
}

/// Groups every web tab of the current window by hostname.
///
/// # Errors
///
/// Propagates the first failing host call.
pub async fn group_all_sites(host: &dyn Host, collapsed: bool) -> Result<Vec<GroupId>> {
    let tabs = host.query_tabs(&groupable_query()).await?;
    let groups = create_groups(host, bucket_by_host(&tabs), collapsed).await?;
    info!(groups = groups.len(), collapsed, "Grouped all sites");
    Ok(groups)
}

/// Groups every tab sharing a hostname with a highlighted tab.
///
/// # Errors
///
/// Propagates the first failing host call.
pub async fn group_selected_sites(host: &dyn Host, collapsed: bool) -> Result<Vec<GroupId>> {
    let tabs = host.query_tabs(&groupable_query()).await?;

    let buckets = bucket_by_host(&tabs)
        .into_iter()
        .filter(|(hostname, _)| {
            tabs.iter()
                .any(|t| t.highlighted && t.hostname().as_deref() == Some(hostname.as_str()))
        })
        .collect();

    create_groups(host, buckets, collapsed).await
}

/// Groups every tab on `hostname`.
///
/// # Errors
///
/// Propagates the first failing host call.
pub async fn group_single_site(
    host: &dyn Host,
    hostname: &str,
    collapsed: bool,
) -> Result<Option<GroupId>> {
    let tabs = host.query_tabs(&groupable_query()).await?;
    let bucket = bucket_by_host(&tabs)
        .into_iter()
        .find(|(h, _)| h == hostname);

    match bucket {
        Some(bucket) => Ok(create_groups(host, vec![bucket], collapsed)
            .await?
            .into_iter()
            .next()),
        None => Ok(None),
    }
}

// ============================================================================
// SiteGrouper
// ============================================================================

/// Event entry points for site grouping.
#[derive(Debug, Clone, Copy)]
pub struct SiteGrouper {
    /// Collapse state for left clicks and the plain commands.
    collapse_default: bool,
}

impl SiteGrouper {
    /// Creates a grouper.
    #[must_use]
    pub const fn new(collapse_default: bool) -> Self {
        Self { collapse_default }
    }

    /// Context menu items.
    #[must_use]
    pub fn menu_items() -> Vec<MenuItem> {
        [MENU_SELECTED_SITES, MENU_ALL_SITES]
            .into_iter()
            .map(|id| MenuItem::new(id, id, &[MenuContext::Tab]))
            .collect()
    }

    /// Returns `true` if the menu item belongs to the grouper.
    #[must_use]
    pub fn owns_menu(menu_item_id: &str) -> bool {
        menu_item_id == MENU_SELECTED_SITES || menu_item_id == MENU_ALL_SITES
    }

    fn collapsed_for(&self, button: u8) -> bool {
        // Middle click keeps groups open.
        if button == 1 { false } else { self.collapse_default }
    }

    /// Runs a keyboard command.
    ///
    /// # Errors
    ///
    /// Host errors propagate.
    pub async fn on_command(&self, host: &dyn Host, command: SiteCommand) -> Result<Vec<GroupId>> {
        match command {
            SiteCommand::GroupAll { collapsed } => group_all_sites(host, collapsed).await,
            SiteCommand::GroupSelected { collapsed } => group_selected_sites(host, collapsed).await,
        }
    }

    /// Handles a context menu click.
    ///
    /// "Selected Sites" on a tab that is not highlighted groups only that
    /// tab's site.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownCommand`] for foreign menu items; host errors propagate.
    pub async fn on_menu_click(&self, host: &dyn Host, click: &MenuClick) -> Result<Vec<GroupId>> {
        let collapsed = self.collapsed_for(click.button);

        match click.menu_item_id.as_str() {
            MENU_ALL_SITES => group_all_sites(host, collapsed).await,
            MENU_SELECTED_SITES => match click.tab {
                Some(ref tab) if !tab.highlighted => match tab.hostname() {
                    Some(hostname) => Ok(group_single_site(host, &hostname, collapsed)
                        .await?
                        .into_iter()
                        .collect()),
                    None => Ok(Vec::new()),
                },
                _ => group_selected_sites(host, collapsed).await,
            },
            other => Err(Error::unknown_command(other)),
        }
    }

    /// Handles a toolbar button click: groups every site.
    ///
    /// # Errors
    ///
    /// Host errors propagate.
    pub async fn on_browser_action(&self, host: &dyn Host, button: u8) -> Result<Vec<GroupId>> {
        group_all_sites(host, self.collapsed_for(button)).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::MemoryHost;
    use crate::identifiers::WindowId;

    fn tab(id: u32, url: &str) -> Tab {
        Tab::new(TabId::new(id).expect("valid id"), WindowId::new(1))
            .with_index(id - 1)
            .with_url(url)
    }

    fn id(raw: u32) -> TabId {
        TabId::new(raw).expect("valid id")
    }

    fn click(menu: &str, button: u8, tab: Option<Tab>) -> MenuClick {
        MenuClick {
            menu_item_id: menu.to_string(),
            button,
            frame_id: None,
            bookmark_id: None,
            src_url: None,
            tab,
        }
    }

    fn host() -> MemoryHost {
        MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, "https://www.example.com/a"),
            tab(2, "about:blank"),
            tab(3, "https://docs.rs/tokio"),
            tab(4, "http://www.example.com/b").with_highlighted(),
            tab(5, "https://docs.rs/serde").with_pinned(),
            tab(6, "https://docs.rs/url"),
        ])
    }

    #[test]
    fn test_group_title() {
        assert_eq!(group_title("www.example.com"), "example.com");
        assert_eq!(group_title("docs.rs"), "docs.rs");
        assert_eq!(group_title("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn test_site_command_parse() {
        assert_eq!(
            "group-all".parse::<SiteCommand>().ok(),
            Some(SiteCommand::GroupAll { collapsed: true })
        );
        assert_eq!(
            "group-selected-uncollapsed".parse::<SiteCommand>().ok(),
            Some(SiteCommand::GroupSelected { collapsed: false })
        );
        assert!("group-none".parse::<SiteCommand>().is_err());
    }

    #[tokio::test]
    async fn test_group_all_sites() {
        let host = host();
        let groups = group_all_sites(&host, true).await.expect("group");

        assert_eq!(groups.len(), 2);
        let recorded = host.groups();
        assert_eq!(recorded[0].1, vec![id(1), id(4)]);
        assert_eq!(recorded[1].1, vec![id(3), id(6)]);

        let updates = host.group_updates();
        assert_eq!(updates[0].1, GroupUpdate::new("example.com", true));
        assert_eq!(updates[1].1, GroupUpdate::new("docs.rs", true));
        assert_eq!(host.tab(id(2)).expect("tab").group_id, None);
        assert_eq!(host.tab(id(5)).expect("tab").group_id, None);
    }

    #[tokio::test]
    async fn test_group_selected_sites() {
        let host = host();
        let groups = group_selected_sites(&host, false).await.expect("group");

        assert_eq!(groups.len(), 1);
        assert_eq!(host.groups()[0].1, vec![id(1), id(4)]);
        assert_eq!(host.group_updates()[0].1, GroupUpdate::new("example.com", false));
    }

    #[tokio::test]
    async fn test_group_single_site_unknown_host() {
        let host = host();
        let group = group_single_site(&host, "nowhere.test", true)
            .await
            .expect("group");
        assert!(group.is_none());
        assert!(host.groups().is_empty());
    }

    #[tokio::test]
    async fn test_middle_click_uncollapsed() {
        let host = host();
        let grouper = SiteGrouper::new(true);

        grouper
            .on_menu_click(&host, &click(MENU_ALL_SITES, 1, None))
            .await
            .expect("click");

        assert!(host.group_updates().iter().all(|(_, u)| !u.collapsed));
    }

    #[tokio::test]
    async fn test_selected_sites_on_unhighlighted_tab() {
        let host = host();
        let grouper = SiteGrouper::new(true);
        let clicked = host.tab(id(3)).expect("tab");

        let groups = grouper
            .on_menu_click(&host, &click(MENU_SELECTED_SITES, 0, Some(clicked)))
            .await
            .expect("click");

        assert_eq!(groups.len(), 1);
        assert_eq!(host.groups()[0].1, vec![id(3), id(6)]);
        assert_eq!(host.group_updates()[0].1, GroupUpdate::new("docs.rs", true));
    }

    #[tokio::test]
    async fn test_browser_action_groups_all() {
        let host = host();
        let groups = SiteGrouper::new(true)
            .on_browser_action(&host, 0)
            .await
            .expect("action");
        assert_eq!(groups.len(), 2);
    }
}
