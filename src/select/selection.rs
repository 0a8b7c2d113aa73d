//! Selection kinds and how each one picks tabs.
//!
//! Every selection starts from a fresh query of the current window's
//! visible tabs and works relative to a focal tab.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::host::Host;
use crate::protocol::{MenuContext, MenuItem};
use crate::tabs::{ALL_URLS, ConsideredSet, Depth, Resolver, Tab, TabQuery, TabSnapshot, TabStatus};

use super::user_script;

// ============================================================================
// Selection
// ============================================================================

/// A way of choosing tabs relative to a focal tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    /// Every visible tab.
    All,
    /// Every tab that is not highlighted.
    InvertSelection,
    /// Tabs in the focal tab's container.
    SameContainer,
    /// Tabs in the focal tab's group.
    SameGroup,
    /// Tabs opened from the focal tab, transitively.
    Descendants,
    /// Tabs sharing the focal tab's opener.
    Siblings,
    /// Tabs opened directly from the focal tab.
    Children,
    /// The focal tab's opener.
    Parent,
    /// The focal tab and its opener chain.
    Ancestors,
    /// Tabs showing the same URL.
    SameUrl,
    /// Tabs on the same hostname.
    SameDomain,
    /// Tabs left of the focal tab, nearest first.
    ToTheLeft,
    /// Tabs right of the focal tab, nearest first.
    ToTheRight,
    /// Pinned tabs.
    Pinned,
    /// Muted tabs.
    Muted,
    /// Tabs playing sound.
    Audible,
    /// Tabs still loading.
    Loading,
    /// Tabs whose URL is bookmarked.
    Bookmarked,
    /// Tabs accepted by every stored selector.
    UserScripts,
}

/// Menu section a selection is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSection {
    /// Top level of the tab context menu.
    Top,
    /// Position relative to the focal tab.
    Directional,
    /// Opener relationships.
    Relationship,
    /// URL comparisons.
    UrlProperty,
    /// Tab state flags.
    State,
}

impl MenuSection {
    /// Menu ID and title of the section's submenu (`None` for top level).
    #[must_use]
    pub fn menu_id(&self) -> Option<&'static str> {
        match self {
            Self::Top => None,
            Self::Directional => Some("Directional"),
            Self::Relationship => Some("Relationship"),
            Self::UrlProperty => Some("URL Property"),
            Self::State => Some("State"),
        }
    }
}

impl Selection {
    /// Every selection, in menu order.
    pub const ALL: [Self; 19] = [
        Self::All,
        Self::InvertSelection,
        Self::SameContainer,
        Self::SameGroup,
        Self::Bookmarked,
        Self::UserScripts,
        Self::Descendants,
        Self::Siblings,
        Self::Children,
        Self::Parent,
        Self::Ancestors,
        Self::SameUrl,
        Self::SameDomain,
        Self::ToTheLeft,
        Self::ToTheRight,
        Self::Pinned,
        Self::Muted,
        Self::Loading,
        Self::Audible,
    ];

    /// Menu item ID, also accepted as a keyboard command name.
    #[must_use]
    pub fn menu_id(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::InvertSelection => "Invert Selection",
            Self::SameContainer => "Same Container",
            Self::SameGroup => "Same Group",
            Self::Descendants => "Descendents",
            Self::Siblings => "Siblings",
            Self::Children => "Children",
            Self::Parent => "Parent",
            Self::Ancestors => "Ancestors",
            Self::SameUrl => "Same URL",
            Self::SameDomain => "Same Domain",
            Self::ToTheLeft => "To the Left",
            Self::ToTheRight => "To the Right",
            Self::Pinned => "Pinned",
            Self::Muted => "Muted",
            Self::Audible => "Audible",
            Self::Loading => "Loading",
            Self::Bookmarked => "Bookmarked",
            Self::UserScripts => "UserScripts",
        }
    }

    /// Section the selection is listed under.
    #[must_use]
    pub fn section(&self) -> MenuSection {
        match self {
            Self::All
            | Self::InvertSelection
            | Self::SameContainer
            | Self::SameGroup
            | Self::Bookmarked
            | Self::UserScripts => MenuSection::Top,
            Self::ToTheLeft | Self::ToTheRight => MenuSection::Directional,
            Self::Descendants
            | Self::Siblings
            | Self::Children
            | Self::Parent
            | Self::Ancestors => MenuSection::Relationship,
            Self::SameUrl | Self::SameDomain => MenuSection::UrlProperty,
            Self::Pinned | Self::Muted | Self::Loading | Self::Audible => MenuSection::State,
        }
    }

    /// Menu items for every selection, section submenus first.
    #[must_use]
    pub fn menu_items() -> Vec<MenuItem> {
        let contexts = [MenuContext::Tab];
        let sections = [
            MenuSection::Directional,
            MenuSection::Relationship,
            MenuSection::UrlProperty,
            MenuSection::State,
        ];

        let mut items: Vec<MenuItem> = sections
            .iter()
            .filter_map(MenuSection::menu_id)
            .map(|id| MenuItem::new(id, id, &contexts))
            .collect();

        for selection in Self::ALL {
            let id = selection.menu_id();
            let item = MenuItem::new(id, id, &contexts);
            items.push(match selection.section().menu_id() {
                Some(parent) => item.with_parent(parent),
                None => item,
            });
        }

        items
    }

    /// Returns `true` if the focal tab is moved to the front of the result.
    #[must_use]
    pub fn focal_first(&self) -> bool {
        matches!(
            self,
            Self::SameContainer
                | Self::SameGroup
                | Self::SameDomain
                | Self::Loading
                | Self::Audible
        )
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.menu_id())
    }
}

impl FromStr for Selection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "Descendants" {
            return Ok(Self::Descendants);
        }
        Self::ALL
            .into_iter()
            .find(|selection| selection.menu_id() == s)
            .ok_or_else(|| Error::unknown_command(s))
    }
}

// ============================================================================
// Tab Picking
// ============================================================================

/// Query every selection starts from.
fn base_query() -> TabQuery {
    TabQuery::current_window()
}

impl Selection {
    /// Picks the tabs for this selection.
    ///
    /// Returns `Ok(None)` when the selection does not apply to `focal`
    /// (no container, no group, no hostname).
    ///
    /// # Errors
    ///
    /// Host errors propagate. [`Selection::UserScripts`] returns
    /// [`Error::MissingConfiguration`] if no selectors are stored.
    pub async fn pick(
        &self,
        host: &dyn Host,
        focal: &Tab,
        selectors_key: &str,
    ) -> Result<Option<Vec<Tab>>> {
        let mut tabs = match self {
            Self::All => host.query_tabs(&base_query()).await?,

            Self::InvertSelection => {
                host.query_tabs(&base_query().with_highlighted(false))
                    .await?
            }

            Self::SameContainer => {
                let Some(ref store) = focal.cookie_store_id else {
                    return Ok(None);
                };
                let highlighted = host
                    .query_tabs(&base_query().with_highlighted(true))
                    .await?;
                let mut query = base_query().with_cookie_store(store.clone());
                if highlighted.len() > 1 {
                    query = query.with_highlighted(true);
                }
                host.query_tabs(&query).await?
            }

            Self::SameGroup => {
                let Some(group_id) = focal.group_id else {
                    return Ok(None);
                };
                host.query_tabs(&base_query().with_group(group_id)).await?
            }

            Self::Descendants => related(host, focal, Relation::Descendants).await?,
            Self::Siblings => related(host, focal, Relation::Siblings).await?,
            Self::Children => related(host, focal, Relation::Children).await?,
            Self::Parent => related(host, focal, Relation::Parent).await?,
            Self::Ancestors => related(host, focal, Relation::Ancestors).await?,

            Self::SameUrl => {
                let mut tabs = host.query_tabs(&base_query()).await?;
                tabs.retain(|t| t.url == focal.url);
                tabs
            }

            Self::SameDomain => {
                let Some(hostname) = focal.hostname() else {
                    return Ok(None);
                };
                host.query_tabs(&base_query().with_url(format!("*://{hostname}/*")))
                    .await?
            }

            Self::ToTheLeft => {
                let mut tabs = host.query_tabs(&base_query()).await?;
                tabs.retain(|t| t.index < focal.index);
                tabs.sort_by(|a, b| b.index.cmp(&a.index));
                tabs
            }

            Self::ToTheRight => {
                let mut tabs = host.query_tabs(&base_query()).await?;
                tabs.retain(|t| t.index > focal.index);
                tabs.sort_by_key(|t| t.index);
                tabs
            }

            Self::Pinned => host.query_tabs(&base_query().with_pinned(true)).await?,

            Self::Muted => host.query_tabs(&base_query().with_muted(true)).await?,

            Self::Audible => host.query_tabs(&base_query().with_audible(true)).await?,

            Self::Loading => {
                let mut tabs = host.query_tabs(&base_query()).await?;
                tabs.retain(|t| t.status == TabStatus::Loading);
                tabs
            }

            Self::Bookmarked => {
                let bookmarked: FxHashSet<String> = host
                    .search_bookmarks("")
                    .await?
                    .into_iter()
                    .filter_map(|node| node.url.map(|u| u.trim().to_string()))
                    .collect();

                let query = TabQuery {
                    current_window: Some(true),
                    ..TabQuery::new()
                };
                let mut tabs = host.query_tabs(&query).await?;
                tabs.retain(|t| bookmarked.contains(&t.url));
                tabs
            }

            Self::UserScripts => {
                let selectors = user_script::load_selectors(host, selectors_key).await?;
                let candidates = host.query_tabs(&base_query().with_url(ALL_URLS)).await?;
                user_script::filter_tabs(host, &selectors, focal, candidates).await?
            }
        };

        if self.focal_first() {
            tabs.sort_by_key(|t| t.id != focal.id);
        }

        Ok(Some(tabs))
    }
}

// ============================================================================
// Opener Graph
// ============================================================================

/// Selections answered by the [`Resolver`].
#[derive(Debug, Clone, Copy)]
enum Relation {
    Descendants,
    Siblings,
    Children,
    Parent,
    Ancestors,
}

/// Runs `relation` over a fresh snapshot where every tab is considered.
async fn related(host: &dyn Host, focal: &Tab, relation: Relation) -> Result<Vec<Tab>> {
    let snapshot = TabSnapshot::new(host.query_tabs(&base_query()).await?);
    let considered = ConsideredSet::from_snapshot(&snapshot);
    let resolver = Resolver::new(&snapshot, &considered);

    let related: Vec<&Tab> = match relation {
        Relation::Descendants => resolver.descendants(focal.id, Depth::Unbounded),
        Relation::Siblings => resolver.siblings(focal),
        Relation::Children => resolver.children(focal.id),
        Relation::Parent => resolver.parent(focal.id).into_iter().collect(),
        Relation::Ancestors => resolver.ancestors(focal.id, Depth::Unbounded),
    };

    Ok(related.into_iter().cloned().collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::host::MemoryHost;
    use crate::identifiers::{GroupId, TabId, WindowId};
    use crate::protocol::BookmarkNode;

    const KEY: &str = "selectors";

    fn tab(id: u32, index: u32) -> Tab {
        Tab::new(TabId::new(id).expect("valid id"), WindowId::new(1))
            .with_index(index)
            .with_url(format!("https://site{id}.example/"))
    }

    fn ids(tabs: &[Tab]) -> Vec<u32> {
        tabs.iter().map(|t| t.id.as_u32()).collect()
    }

    async fn pick(host: &MemoryHost, selection: Selection, focal: u32) -> Option<Vec<u32>> {
        let focal = host
            .tab(TabId::new(focal).expect("valid id"))
            .expect("focal tab");
        selection
            .pick(host, &focal, KEY)
            .await
            .expect("pick")
            .map(|tabs| ids(&tabs))
    }

    fn scenario() -> MemoryHost {
        let one = TabId::new(1).expect("valid id");
        let two = TabId::new(2).expect("valid id");
        MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0),
            tab(2, 1).with_opener(one),
            tab(3, 2).with_opener(one),
            tab(4, 3).with_opener(two),
        ])
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Same URL".parse::<Selection>().ok(), Some(Selection::SameUrl));
        assert_eq!(
            "Descendents".parse::<Selection>().ok(),
            Some(Selection::Descendants)
        );
        assert_eq!(
            "Descendants".parse::<Selection>().ok(),
            Some(Selection::Descendants)
        );

        let err = "Nope".parse::<Selection>().expect_err("unknown");
        assert!(matches!(err, Error::UnknownCommand { ref command } if command == "Nope"));
    }

    #[test]
    fn test_menu_id_round_trip() {
        for selection in Selection::ALL {
            assert_eq!(selection.menu_id().parse::<Selection>().ok(), Some(selection));
        }
    }

    #[test]
    fn test_menu_items_have_parents() {
        let items = Selection::menu_items();
        assert_eq!(items.len(), 4 + Selection::ALL.len());

        let to_left = items
            .iter()
            .find(|i| i.id.as_deref() == Some("To the Left"))
            .expect("item");
        assert_eq!(to_left.parent_id.as_deref(), Some("Directional"));

        let all = items.iter().find(|i| i.id.as_deref() == Some("All")).expect("item");
        assert!(all.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_relationships_scenario() {
        let host = scenario();
        assert_eq!(pick(&host, Selection::Descendants, 1).await, Some(vec![2, 3, 4]));
        assert_eq!(pick(&host, Selection::Children, 1).await, Some(vec![2, 3]));
        assert_eq!(pick(&host, Selection::Siblings, 4).await, Some(vec![]));
        assert_eq!(pick(&host, Selection::Siblings, 2).await, Some(vec![3]));
        assert_eq!(pick(&host, Selection::Ancestors, 4).await, Some(vec![4, 2, 1]));
        assert_eq!(pick(&host, Selection::Parent, 4).await, Some(vec![2]));
        assert_eq!(pick(&host, Selection::Parent, 1).await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_hidden_tabs_are_not_considered() {
        let one = TabId::new(1).expect("valid id");
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0),
            tab(2, 1).with_opener(one).with_hidden(),
            tab(3, 2).with_opener(one),
        ]);
        assert_eq!(pick(&host, Selection::Children, 1).await, Some(vec![3]));
    }

    #[tokio::test]
    async fn test_siblings_of_hidden_opener() {
        let one = TabId::new(1).expect("valid id");
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_hidden(),
            tab(2, 1).with_opener(one),
            tab(3, 2).with_opener(one),
            tab(4, 3),
        ]);
        assert_eq!(pick(&host, Selection::Siblings, 2).await, Some(vec![3]));
        assert_eq!(pick(&host, Selection::Siblings, 4).await, Some(vec![]));
        assert_eq!(pick(&host, Selection::Parent, 2).await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_directional_nearest_first() {
        let host = MemoryHost::new(WindowId::new(1))
            .with_tabs([tab(1, 0), tab(2, 1), tab(3, 2), tab(4, 3), tab(5, 4)]);

        assert_eq!(pick(&host, Selection::ToTheLeft, 3).await, Some(vec![2, 1]));
        assert_eq!(pick(&host, Selection::ToTheRight, 3).await, Some(vec![4, 5]));
        assert_eq!(pick(&host, Selection::ToTheLeft, 1).await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_same_domain_focal_first() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_url("https://www.example.com/a"),
            tab(2, 1).with_url("https://other.org/"),
            tab(3, 2).with_url("http://www.example.com/b"),
        ]);

        assert_eq!(pick(&host, Selection::SameDomain, 3).await, Some(vec![3, 1]));
    }

    #[tokio::test]
    async fn test_same_domain_without_hostname_skipped() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(1, 0).with_url("about:blank")]);
        assert_eq!(pick(&host, Selection::SameDomain, 1).await, None);
    }

    #[tokio::test]
    async fn test_same_url_exact() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_url("https://a.example/?q=1"),
            tab(2, 1).with_url("https://a.example/?q=2"),
            tab(3, 2).with_url("https://a.example/?q=1"),
        ]);
        assert_eq!(pick(&host, Selection::SameUrl, 3).await, Some(vec![1, 3]));
    }

    #[tokio::test]
    async fn test_same_container() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_cookie_store("work"),
            tab(2, 1),
            tab(3, 2).with_cookie_store("work"),
        ]);
        assert_eq!(pick(&host, Selection::SameContainer, 3).await, Some(vec![3, 1]));
        assert_eq!(pick(&host, Selection::SameContainer, 2).await, None);
    }

    #[tokio::test]
    async fn test_same_container_limited_to_highlighted() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_cookie_store("work").with_highlighted(),
            tab(2, 1).with_cookie_store("work"),
            tab(3, 2).with_cookie_store("work").with_highlighted(),
        ]);
        assert_eq!(pick(&host, Selection::SameContainer, 3).await, Some(vec![3, 1]));
    }

    #[tokio::test]
    async fn test_same_group() {
        let group = GroupId::new(7);
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_group(group),
            tab(2, 1),
            tab(3, 2).with_group(group),
        ]);
        assert_eq!(pick(&host, Selection::SameGroup, 3).await, Some(vec![3, 1]));
        assert_eq!(pick(&host, Selection::SameGroup, 2).await, None);
    }

    #[tokio::test]
    async fn test_state_flags() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0).with_pinned(),
            tab(2, 1).with_muted(),
            tab(3, 2).with_audible(),
            tab(4, 3).with_status(TabStatus::Loading),
            tab(5, 4).with_audible().with_highlighted(),
        ]);

        assert_eq!(pick(&host, Selection::Pinned, 2).await, Some(vec![1]));
        assert_eq!(pick(&host, Selection::Muted, 1).await, Some(vec![2]));
        assert_eq!(pick(&host, Selection::Audible, 5).await, Some(vec![5, 3]));
        assert_eq!(pick(&host, Selection::Loading, 1).await, Some(vec![4]));
        assert_eq!(
            pick(&host, Selection::InvertSelection, 1).await,
            Some(vec![1, 2, 3, 4])
        );
    }

    #[tokio::test]
    async fn test_bookmarked_trims_urls() {
        let host = MemoryHost::new(WindowId::new(1))
            .with_tabs([tab(1, 0), tab(2, 1)])
            .with_bookmarks([
                BookmarkNode::bookmark("b1", "Two", "  https://site2.example/ "),
                BookmarkNode::folder("f", "Folder"),
            ]);
        assert_eq!(pick(&host, Selection::Bookmarked, 1).await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_user_scripts() {
        let host = MemoryHost::new(WindowId::new(1))
            .with_tabs([tab(1, 0), tab(2, 1), tab(3, 2)])
            .with_storage(KEY, json!([{"code": "return cmpTab.index > 0;", "enabled": true}]))
            .with_script_handler(|call| Ok(json!(call.args[1]["index"].as_u64() > Some(0))));

        assert_eq!(pick(&host, Selection::UserScripts, 1).await, Some(vec![2, 3]));
    }

    #[tokio::test]
    async fn test_user_scripts_without_storage() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(1, 0)]);
        let focal = host.tab(TabId::new(1).expect("valid id")).expect("tab");

        let err = Selection::UserScripts
            .pick(&host, &focal, KEY)
            .await
            .expect_err("missing");
        assert!(matches!(err, Error::MissingConfiguration { .. }));
    }
}
