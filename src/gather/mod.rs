//! Running stored snippets across tabs and collecting their output.
//!
//! A snippet is a [`Selector`](crate::config::Selector) whose completion
//! value is the output. The [`Gatherer`] runs it in every tab in scope, one
//! tab at a time, then hands the outputs to an [`OutputAction`].
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `output` | [`OutputAction`] and value rendering |
//! | `shortcut` | Keyboard bindings from storage |
//! | `menus` | Context menu layout and item IDs |
//!
//! # Example
//!
//! ```ignore
//! let gatherer = Gatherer::new(&config);
//! let tabs = Scope::Window.tabs(&host).await?;
//! let outputs = gatherer.run(&host, "document.title + \"\\n\"", &tabs).await;
//! OutputAction::CopyText.deliver(&host, &outputs).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod menus;
mod output;
mod shortcut;

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::config::{Config, default_selectors};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::protocol::MenuClick;
use crate::select::user_script::load_selectors;
use crate::tabs::{ALL_URLS, Tab, TabQuery, TabStatus};

// ============================================================================
// Re-exports
// ============================================================================

pub use output::{OutputAction, render};
pub use shortcut::{Scope, ShortcutBinding, ShortcutConfig, config_from_storage};

// ============================================================================
// Gatherer
// ============================================================================

/// Event entry points for gathering.
#[derive(Debug, Clone)]
pub struct Gatherer {
    selectors_key: String,
    shortcuts_key: String,
}

impl Gatherer {
    /// Creates a gatherer from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            selectors_key: config.selectors_key.clone(),
            shortcuts_key: config.shortcuts_key.clone(),
        }
    }

    /// Runs `code` in each tab in order and returns one output per tab.
    ///
    /// A tab whose script fails contributes `"<error> <url>\n"` instead;
    /// later tabs still run.
    pub async fn run(&self, host: &dyn Host, code: &str, tabs: &[Tab]) -> Vec<String> {
        let mut outputs = Vec::with_capacity(tabs.len());

        for tab in tabs {
            match host.execute_in_tab(Some(tab.id), code, &[]).await {
                Ok(value) => outputs.push(render(value)),
                Err(e) => {
                    warn!(tab_id = %tab.id, error = %e, "Snippet failed in tab");
                    outputs.push(format!("{e} {}\n", tab.url));
                }
            }
        }

        outputs
    }

    /// Runs stored selector `index` in `tabs` and delivers the output.
    ///
    /// # Errors
    ///
    /// [`Error::MissingConfiguration`] without stored selectors,
    /// [`Error::InvalidArgument`] for an index out of range. Delivery errors
    /// propagate.
    pub async fn run_selector(
        &self,
        host: &dyn Host,
        index: usize,
        tabs: &[Tab],
        action: OutputAction,
    ) -> Result<Vec<String>> {
        let selectors = load_selectors(host, &self.selectors_key).await?;
        let selector = selectors
            .get(index)
            .ok_or_else(|| Error::invalid_argument(format!("no selector at index {index}")))?;

        let outputs = self.run(host, &selector.code, tabs).await;
        action.deliver(host, &outputs).await?;

        info!(index, %action, tabs = tabs.len(), "Gathered from tabs");
        Ok(outputs)
    }

    /// Returns `true` if the menu item belongs to the gatherer.
    #[must_use]
    pub fn owns_menu(menu_item_id: &str) -> bool {
        menu_item_id == menus::MENU_CONFIGURE
            || OutputAction::from_menu_id(menu_item_id).is_some()
            || menus::parse_child_id(menu_item_id).is_some()
    }

    /// Handles a context menu click.
    ///
    /// Runs in the highlighted, loaded tabs of the current window when the
    /// clicked tab is one of them, otherwise in the clicked tab alone. A
    /// click inside a frame always uses the clicked tab alone.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the click carries no tab; see also
    /// [`Gatherer::run_selector`].
    pub async fn on_menu_click(&self, host: &dyn Host, click: &MenuClick) -> Result<Vec<String>> {
        let Some((action, index)) = menus::parse_child_id(&click.menu_item_id) else {
            debug!(menu_item_id = %click.menu_item_id, "Gather menu item has no action");
            return Ok(Vec::new());
        };

        let clicked = click
            .tab
            .clone()
            .ok_or_else(|| Error::invalid_argument("menu click without a tab"))?;

        let tabs = if click.frame_id.is_some() {
            vec![clicked]
        } else {
            let highlighted = host.query_tabs(&Self::menu_scope()).await?;
            if highlighted.iter().any(|t| t.id == clicked.id) {
                highlighted
            } else {
                vec![clicked]
            }
        };

        self.run_selector(host, index, &tabs, action).await
    }

    fn menu_scope() -> TabQuery {
        TabQuery::current_window()
            .with_highlighted(true)
            .with_url(ALL_URLS)
            .with_discarded(false)
            .with_status(TabStatus::Complete)
    }

    /// Runs the shortcut bound to `command`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingConfiguration`] without stored bindings,
    /// [`Error::UnknownCommand`] if `command` is not bound.
    pub async fn on_command(&self, host: &dyn Host, command: &str) -> Result<Vec<String>> {
        let stored = host.storage_get(&self.shortcuts_key).await?;
        let bindings = config_from_storage(&self.shortcuts_key, stored)?;
        let binding = bindings
            .get(command)
            .ok_or_else(|| Error::unknown_command(command))?;

        debug!(command, scope = ?binding.scope, "Running shortcut");
        let tabs = binding.scope.tabs(host).await?;
        self.run_selector(host, binding.format, &tabs, binding.action)
            .await
    }

    /// Seeds the default selectors on first install.
    ///
    /// # Errors
    ///
    /// Host errors propagate.
    pub async fn on_installed(&self, host: &dyn Host, reason: &str) -> Result<()> {
        if reason != "install" {
            return Ok(());
        }

        let defaults = serde_json::to_value(default_selectors())?;
        host.storage_set(&self.selectors_key, defaults).await?;
        info!(key = %self.selectors_key, "Default selectors stored");
        Ok(())
    }

    /// Creates the gather menus for the stored selectors.
    ///
    /// Without stored selectors only the parent items are created.
    ///
    /// # Errors
    ///
    /// Host errors propagate.
    pub async fn create_menus(&self, host: &dyn Host) -> Result<()> {
        let selectors = match load_selectors(host, &self.selectors_key).await {
            Ok(selectors) => selectors,
            Err(Error::MissingConfiguration { key }) => {
                debug!(%key, "No selectors stored");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        for item in menus::menu_items(&selectors) {
            host.create_menu(&item).await?;
        }
        Ok(())
    }

    /// Removes every menu item, then recreates the gather menus.
    ///
    /// # Errors
    ///
    /// Host errors propagate.
    pub async fn rebuild_menus(&self, host: &dyn Host) -> Result<()> {
        host.remove_all_menus().await?;
        self.create_menus(host).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    use crate::config::Selector;
    use crate::host::MemoryHost;
    use crate::identifiers::{TabId, WindowId};

    fn id(raw: u32) -> TabId {
        TabId::new(raw).expect("valid id")
    }

    fn tab(raw: u32, url: &str) -> Tab {
        Tab::new(id(raw), WindowId::new(1))
            .with_index(raw - 1)
            .with_url(url)
            .with_status(TabStatus::Complete)
    }

    fn gatherer() -> Gatherer {
        Gatherer::new(&Config::new())
    }

    fn click(menu: &str, tab: Tab, frame_id: Option<u64>) -> MenuClick {
        MenuClick {
            menu_item_id: menu.to_string(),
            button: 0,
            frame_id,
            bookmark_id: None,
            src_url: None,
            tab: Some(tab),
        }
    }

    /// Host whose scripts return the tab's URL, failing in tab 2.
    fn host() -> MemoryHost {
        MemoryHost::new(WindowId::new(1))
            .with_tabs([
                tab(1, "https://a.example/").with_active().with_highlighted(),
                tab(2, "https://b.example/").with_highlighted(),
                tab(3, "https://c.example/").with_highlighted(),
                tab(4, "https://d.example/"),
            ])
            .with_storage("selectors", json!([{"code": "// URL\nlocation.href"}]))
            .with_script_handler(|call| match call.tab_id.map(|t| t.as_u32()) {
                Some(2) => Err(Error::host_call("tabs.executeScript", "denied")),
                Some(n) => Ok(json!(format!("tab{n}\n"))),
                None => Ok(Value::Null),
            })
    }

    #[tokio::test]
    async fn test_run_records_failures_and_continues() {
        let host = host();
        let tabs = host.tabs();

        let outputs = gatherer().run(&host, "1", &tabs[..3]).await;

        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0], "tab1\n");
        assert_eq!(
            outputs[1],
            "Host call tabs.executeScript failed: denied https://b.example/\n"
        );
        assert_eq!(outputs[2], "tab3\n");
    }

    #[tokio::test]
    async fn test_menu_click_on_highlighted_tab() {
        let host = host();
        let clicked = host.tab(id(1)).expect("tab");

        let outputs = gatherer()
            .on_menu_click(&host, &click("copy_as_text:0", clicked, None))
            .await
            .expect("click");

        assert_eq!(outputs.len(), 3);
        assert_eq!(host.clipboard_text().len(), 1);
        assert!(host.clipboard_text()[0].starts_with("tab1\n"));
        assert_eq!(host.blinks(), 1);
    }

    #[tokio::test]
    async fn test_menu_click_outside_highlight_uses_clicked_tab() {
        let host = host();
        let clicked = host.tab(id(4)).expect("tab");

        let outputs = gatherer()
            .on_menu_click(&host, &click("run_only:0", clicked, None))
            .await
            .expect("click");

        assert_eq!(outputs, vec!["tab4\n".to_string()]);
    }

    #[tokio::test]
    async fn test_frame_click_uses_clicked_tab() {
        let host = host();
        let clicked = host.tab(id(3)).expect("tab");

        let outputs = gatherer()
            .on_menu_click(&host, &click("save_as_file:0", clicked, Some(7)))
            .await
            .expect("click");

        assert_eq!(outputs, vec!["tab3\n".to_string()]);
        assert_eq!(host.saved_files(), vec![(String::new(), "tab3\n".to_string())]);
    }

    #[tokio::test]
    async fn test_selector_index_out_of_range() {
        let host = host();
        let clicked = host.tab(id(1)).expect("tab");

        let err = gatherer()
            .on_menu_click(&host, &click("copy_as_text:5", clicked, None))
            .await
            .expect_err("out of range");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_command_uses_binding() {
        let host = host().with_storage(
            "shortcutconfig",
            json!({"gather-window": {"scope": "window", "format": 0, "action": "dl"}}),
        );

        let outputs = gatherer()
            .on_command(&host, "gather-window")
            .await
            .expect("command");

        assert_eq!(outputs.len(), 4);
        assert_eq!(host.downloads(), vec![outputs]);
    }

    #[tokio::test]
    async fn test_command_without_bindings() {
        let host = host();
        let err = gatherer()
            .on_command(&host, "gather-window")
            .await
            .expect_err("missing");
        assert!(matches!(err, Error::MissingConfiguration { .. }));

        let host = host.with_storage("shortcutconfig", json!({}));
        let err = gatherer()
            .on_command(&host, "gather-window")
            .await
            .expect_err("unbound");
        assert!(matches!(err, Error::UnknownCommand { .. }));
    }

    #[tokio::test]
    async fn test_install_seeds_defaults() {
        let host = MemoryHost::new(WindowId::new(1));
        let gatherer = gatherer();

        gatherer.on_installed(&host, "update").await.expect("update");
        assert!(host.storage("selectors").is_none());

        gatherer.on_installed(&host, "install").await.expect("install");
        let stored = Selector::list_from_storage("selectors", host.storage("selectors"))
            .expect("stored");
        assert_eq!(stored, default_selectors());
    }

    #[tokio::test]
    async fn test_rebuild_menus() {
        let host = host();
        gatherer().rebuild_menus(&host).await.expect("rebuild");

        assert_eq!(host.menu_resets(), 1);
        assert_eq!(host.menus().len(), 5 + 2 + 5);
        assert!(Gatherer::owns_menu("download_as_files:0"));
        assert!(Gatherer::owns_menu(menus::MENU_CONFIGURE));
        assert!(!Gatherer::owns_menu("All Sites"));
    }

    #[tokio::test]
    async fn test_menus_without_selectors() {
        let host = MemoryHost::new(WindowId::new(1));
        gatherer().create_menus(&host).await.expect("create");
        assert_eq!(host.menus().len(), 7);
    }
}
