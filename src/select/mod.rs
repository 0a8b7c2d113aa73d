//! Tab selection by relationship, position and state.
//!
//! Menu clicks and keyboard commands name a [`Selection`]; the
//! [`TabSelector`] picks matching tabs relative to the active tab and
//! highlights them.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `selection` | [`Selection`] kinds and tab picking |
//! | `highlight` | Per-window highlight calls |
//! | `user_script` | Stored selector predicates |

// ============================================================================
// Submodules
// ============================================================================

pub mod highlight;
mod selection;
pub mod user_script;

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::tabs::Tab;

// ============================================================================
// Re-exports
// ============================================================================

pub use highlight::{HighlightOutcome, NO_MATCH_MESSAGE};
pub use selection::{MenuSection, Selection};

// ============================================================================
// TabSelector
// ============================================================================

/// Runs selections and highlights the result.
#[derive(Debug, Clone)]
pub struct TabSelector {
    /// Notification title.
    extension_name: String,
    /// Storage key of the selector list.
    selectors_key: String,
}

impl TabSelector {
    /// Creates a selector from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            extension_name: config.extension_name.clone(),
            selectors_key: config.selectors_key.clone(),
        }
    }

    /// Runs `selection` relative to `focal`.
    ///
    /// # Errors
    ///
    /// Host errors and missing selector storage propagate.
    pub async fn run(
        &self,
        host: &dyn Host,
        selection: Selection,
        focal: &Tab,
    ) -> Result<HighlightOutcome> {
        debug!(%selection, tab_id = %focal.id, "Running selection");

        let Some(tabs) = selection.pick(host, focal, &self.selectors_key).await? else {
            debug!(%selection, "Selection not applicable to tab");
            return Ok(HighlightOutcome::Skipped);
        };

        let outcome = highlight::highlight(host, &tabs, &self.extension_name).await?;
        info!(%selection, matched = tabs.len(), "Selection applied");
        Ok(outcome)
    }

    /// Handles a menu item or command name.
    ///
    /// Selections always act on the active tab of the current window.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownCommand`] if `name` is not a selection,
    /// [`Error::InvalidArgument`] if no tab is active.
    pub async fn handle(&self, host: &dyn Host, name: &str) -> Result<HighlightOutcome> {
        let selection: Selection = name.parse()?;
        let focal = host
            .active_tab()
            .await?
            .ok_or_else(|| Error::invalid_argument("no active tab in the current window"))?;
        self.run(host, selection, &focal).await
    }

    /// Creates the selection context menus.
    ///
    /// # Errors
    ///
    /// Propagates the first failing host call.
    pub async fn create_menus(&self, host: &dyn Host) -> Result<()> {
        for item in Selection::menu_items() {
            host.create_menu(&item).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::MemoryHost;
    use crate::identifiers::{TabId, WindowId};

    fn selector() -> TabSelector {
        TabSelector::new(&Config::new().with_extension_name("Select Tabs"))
    }

    fn tab(id: u32, index: u32) -> Tab {
        Tab::new(TabId::new(id).expect("valid id"), WindowId::new(1)).with_index(index)
    }

    #[tokio::test]
    async fn test_handle_uses_active_tab() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([
            tab(1, 0),
            tab(2, 1).with_active(),
            tab(3, 2),
        ]);

        let outcome = selector()
            .handle(&host, "To the Right")
            .await
            .expect("handle");

        assert_eq!(outcome, HighlightOutcome::Highlighted { windows: 1 });
        assert_eq!(host.highlights(), vec![(WindowId::new(1), vec![2])]);
    }

    #[tokio::test]
    async fn test_empty_selection_notifies() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(1, 0).with_active()]);

        let outcome = selector().handle(&host, "Children").await.expect("handle");

        assert_eq!(outcome, HighlightOutcome::NothingMatched);
        assert_eq!(
            host.notifications(),
            vec![("Select Tabs".to_string(), NO_MATCH_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_inapplicable_selection_is_silent() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(1, 0).with_active()]);

        let outcome = selector()
            .handle(&host, "Same Container")
            .await
            .expect("handle");

        assert_eq!(outcome, HighlightOutcome::Skipped);
        assert!(host.notifications().is_empty());
        assert!(host.highlights().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_name() {
        let host = MemoryHost::new(WindowId::new(1)).with_tabs([tab(1, 0).with_active()]);
        let err = selector().handle(&host, "Sideways").await.expect_err("unknown");
        assert!(matches!(err, Error::UnknownCommand { .. }));
    }

    #[tokio::test]
    async fn test_no_active_tab() {
        let host = MemoryHost::new(WindowId::new(1));
        let err = selector().handle(&host, "All").await.expect_err("no tab");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_create_menus() {
        let host = MemoryHost::new(WindowId::new(1));
        selector().create_menus(&host).await.expect("menus");
        assert_eq!(host.menus().len(), Selection::menu_items().len());
    }
}
