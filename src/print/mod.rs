//! Printing an image from its context menu.
//!
//! The image opens in a new foreground tab in the clicked tab's container.
//! Once that tab finishes loading, a script prints the page and closes the
//! tab. Only one print is pending at a time; a newer click replaces it.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::host::Host;
use crate::identifiers::TabId;
use crate::protocol::{CreateTab, MenuClick, MenuContext, MenuItem};
use crate::tabs::TabStatus;

// ============================================================================
// Constants
// ============================================================================

/// Menu item ID on the image context menu.
pub const MENU_PRINT_IMAGE: &str = "print-image";

/// Script run in the loaded image tab.
pub const PRINT_SCRIPT: &str = "(function(){window.print();window.close();}())";

// ============================================================================
// ImagePrinter
// ============================================================================

/// Tracks the tab waiting to be printed.
#[derive(Debug, Default)]
pub struct ImagePrinter {
    pending: Mutex<Option<TabId>>,
}

impl ImagePrinter {
    /// Creates a printer with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Image context menu item.
    #[must_use]
    pub fn menu_item() -> MenuItem {
        MenuItem::new(MENU_PRINT_IMAGE, "Print Image", &[MenuContext::Image])
    }

    /// Returns the tab waiting to be printed.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<TabId> {
        *self.pending.lock()
    }

    /// Opens `src_url` in a foreground tab and marks it pending.
    ///
    /// # Errors
    ///
    /// Host errors propagate; nothing is marked pending then.
    pub async fn open(
        &self,
        host: &dyn Host,
        src_url: &str,
        cookie_store_id: Option<String>,
    ) -> Result<TabId> {
        let props = CreateTab::foreground(src_url).with_cookie_store(cookie_store_id);
        let tab = host.create_tab(&props).await?;

        *self.pending.lock() = Some(tab.id);
        debug!(tab_id = %tab.id, "Image tab opened for printing");
        Ok(tab.id)
    }

    /// Handles an image menu click.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the click has no image URL.
    pub async fn on_menu_click(&self, host: &dyn Host, click: &MenuClick) -> Result<TabId> {
        let src_url = click
            .src_url
            .as_deref()
            .ok_or_else(|| Error::invalid_argument("image click without srcUrl"))?;
        let cookie_store_id = click.tab.as_ref().and_then(|t| t.cookie_store_id.clone());

        self.open(host, src_url, cookie_store_id).await
    }

    /// Prints the pending tab once it has loaded.
    ///
    /// Returns `true` if the print script was run.
    ///
    /// # Errors
    ///
    /// Host errors propagate. The tab is no longer pending either way.
    pub async fn on_tab_updated(
        &self,
        host: &dyn Host,
        tab_id: TabId,
        status: Option<TabStatus>,
    ) -> Result<bool> {
        if status != Some(TabStatus::Complete) || !self.take_if_pending(tab_id) {
            return Ok(false);
        }

        host.execute_in_tab(Some(tab_id), PRINT_SCRIPT, &[]).await?;
        info!(%tab_id, "Image printed");
        Ok(true)
    }

    /// Forgets the pending tab if it was closed.
    pub fn on_tab_removed(&self, tab_id: TabId) {
        if self.take_if_pending(tab_id) {
            debug!(%tab_id, "Pending image tab closed");
        }
    }

    fn take_if_pending(&self, tab_id: TabId) -> bool {
        let mut pending = self.pending.lock();
        if *pending == Some(tab_id) {
            *pending = None;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
