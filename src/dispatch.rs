//! Routing host events to the enabled extensions.
//!
//! Each [`Event`] from the transport is parsed into a [`HostEvent`] and
//! handled on its own tokio task. Handler errors are logged and never reach
//! the connection loop.
//!
//! | Event | Routed to |
//! |-------|-----------|
//! | `menus.onClicked` | owner of the clicked menu item |
//! | `commands.onCommand`, `runtime.onMessage` | selection, site or gather command |
//! | `runtime.onInstalled` | default selectors, menu install |
//! | `storage.onChanged` | menu rebuild |
//! | `browserAction.onClicked` | site grouping |
//! | `tabs.onUpdated`, `tabs.onRemoved` | image printing |
//!
//! # Example
//!
//! ```ignore
//! use webext_tabkit::{Config, dispatch};
//!
//! let config = Config::from_file("tabkit.json")?;
//! dispatch::serve(config).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gather::Gatherer;
use crate::group::{SiteCommand, SiteGrouper, bookmarks};
use crate::host::{Host, RemoteHost};
use crate::identifiers::TabId;
use crate::print::{ImagePrinter, MENU_PRINT_IMAGE};
use crate::protocol::{Event, MenuClick, ParsedEvent};
use crate::select::{Selection, TabSelector};
use crate::tabs::{Tab, TabStatus};
use crate::transport::{EventHandler, PendingServer};

// ============================================================================
// App
// ============================================================================

/// An extension that can be enabled in [`Config::apps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum App {
    /// Tab selection by relationship, position and state.
    #[serde(rename = "select-tabs")]
    SelectTabs,
    /// Grouping tabs by site.
    #[serde(rename = "group-same-site-tabs")]
    GroupSites,
    /// Running snippets across tabs.
    #[serde(rename = "gather-from-tabs")]
    Gather,
    /// Opening bookmarks into a tab group.
    #[serde(rename = "open-bookmarks-in-tabgroup")]
    BookmarkGroups,
    /// Printing images.
    #[serde(rename = "quick-image-print")]
    ImagePrint,
}

impl App {
    /// Every extension.
    pub const ALL: [Self; 5] = [
        Self::SelectTabs,
        Self::GroupSites,
        Self::Gather,
        Self::BookmarkGroups,
        Self::ImagePrint,
    ];

    /// Configuration name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectTabs => "select-tabs",
            Self::GroupSites => "group-same-site-tabs",
            Self::Gather => "gather-from-tabs",
            Self::BookmarkGroups => "open-bookmarks-in-tabgroup",
            Self::ImagePrint => "quick-image-print",
        }
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// HostEvent
// ============================================================================

/// A host event the dispatcher acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Context menu click.
    MenuClicked(MenuClick),
    /// Keyboard command, or a page message naming one.
    Command(String),
    /// Extension installed or updated.
    Installed(String),
    /// Extension storage changed.
    StorageChanged(Vec<String>),
    /// Toolbar button click.
    BrowserActionClicked {
        /// Mouse button.
        button: u8,
        /// Active tab.
        tab: Option<Tab>,
    },
    /// Tab property change.
    TabUpdated {
        /// Tab ID.
        tab_id: TabId,
        /// New status, if it changed.
        status: Option<TabStatus>,
    },
    /// Tab closed.
    TabRemoved(TabId),
}

impl HostEvent {
    /// Parses a transport event. Unknown events yield `None`.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        match event.parse() {
            ParsedEvent::MenuClicked(click) => Some(Self::MenuClicked(click)),
            ParsedEvent::Command { command } => Some(Self::Command(command)),
            ParsedEvent::Message { cmd } => Some(Self::Command(cmd)),
            ParsedEvent::Installed { reason } => Some(Self::Installed(reason)),
            ParsedEvent::StorageChanged { keys } => Some(Self::StorageChanged(keys)),
            ParsedEvent::BrowserActionClicked { button, tab } => {
                Some(Self::BrowserActionClicked { button, tab })
            }
            ParsedEvent::TabUpdated { tab_id, status } => Some(Self::TabUpdated { tab_id, status }),
            ParsedEvent::TabRemoved { tab_id } => Some(Self::TabRemoved(tab_id)),
            ParsedEvent::Unknown { method, .. } => {
                debug!(%method, "Ignoring unknown event");
                None
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::MenuClicked(_) => "menu",
            Self::Command(_) => "command",
            Self::Installed(_) => "installed",
            Self::StorageChanged(_) => "storage",
            Self::BrowserActionClicked { .. } => "browser-action",
            Self::TabUpdated { .. } => "tab-updated",
            Self::TabRemoved(_) => "tab-removed",
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

struct DispatcherInner {
    host: Arc<dyn Host>,
    config: Config,
    selector: TabSelector,
    sites: SiteGrouper,
    gatherer: Gatherer,
    printer: ImagePrinter,
}

/// Routes host events to the enabled extensions.
///
/// Cheap to clone; clones share the pending print state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("apps", &self.inner.config.apps)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over `host`.
    #[must_use]
    pub fn new(host: Arc<dyn Host>, config: Config) -> Self {
        let inner = DispatcherInner {
            selector: TabSelector::new(&config),
            sites: SiteGrouper::new(config.collapse_groups),
            gatherer: Gatherer::new(&config),
            printer: ImagePrinter::new(),
            host,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &dyn Host {
        self.inner.host.as_ref()
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    fn enabled(&self, app: App) -> bool {
        self.inner.config.is_enabled(app)
    }

    /// Removes every menu item and creates the menus of each enabled app.
    ///
    /// # Errors
    ///
    /// Propagates the first failing host call.
    pub async fn install_menus(&self) -> Result<()> {
        let host = self.host();
        host.remove_all_menus().await?;

        for app in App::ALL.into_iter().filter(|app| self.enabled(*app)) {
            match app {
                App::SelectTabs => self.inner.selector.create_menus(host).await?,
                App::GroupSites => {
                    for item in SiteGrouper::menu_items() {
                        host.create_menu(&item).await?;
                    }
                }
                App::Gather => self.inner.gatherer.create_menus(host).await?,
                App::BookmarkGroups => {
                    let item = bookmarks::menu_item(&self.inner.config.extension_name);
                    host.create_menu(&item).await?;
                }
                App::ImagePrint => host.create_menu(&ImagePrinter::menu_item()).await?,
            }
            debug!(%app, "Menus installed");
        }

        Ok(())
    }

    /// Handles `event` on a new task.
    ///
    /// Returns `None` for events the dispatcher does not act on.
    pub fn dispatch(&self, event: Event) -> Option<JoinHandle<()>> {
        let host_event = HostEvent::from_event(&event)?;
        let dispatcher = self.clone();

        Some(tokio::spawn(async move {
            let kind = host_event.kind();
            match dispatcher.handle(host_event).await {
                Ok(()) => {}
                Err(e @ Error::MissingConfiguration { .. }) => {
                    info!(event = kind, error = %e, "Event skipped");
                }
                Err(e) => warn!(event = kind, error = %e, "Event handler failed"),
            }
        }))
    }

    /// Event callback for [`Connection::set_event_handler`](crate::transport::Connection::set_event_handler).
    #[must_use]
    pub fn event_handler(&self) -> EventHandler {
        let dispatcher = self.clone();
        Box::new(move |event| {
            dispatcher.dispatch(event);
        })
    }

    /// Handles one event to completion.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownCommand`] if no enabled app owns a menu item or
    /// command; handler errors propagate.
    pub async fn handle(&self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::MenuClicked(click) => self.on_menu_click(&click).await,
            HostEvent::Command(command) => self.on_command(&command).await,
            HostEvent::Installed(reason) => {
                if self.enabled(App::Gather) {
                    self.inner.gatherer.on_installed(self.host(), &reason).await?;
                }
                self.install_menus().await
            }
            HostEvent::StorageChanged(keys) => {
                if self.enabled(App::Gather) {
                    debug!(?keys, "Storage changed, rebuilding menus");
                    self.install_menus().await?;
                }
                Ok(())
            }
            HostEvent::BrowserActionClicked { button, .. } => {
                if self.enabled(App::GroupSites) {
                    self.inner.sites.on_browser_action(self.host(), button).await?;
                }
                Ok(())
            }
            HostEvent::TabUpdated { tab_id, status } => {
                if self.enabled(App::ImagePrint) {
                    self.inner
                        .printer
                        .on_tab_updated(self.host(), tab_id, status)
                        .await?;
                }
                Ok(())
            }
            HostEvent::TabRemoved(tab_id) => {
                self.inner.printer.on_tab_removed(tab_id);
                Ok(())
            }
        }
    }

    async fn on_menu_click(&self, click: &MenuClick) -> Result<()> {
        let host = self.host();
        let id = click.menu_item_id.as_str();

        if id == bookmarks::MENU_OPEN_IN_GROUP && self.enabled(App::BookmarkGroups) {
            let bookmark_id = click
                .bookmark_id
                .as_ref()
                .ok_or_else(|| Error::invalid_argument("bookmark click without bookmarkId"))?;
            bookmarks::open_in_group(host, bookmark_id).await?;
            return Ok(());
        }

        if id == MENU_PRINT_IMAGE && self.enabled(App::ImagePrint) {
            self.inner.printer.on_menu_click(host, click).await?;
            return Ok(());
        }

        if SiteGrouper::owns_menu(id) && self.enabled(App::GroupSites) {
            self.inner.sites.on_menu_click(host, click).await?;
            return Ok(());
        }

        if Gatherer::owns_menu(id) && self.enabled(App::Gather) {
            self.inner.gatherer.on_menu_click(host, click).await?;
            return Ok(());
        }

        if self.enabled(App::SelectTabs) {
            self.inner.selector.handle(host, id).await?;
            return Ok(());
        }

        Err(Error::unknown_command(id))
    }

    async fn on_command(&self, command: &str) -> Result<()> {
        let host = self.host();

        if self.enabled(App::SelectTabs) && command.parse::<Selection>().is_ok() {
            self.inner.selector.handle(host, command).await?;
            return Ok(());
        }

        if self.enabled(App::GroupSites)
            && let Ok(site_command) = command.parse::<SiteCommand>()
        {
            self.inner.sites.on_command(host, site_command).await?;
            return Ok(());
        }

        if self.enabled(App::Gather) {
            self.inner.gatherer.on_command(host, command).await?;
            return Ok(());
        }

        Err(Error::unknown_command(command))
    }
}

// ============================================================================
// Serving
// ============================================================================

/// Waits for the extension to connect and serves its events until the
/// socket closes.
///
/// # Errors
///
/// Invalid configuration, bind and handshake failures, and menu install
/// failures propagate.
pub async fn serve(config: Config) -> Result<()> {
    config.validate()?;

    let server = PendingServer::bind(config.bind_address, config.port).await?;
    info!(url = %server.ws_url(), "Waiting for extension");

    let (connection, ready) = server.accept().await?;
    let connection = connection.with_request_timeout(config.command_timeout());
    info!(extension = %ready.extension, version = %ready.version, "Extension ready");

    let host = RemoteHost::new(connection.clone()).with_icon(config.icon_url.clone());
    let dispatcher = Dispatcher::new(Arc::new(host), config);

    dispatcher.install_menus().await?;
    connection.set_event_handler(dispatcher.event_handler());

    connection.closed().await;
    info!("Extension disconnected");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
