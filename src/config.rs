//! Runtime configuration.
//!
//! # Example
//!
//! ```ignore
//! use webext_tabkit::{App, Config};
//!
//! let config = Config::new()
//!     .with_extension_name("Select Tabs")
//!     .with_apps([App::SelectTabs])
//!     .with_port(8765);
//! config.validate()?;
//! ```
//!
//! Configuration can also be read from JSON; missing fields keep their
//! defaults:
//!
//! ```json
//! { "extension_name": "Gather", "apps": ["gather-from-tabs"], "port": 8765 }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::App;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default storage key for selector snippets.
pub const DEFAULT_SELECTORS_KEY: &str = "selectors";

/// Default storage key for gather shortcut bindings.
pub const DEFAULT_SHORTCUTS_KEY: &str = "shortcutconfig";

// ============================================================================
// Config
// ============================================================================

/// Configuration for a [`Dispatcher`](crate::Dispatcher) and its transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title used for notifications and the bookmark menu item.
    pub extension_name: String,

    /// Notification icon path inside the extension.
    pub icon_url: String,

    /// Storage key holding the selector list.
    pub selectors_key: String,

    /// Storage key holding gather shortcut bindings.
    pub shortcuts_key: String,

    /// Whether site groups are collapsed when the click does not say otherwise.
    pub collapse_groups: bool,

    /// Address the WebSocket server binds to.
    pub bind_address: IpAddr,

    /// Port the WebSocket server binds to (`0` picks a free port).
    pub port: u16,

    /// Host call timeout in milliseconds.
    pub command_timeout_ms: u64,

    /// Extensions served by this process.
    pub apps: Vec<App>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension_name: env!("CARGO_PKG_NAME").to_string(),
            icon_url: "icon.png".to_string(),
            selectors_key: DEFAULT_SELECTORS_KEY.to_string(),
            shortcuts_key: DEFAULT_SHORTCUTS_KEY.to_string(),
            collapse_groups: true,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            command_timeout_ms: 30_000,
            apps: App::ALL.to_vec(),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Config {
    /// Creates a configuration with defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration and validates it.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] on malformed JSON, [`Error::Config`] if invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file and validates it.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Config {
    /// Sets the extension name.
    #[inline]
    #[must_use]
    pub fn with_extension_name(mut self, name: impl Into<String>) -> Self {
        self.extension_name = name.into();
        self
    }

    /// Sets the notification icon.
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = icon_url.into();
        self
    }

    /// Sets the selector storage key.
    #[inline]
    #[must_use]
    pub fn with_selectors_key(mut self, key: impl Into<String>) -> Self {
        self.selectors_key = key.into();
        self
    }

    /// Sets the shortcut storage key.
    #[inline]
    #[must_use]
    pub fn with_shortcuts_key(mut self, key: impl Into<String>) -> Self {
        self.shortcuts_key = key.into();
        self
    }

    /// Sets the default collapse state of site groups.
    #[inline]
    #[must_use]
    pub fn with_collapse_groups(mut self, collapsed: bool) -> Self {
        self.collapse_groups = collapsed;
        self
    }

    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub fn with_bind_address(mut self, address: IpAddr) -> Self {
        self.bind_address = address;
        self
    }

    /// Sets the bind port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the host call timeout.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Replaces the enabled extensions.
    #[inline]
    #[must_use]
    pub fn with_apps(mut self, apps: impl IntoIterator<Item = App>) -> Self {
        self.apps = apps.into_iter().collect();
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Config {
    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.extension_name.trim().is_empty() {
            return Err(Error::config("extension_name must not be empty"));
        }
        if self.selectors_key.is_empty() || self.shortcuts_key.is_empty() {
            return Err(Error::config("storage keys must not be empty"));
        }
        if self.command_timeout_ms == 0 {
            return Err(Error::config("command_timeout_ms must be greater than zero"));
        }
        if self.apps.is_empty() {
            return Err(Error::config("at least one app must be enabled"));
        }
        Ok(())
    }

    /// Returns the socket address to bind.
    #[inline]
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Returns the host call timeout.
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Returns `true` if `app` is enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, app: App) -> bool {
        self.apps.contains(&app)
    }
}

// ============================================================================
// Selector
// ============================================================================

/// A stored code snippet.
///
/// Gather runs snippets for their output; tab selection runs them as
/// predicates over `(clkTab, cmpTab)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    /// Script source.
    #[serde(default)]
    pub code: String,

    /// Disabled selectors are skipped.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Selector {
    /// Creates an enabled selector.
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            enabled: true,
        }
    }

    /// Marks the selector disabled.
    #[inline]
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Menu title: the first line of the code, trimmed.
    #[must_use]
    pub fn title(&self) -> &str {
        self.code.lines().next().unwrap_or_default().trim()
    }

    /// Returns `true` if the selector should run.
    #[inline]
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.enabled && !self.code.is_empty()
    }

    /// Decodes a stored selector list.
    ///
    /// # Errors
    ///
    /// [`Error::MissingConfiguration`] if the value is absent or not a list
    /// of selectors.
    pub fn list_from_storage(key: &str, value: Option<Value>) -> Result<Vec<Self>> {
        let value = value.ok_or_else(|| Error::missing_configuration(key))?;
        serde_json::from_value(value).map_err(|_| Error::missing_configuration(key))
    }
}

/// Snippets stored on first install.
#[must_use]
pub fn default_selectors() -> Vec<Selector> {
    [
        "// Title and URL\ndocument.title + \"\\n\" + location.href + \"\\n\";",
        "// Markdown link\n`[${document.title}](${location.href})\\n`;",
        "// HTML link\n`<a href=\"${location.href}\">${document.title}</a><br/>\\n`;",
        "// Selected text\nwindow.getSelection().toString() + \"\\n\";",
        "// Image URLs\n[...document.images].map((img) => img.src).join(\"\\n\") + \"\\n\";",
    ]
    .into_iter()
    .map(Selector::new)
    .collect()
}

// ============================================================================
// Tests
// ============================================================================
