//! Keyboard shortcut bindings.
//!
//! Bindings live in extension storage as an object keyed by command name:
//!
//! ```json
//! { "gather-1": { "scope": "highlighted", "format": 0, "action": "ct" } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::host::Host;
use crate::tabs::{Tab, TabQuery};

use super::OutputAction;

// ============================================================================
// Scope
// ============================================================================

/// Which tabs a shortcut runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The active tab.
    Current,
    /// Highlighted tabs of the current window.
    Highlighted,
    /// Every tab of the current window.
    Window,
    /// Every tab of every window.
    All,
}

impl Scope {
    /// Host query for the scope.
    #[must_use]
    pub fn query(&self) -> TabQuery {
        match self {
            Self::Current => TabQuery::active_tab(),
            Self::Highlighted => TabQuery::current_window().with_highlighted(true),
            Self::Window => TabQuery::current_window(),
            Self::All => TabQuery::new(),
        }
    }

    /// Fetches the tabs in scope.
    ///
    /// # Errors
    ///
    /// Host errors propagate.
    pub async fn tabs(&self, host: &dyn Host) -> Result<Vec<Tab>> {
        host.query_tabs(&self.query()).await
    }
}

// ============================================================================
// ShortcutBinding
// ============================================================================

/// One shortcut: run selector `format` in `scope`, deliver via `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    /// Tabs to run in.
    pub scope: Scope,
    /// Index into the selector list.
    pub format: usize,
    /// Output destination.
    pub action: OutputAction,
}

/// Bindings keyed by command name.
pub type ShortcutConfig = FxHashMap<String, ShortcutBinding>;

/// Decodes stored bindings.
///
/// # Errors
///
/// [`Error::MissingConfiguration`] if the value is absent or malformed.
pub fn config_from_storage(key: &str, value: Option<Value>) -> Result<ShortcutConfig> {
    let value = value.ok_or_else(|| Error::missing_configuration(key))?;
    serde_json::from_value(value).map_err(|_| Error::missing_configuration(key))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_decode_bindings() {
        let config = config_from_storage(
            "shortcutconfig",
            Some(json!({
                "gather-1": {"scope": "highlighted", "format": 1, "action": "ct"},
                "gather-2": {"scope": "all", "format": 0, "action": "dl"}
            })),
        )
        .expect("decode");

        assert_eq!(
            config.get("gather-1"),
            Some(&ShortcutBinding {
                scope: Scope::Highlighted,
                format: 1,
                action: OutputAction::CopyText,
            })
        );
        assert_eq!(config["gather-2"].scope, Scope::All);
    }

    #[test]
    fn test_missing_or_malformed() {
        assert!(matches!(
            config_from_storage("shortcutconfig", None),
            Err(Error::MissingConfiguration { .. })
        ));
        assert!(matches!(
            config_from_storage("shortcutconfig", Some(json!({"x": {"scope": "tab"}}))),
            Err(Error::MissingConfiguration { .. })
        ));
    }

    #[test]
    fn test_scope_queries() {
        assert_eq!(Scope::Current.query().active, Some(true));
        assert_eq!(Scope::Highlighted.query().highlighted, Some(true));
        assert_eq!(Scope::Window.query().current_window, Some(true));
        assert_eq!(Scope::All.query(), TabQuery::new());
    }
}
