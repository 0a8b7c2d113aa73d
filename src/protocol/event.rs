//! Event message types.
//!
//! Events are host listener invocations forwarded from the remote end
//! (extension) to the local end (Rust).
//!
//! # Event Types
//!
//! | Method | Host listener |
//! |--------|---------------|
//! | `menus.onClicked` | context menu click |
//! | `commands.onCommand` | keyboard shortcut |
//! | `runtime.onMessage` | message from an extension page |
//! | `runtime.onInstalled` | install / update |
//! | `storage.onChanged` | storage write |
//! | `browserAction.onClicked` | toolbar button |
//! | `tabs.onUpdated` | tab property change |
//! | `tabs.onRemoved` | tab closed |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::identifiers::{BookmarkId, RequestId, TabId};
use crate::tabs::{Tab, TabStatus};

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "id": "event-uuid",
///   "type": "event",
///   "method": "menus.onClicked",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: RequestId,

    /// Event type marker (always "event").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event name in `namespace.listenerName` format.
    pub method: String,

    /// Listener arguments.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Returns the namespace from the method.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the listener name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.rsplit('.').next().unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    ///
    /// Events whose params do not match the expected shape are returned as
    /// [`ParsedEvent::Unknown`] and logged.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        self.parse_internal()
    }
}

// ============================================================================
// MenuClick
// ============================================================================

/// Arguments of a `menus.onClicked` listener call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuClick {
    /// Clicked item ID (host may send a number).
    #[serde(deserialize_with = "string_or_number")]
    pub menu_item_id: String,

    /// Mouse button (`0` left, `1` middle).
    #[serde(default)]
    pub button: u8,

    /// Frame the click came from, if any.
    #[serde(default)]
    pub frame_id: Option<u64>,

    /// Bookmark the menu was opened on.
    #[serde(default)]
    pub bookmark_id: Option<BookmarkId>,

    /// Source URL of the clicked image.
    #[serde(default)]
    pub src_url: Option<String>,

    /// Tab the menu was opened on.
    #[serde(default)]
    pub tab: Option<Tab>,
}

impl MenuClick {
    /// Returns `true` for a middle-button click.
    #[inline]
    #[must_use]
    pub fn is_middle_click(&self) -> bool {
        self.button == 1
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// Context menu item clicked.
    MenuClicked(MenuClick),

    /// Keyboard command triggered.
    Command {
        /// Command name from the manifest.
        command: String,
    },

    /// Message from an extension page asking to run a command.
    Message {
        /// Command name.
        cmd: String,
    },

    /// Extension installed or updated.
    Installed {
        /// `install`, `update`, `browser_update`, ...
        reason: String,
    },

    /// Storage keys changed.
    StorageChanged {
        /// Changed keys.
        keys: Vec<String>,
    },

    /// Toolbar button clicked.
    BrowserActionClicked {
        /// Mouse button.
        button: u8,
        /// Active tab.
        tab: Option<Tab>,
    },

    /// Tab property changed.
    TabUpdated {
        /// Tab ID.
        tab_id: TabId,
        /// New status, if the status changed.
        status: Option<TabStatus>,
    },

    /// Tab closed.
    TabRemoved {
        /// Tab ID.
        tab_id: TabId,
    },

    /// Unknown or malformed event.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Event Parsing Implementation
// ============================================================================

impl Event {
    /// Internal parsing implementation.
    fn parse_internal(&self) -> ParsedEvent {
        let parsed = match self.method.as_str() {
            "menus.onClicked" => self.decode::<MenuClick>().map(ParsedEvent::MenuClicked),

            "commands.onCommand" => Some(ParsedEvent::Command {
                command: self.get_string("command"),
            }),

            "runtime.onMessage" => Some(ParsedEvent::Message {
                cmd: self.get_string("cmd"),
            }),

            "runtime.onInstalled" => Some(ParsedEvent::Installed {
                reason: self.get_string("reason"),
            }),

            "storage.onChanged" => Some(ParsedEvent::StorageChanged {
                keys: self
                    .params
                    .get("changes")
                    .and_then(|v| v.as_object())
                    .map(|m| m.keys().cloned().collect())
                    .unwrap_or_default(),
            }),

            "browserAction.onClicked" => Some(ParsedEvent::BrowserActionClicked {
                button: self.get_u64("button") as u8,
                tab: self
                    .params
                    .get("tab")
                    .and_then(|v| serde_json::from_value(v.clone()).ok()),
            }),

            "tabs.onUpdated" => self.get_tab_id("tabId").map(|tab_id| ParsedEvent::TabUpdated {
                tab_id,
                status: self
                    .params
                    .get("changeInfo")
                    .and_then(|c| c.get("status"))
                    .and_then(|s| serde_json::from_value(s.clone()).ok()),
            }),

            "tabs.onRemoved" => self
                .get_tab_id("tabId")
                .map(|tab_id| ParsedEvent::TabRemoved { tab_id }),

            _ => None,
        };

        parsed.unwrap_or_else(|| ParsedEvent::Unknown {
            method: self.method.clone(),
            params: self.params.clone(),
        })
    }

    /// Decodes the params into a typed struct.
    fn decode<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        match serde_json::from_value(self.params.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(method = %self.method, error = %e, "Malformed event params");
                None
            }
        }
    }

    /// Gets a string from params.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a u64 from params.
    #[inline]
    fn get_u64(&self, key: &str) -> u64 {
        self.params
            .get(key)
            .and_then(|v| v.as_u64())
            .unwrap_or_default()
    }

    /// Gets a tab ID from params.
    #[inline]
    fn get_tab_id(&self, key: &str) -> Option<TabId> {
        self.params
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .and_then(TabId::new)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event(method: &str, params: &str) -> Event {
        let json = format!(
            r#"{{"id": "550e8400-e29b-41d4-a716-446655440000", "type": "event", "method": "{method}", "params": {params}}}"#
        );
        serde_json::from_str(&json).expect("parse event")
    }

    #[test]
    fn test_menu_click_parsing() {
        let ev = event(
            "menus.onClicked",
            r#"{"menuItemId": "Same Domain", "button": 1,
                "tab": {"id": 4, "windowId": 1, "url": "https://example.com/"}}"#,
        );
        assert_eq!(ev.module(), "menus");
        assert_eq!(ev.event_name(), "onClicked");

        match ev.parse() {
            ParsedEvent::MenuClicked(click) => {
                assert_eq!(click.menu_item_id, "Same Domain");
                assert!(click.is_middle_click());
                assert_eq!(click.tab.map(|t| t.id.as_u32()), Some(4));
            }
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_numeric_menu_item_id() {
        let ev = event("menus.onClicked", r#"{"menuItemId": 17}"#);
        match ev.parse() {
            ParsedEvent::MenuClicked(click) => assert_eq!(click.menu_item_id, "17"),
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_storage_changed_keys() {
        let ev = event(
            "storage.onChanged",
            r#"{"changes": {"selectors": {"newValue": []}}, "areaName": "local"}"#,
        );
        match ev.parse() {
            ParsedEvent::StorageChanged { keys } => assert_eq!(keys, vec!["selectors"]),
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_tab_updated_status() {
        let ev = event(
            "tabs.onUpdated",
            r#"{"tabId": 9, "changeInfo": {"status": "complete"}}"#,
        );
        match ev.parse() {
            ParsedEvent::TabUpdated { tab_id, status } => {
                assert_eq!(tab_id.as_u32(), 9);
                assert_eq!(status, Some(TabStatus::Complete));
            }
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_menu_click_is_unknown() {
        let ev = event("menus.onClicked", r#"{"button": 0}"#);
        assert!(matches!(ev.parse(), ParsedEvent::Unknown { .. }));
    }

    #[test]
    fn test_unknown_event() {
        let ev = event("custom.unknownEvent", r#"{"foo": "bar"}"#);
        match ev.parse() {
            ParsedEvent::Unknown { method, .. } => assert_eq!(method, "custom.unknownEvent"),
            other => panic!("expected Unknown variant, got {other:?}"),
        }
    }
}
