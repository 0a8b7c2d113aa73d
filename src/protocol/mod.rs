//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between the
//! local end (Rust) and the remote end (extension background page).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Host API call |
//! | `Response` | Remote → Local | Host API result |
//! | `Event` | Remote → Local | Host listener invocation |
//!
//! # Command Naming
//!
//! Commands use the host API path, so the remote end can dispatch them
//! without a translation table:
//!
//! - `tabs.query`
//! - `tabGroups.update`
//! - `storage.local.get`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by namespace |
//! | `event` | Event types |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by namespace.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    BookmarkNode, BookmarksCommand, BrowserActionCommand, ClipboardCommand, Command, CreateTab,
    DownloadsCommand, GroupUpdate, MenuContext, MenuItem, MenuItemType, MenusCommand,
    NotificationsCommand, StorageCommand, TabGroupsCommand, TabsCommand,
};
pub use event::{Event, MenuClick, ParsedEvent};
pub use request::{Request, Response, ResponseType};
