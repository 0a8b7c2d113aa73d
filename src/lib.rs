//! WebExtension tab toolkit - tab selection, grouping and gathering.
//!
//! This library holds the decision logic of five small browser extensions
//! and drives the browser through a thin extension over WebSocket.
//!
//! # Architecture
//!
//! - **Local End (Rust)**: receives host events, decides, issues host calls
//! - **Remote End (Extension)**: forwards listener calls as events and
//!   executes `module.methodName` requests against the WebExtension API
//!
//! Key design principles:
//!
//! - Handlers see the browser only through the [`Host`] trait
//! - Every action fetches a fresh tab snapshot; nothing is cached
//! - Opener relationships are resolved over an explicit [`TabSnapshot`]
//! - Each event runs on its own task; errors are logged, never fatal
//!
//! # Quick Start
//!
//! ```no_run
//! use webext_tabkit::{App, Config, Result, dispatch};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::new()
//!         .with_extension_name("Select Tabs")
//!         .with_apps([App::SelectTabs, App::GroupSites])
//!         .with_port(8765);
//!
//!     // Waits for the extension, then serves until it disconnects.
//!     dispatch::serve(config).await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tabs`] | Tab model, queries, opener-graph [`Resolver`] |
//! | [`select`] | Selections and the highlight bridge |
//! | [`group`] | Site grouping and bookmark groups |
//! | [`gather`] | Snippets run across tabs |
//! | [`print`] | Image printing |
//! | [`dispatch`] | Event routing and serving |
//! | [`host`] | [`Host`] trait, remote and in-memory hosts |
//! | [`config`] | [`Config`] and stored [`Selector`]s |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebSocket message types |
//! | [`transport`] | WebSocket server and connection |

// ============================================================================
// Modules
// ============================================================================

/// Runtime configuration and stored selectors.
pub mod config;

/// Event routing to the enabled extensions.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Running stored snippets across tabs.
pub mod gather;

/// Tab grouping by site and from bookmarks.
pub mod group;

/// Host browser abstraction.
pub mod host;

/// Type-safe identifiers for browser entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Printing images from the context menu.
pub mod print;

/// WebSocket protocol message types.
pub mod protocol;

/// Tab selection and highlighting.
pub mod select;

/// Tab model and relationship resolution.
pub mod tabs;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{Config, Selector};

// Dispatch
pub use dispatch::{App, Dispatcher, HostEvent};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::{Host, MemoryHost, RemoteHost};

// Identifier types
pub use identifiers::{BookmarkId, GroupId, RequestId, TabId, WindowId};

// Tab types
pub use tabs::{ConsideredSet, Depth, Resolver, Tab, TabQuery, TabSnapshot, TabStatus};
