//! WebSocket transport between this process and the extension.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌──────────────────┐
//! │  Dispatcher      │                              │  Extension       │
//! │  (Rust)          │         WebSocket            │  (Background)    │
//! │  PendingServer   │◄────────────────────────────►│                  │
//! │  → Connection    │      localhost:PORT          │  WebSocket       │
//! │  → RemoteHost    │                              │  client          │
//! └──────────────────┘                              └──────────────────┘
//! ```
//!
//! Requests flow left to right and are answered by responses. Listener
//! invocations flow right to left as events.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket loop and request correlation |
//! | `server` | Binding and accepting the extension |

// ============================================================================
// Submodules
// ============================================================================

/// Socket loop and request correlation.
pub mod connection;

/// Binding and accepting the extension.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_COMMAND_TIMEOUT, EventHandler, ReadyData};
pub use server::{DEFAULT_ACCEPT_TIMEOUT, PendingServer};
