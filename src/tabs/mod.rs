//! Tab model and relationship resolution.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `tab` | [`Tab`] as reported by the host |
//! | `query` | [`TabQuery`] filters and URL match patterns |
//! | `snapshot` | [`TabSnapshot`] and [`ConsideredSet`] |
//! | `relations` | Opener-graph [`Resolver`] |

// ============================================================================
// Submodules
// ============================================================================

mod query;
mod relations;
mod snapshot;
mod tab;

// ============================================================================
// Re-exports
// ============================================================================

pub use query::{ALL_URLS, MatchPattern, TabQuery};
pub use relations::{Depth, Resolver};
pub use snapshot::{ConsideredSet, TabSnapshot};
pub use tab::{MutedInfo, Tab, TabStatus};
