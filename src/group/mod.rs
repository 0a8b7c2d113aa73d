//! Tab grouping.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `site` | Group tabs sharing a hostname |
//! | `bookmarks` | Open a bookmark or folder into a new group |

pub mod bookmarks;
pub mod site;

pub use site::{SiteCommand, SiteGrouper, group_title};
