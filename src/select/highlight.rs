//! Turns a list of tabs into host highlight calls.
//!
//! The host highlights by index within one window, so results are grouped
//! per window first. Window order follows first appearance and index order
//! follows result order; the first tab of each window becomes active.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::Result;
use crate::host::Host;
use crate::identifiers::WindowId;
use crate::tabs::Tab;

// ============================================================================
// Constants
// ============================================================================

/// Notification body shown when a selection matched nothing.
pub const NO_MATCH_MESSAGE: &str = "no tabs matched, selection was not changed";

// ============================================================================
// HighlightOutcome
// ============================================================================

/// What a selection did to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOutcome {
    /// Tabs were highlighted in this many windows.
    Highlighted {
        /// Number of `highlight` calls issued.
        windows: usize,
    },
    /// Nothing matched; the user was notified.
    NothingMatched,
    /// The selection does not apply to the focal tab; nothing was done.
    Skipped,
}

// ============================================================================
// Functions
// ============================================================================

/// Groups tabs into `(window, indices)` pairs.
#[must_use]
pub fn group_by_window<'a>(tabs: impl IntoIterator<Item = &'a Tab>) -> Vec<(WindowId, Vec<u32>)> {
    let mut groups: Vec<(WindowId, Vec<u32>)> = Vec::new();

    for tab in tabs {
        match groups.iter_mut().find(|(window, _)| *window == tab.window_id) {
            Some((_, indices)) => indices.push(tab.index),
            None => groups.push((tab.window_id, vec![tab.index])),
        }
    }

    groups
}

/// Highlights `tabs`, or notifies under `title` when there are none.
///
/// # Errors
///
/// Propagates the first failing host call.
pub async fn highlight(host: &dyn Host, tabs: &[Tab], title: &str) -> Result<HighlightOutcome> {
    if tabs.is_empty() {
        debug!("Selection matched no tabs");
        host.notify(title, NO_MATCH_MESSAGE).await?;
        return Ok(HighlightOutcome::NothingMatched);
    }

    let groups = group_by_window(tabs);
    for (window_id, indices) in &groups {
        debug!(%window_id, count = indices.len(), "Highlighting tabs");
        host.highlight_tabs(*window_id, indices).await?;
    }

    Ok(HighlightOutcome::Highlighted {
        windows: groups.len(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::MemoryHost;
    use crate::identifiers::TabId;

    fn tab(id: u32, window: u32, index: u32) -> Tab {
        Tab::new(TabId::new(id).expect("valid id"), WindowId::new(window)).with_index(index)
    }

    #[test]
    fn test_group_by_window_keeps_order() {
        let tabs = [tab(1, 2, 5), tab(2, 1, 0), tab(3, 2, 1), tab(4, 1, 3)];
        let groups = group_by_window(&tabs);

        assert_eq!(
            groups,
            vec![
                (WindowId::new(2), vec![5, 1]),
                (WindowId::new(1), vec![0, 3]),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_result_notifies() {
        let host = MemoryHost::new(WindowId::new(1));

        let outcome = highlight(&host, &[], "Select Tabs").await.expect("highlight");

        assert_eq!(outcome, HighlightOutcome::NothingMatched);
        assert!(host.highlights().is_empty());
        assert_eq!(
            host.notifications(),
            vec![("Select Tabs".to_string(), NO_MATCH_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_two_windows_two_calls() {
        let tabs = vec![tab(1, 1, 0), tab(2, 2, 0), tab(3, 1, 2)];
        let host = MemoryHost::new(WindowId::new(1)).with_tabs(tabs.clone());

        let outcome = highlight(&host, &tabs, "Select Tabs").await.expect("highlight");

        assert_eq!(outcome, HighlightOutcome::Highlighted { windows: 2 });
        assert_eq!(
            host.highlights(),
            vec![(WindowId::new(1), vec![0, 2]), (WindowId::new(2), vec![0])]
        );
        assert!(host.notifications().is_empty());
    }
}
