//! Opener-graph relationship queries.
//!
//! Tabs form a forest through `openerTabId`. A tab whose opener is not in the
//! snapshot is a root. Every walk keeps a visited set so a malformed graph
//! (a cycle) ends the walk instead of looping.
//!
//! Inclusion and reachability are separate: results only contain tabs of the
//! [`ConsideredSet`], while traversal passes through any tab of the snapshot.
//!
//! # Example
//!
//! ```ignore
//! let snapshot = TabSnapshot::new(host.query_tabs(&TabQuery::current_window()).await?);
//! let considered = ConsideredSet::from_snapshot(&snapshot);
//! let resolver = Resolver::new(&snapshot, &considered);
//!
//! let children = resolver.children(tab.id);
//! let lineage = resolver.ancestors(tab.id, Depth::Unbounded);
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::{FxHashMap, FxHashSet};

use crate::identifiers::TabId;

use super::snapshot::{ConsideredSet, TabSnapshot};
use super::tab::Tab;

// ============================================================================
// Depth
// ============================================================================

/// How far a relationship walk may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// No limit.
    #[default]
    Unbounded,
    /// At most this many levels.
    Limited(u32),
}

impl Depth {
    /// Converts the host-style depth where any negative value means unbounded.
    ///
    /// `0` is treated as `Limited(0)`, which yields nothing.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Self::Unbounded
        } else {
            Self::Limited(u32::try_from(raw).unwrap_or(u32::MAX))
        }
    }

    /// Returns `true` if `level` (1-based) is within the limit.
    #[inline]
    #[must_use]
    pub fn allows(&self, level: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(max) => level <= *max,
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Answers relationship queries over one snapshot.
///
/// Building a resolver indexes children by opener once; queries are then
/// linear in the size of their result.
#[derive(Debug)]
pub struct Resolver<'a> {
    snapshot: &'a TabSnapshot,
    considered: &'a ConsideredSet,
    /// Snapshot positions keyed by resolved opener (`None` for roots).
    children: FxHashMap<Option<TabId>, Vec<usize>>,
}

impl<'a> Resolver<'a> {
    /// Indexes the snapshot.
    #[must_use]
    pub fn new(snapshot: &'a TabSnapshot, considered: &'a ConsideredSet) -> Self {
        let mut children: FxHashMap<Option<TabId>, Vec<usize>> = FxHashMap::default();
        for (pos, tab) in snapshot.iter().enumerate() {
            let opener = snapshot.opener_of(tab).map(|t| t.id);
            children.entry(opener).or_default().push(pos);
        }

        Self {
            snapshot,
            considered,
            children,
        }
    }

    /// Returns the snapshot being queried.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &'a TabSnapshot {
        self.snapshot
    }

    /// Tabs whose opener chain reaches `focal` within `depth` levels.
    ///
    /// Results are in level order: direct children in snapshot order, then
    /// their children, and so on. The focal tab is never included.
    #[must_use]
    pub fn descendants(&self, focal: TabId, depth: Depth) -> Vec<&'a Tab> {
        if !self.snapshot.contains(focal) {
            return Vec::new();
        }

        let mut visited = FxHashSet::default();
        visited.insert(focal);
        self.walk_down(Some(focal), depth, &mut visited)
    }

    /// Direct children of `focal`.
    #[inline]
    #[must_use]
    pub fn children(&self, focal: TabId) -> Vec<&'a Tab> {
        self.descendants(focal, Depth::Limited(1))
    }

    /// Tabs sharing `focal`'s direct opener, excluding `focal`.
    ///
    /// Openers are compared by raw `openerTabId`, so tabs whose opener is
    /// hidden or closed still find each other. Tabs without an opener are
    /// siblings of each other; tabs with a dangling opener are not among them.
    #[must_use]
    pub fn siblings(&self, focal: &Tab) -> Vec<&'a Tab> {
        let Some(focal) = self.snapshot.get(focal.id) else {
            return Vec::new();
        };

        self.snapshot
            .iter()
            .filter(|t| t.opener_tab_id == focal.opener_tab_id && t.id != focal.id)
            .filter(|t| self.considered.contains(t.id))
            .collect()
    }

    /// The opener chain of `focal`, starting with `focal` itself.
    ///
    /// `depth` limits the number of chain entries, so `Limited(1)` yields at
    /// most the focal tab. The walk stops at the first opener that does not
    /// resolve in the snapshot or that was already visited.
    #[must_use]
    pub fn ancestors(&self, focal: TabId, depth: Depth) -> Vec<&'a Tab> {
        let Some(mut current) = self.snapshot.get(focal) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        if !depth.allows(1) {
            return out;
        }
        if self.considered.contains(current.id) {
            out.push(current);
        }

        let mut visited = FxHashSet::default();
        visited.insert(current.id);
        let mut level = 1;

        while depth.allows(level + 1) {
            let Some(opener) = self.snapshot.opener_of(current) else {
                break;
            };
            if !visited.insert(opener.id) {
                break;
            }
            if self.considered.contains(opener.id) {
                out.push(opener);
            }
            current = opener;
            level += 1;
        }

        out
    }

    /// The direct opener of `focal`, if present and considered.
    #[must_use]
    pub fn parent(&self, focal: TabId) -> Option<&'a Tab> {
        let tab = self.snapshot.get(focal)?;
        self.snapshot
            .opener_of(tab)
            .filter(|p| p.id != focal && self.considered.contains(p.id))
    }

    /// Breadth-first walk below `start` (`None` walks from the roots).
    fn walk_down(
        &self,
        start: Option<TabId>,
        depth: Depth,
        visited: &mut FxHashSet<TabId>,
    ) -> Vec<&'a Tab> {
        let mut out = Vec::new();
        let mut frontier = vec![start];
        let mut level = 1;

        while !frontier.is_empty() && depth.allows(level) {
            let mut next = Vec::new();
            for parent in frontier {
                let Some(positions) = self.children.get(&parent) else {
                    continue;
                };
                for &pos in positions {
                    let tab = &self.snapshot.tabs()[pos];
                    if !visited.insert(tab.id) {
                        continue;
                    }
                    if self.considered.contains(tab.id) {
                        out.push(tab);
                    }
                    next.push(Some(tab.id));
                }
            }
            frontier = next;
            level += 1;
        }

        out
    }
}

// ============================================================================
// Tests
// ============================================================================
