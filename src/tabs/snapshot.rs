//! Point-in-time tab snapshots and considered-id sets.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::identifiers::TabId;

use super::tab::Tab;

// ============================================================================
// TabSnapshot
// ============================================================================

/// Ordered tabs returned by one host query, indexed by ID.
///
/// A snapshot is taken at the start of each user action and dropped at its
/// end; it is never refreshed in place.
#[derive(Debug, Clone, Default)]
pub struct TabSnapshot {
    tabs: Vec<Tab>,
    positions: FxHashMap<TabId, usize>,
}

impl TabSnapshot {
    /// Creates a snapshot, preserving host order.
    ///
    /// Later duplicates of an ID shadow earlier ones in lookups.
    #[must_use]
    pub fn new(tabs: Vec<Tab>) -> Self {
        let positions = tabs.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        Self { tabs, positions }
    }

    /// Returns the tab with the given ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.positions.get(&id).map(|&i| &self.tabs[i])
    }

    /// Returns `true` if the snapshot contains the ID.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: TabId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Returns the opener of `tab` if it is present in this snapshot.
    ///
    /// A tab whose opener is absent is a root of the opener forest.
    #[inline]
    #[must_use]
    pub fn opener_of(&self, tab: &Tab) -> Option<&Tab> {
        tab.opener_tab_id.and_then(|id| self.get(id))
    }

    /// Returns all tabs in host order.
    #[inline]
    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Iterates over tabs in host order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Tab> {
        self.tabs.iter()
    }

    /// Returns the number of tabs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Returns `true` if the snapshot is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Consumes the snapshot, returning the tabs.
    #[inline]
    #[must_use]
    pub fn into_tabs(self) -> Vec<Tab> {
        self.tabs
    }
}

impl From<Vec<Tab>> for TabSnapshot {
    fn from(tabs: Vec<Tab>) -> Self {
        Self::new(tabs)
    }
}

impl<'a> IntoIterator for &'a TabSnapshot {
    type Item = &'a Tab;
    type IntoIter = std::slice::Iter<'a, Tab>;

    fn into_iter(self) -> Self::IntoIter {
        self.tabs.iter()
    }
}

// ============================================================================
// ConsideredSet
// ============================================================================

/// IDs a relationship query is allowed to return.
///
/// Tabs outside the set still take part in traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsideredSet {
    ids: FxHashSet<TabId>,
}

impl ConsideredSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Considers every tab of the snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &TabSnapshot) -> Self {
        snapshot.iter().map(|t| t.id).collect()
    }

    /// Considers the snapshot tabs accepted by `predicate`.
    #[must_use]
    pub fn filtered(snapshot: &TabSnapshot, predicate: impl Fn(&Tab) -> bool) -> Self {
        snapshot
            .iter()
            .filter(|t| predicate(t))
            .map(|t| t.id)
            .collect()
    }

    /// Adds an ID.
    #[inline]
    pub fn insert(&mut self, id: TabId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the ID is considered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: TabId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the number of considered IDs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing is considered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<TabId> for ConsideredSet {
    fn from_iter<I: IntoIterator<Item = TabId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
