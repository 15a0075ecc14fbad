//! Indexed priority queue for D* Lite
//!
//! An ordered set of `(key, cell)` entries plus a per-cell record of the key
//! each queued cell was inserted with, so a cell can be removed by
//! coordinate in `O(log n)` before it is reinserted with a fresh key.

use crate::algorithms::grid::GridPoint;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Lexicographic priority `(k1, k2)`
#[derive(Debug, Clone, Copy)]
pub struct Key(pub f64, pub f64);

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .total_cmp(&other.0)
            .then_with(|| self.1.total_cmp(&other.1))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    key: Key,
    point: GridPoint,
}

#[derive(Debug, Clone)]
pub(super) struct PriorityQueue {
    entries: BTreeSet<Entry>,
    queued: Vec<Option<Key>>, // by cell index
}

impl PriorityQueue {
    pub(super) fn new(cells: usize) -> Self {
        Self {
            entries: BTreeSet::new(),
            queued: vec![None; cells],
        }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn contains(&self, index: usize) -> bool {
        self.queued[index].is_some()
    }

    /// Insert a cell that is not currently queued
    pub(super) fn insert(&mut self, index: usize, point: GridPoint, key: Key) {
        debug_assert!(self.queued[index].is_none(), "{point} queued twice");
        self.queued[index] = Some(key);
        self.entries.insert(Entry { key, point });
    }

    /// Drop the entry for a cell, if any
    pub(super) fn remove(&mut self, index: usize, point: GridPoint) -> bool {
        match self.queued[index].take() {
            Some(key) => self.entries.remove(&Entry { key, point }),
            None => false,
        }
    }

    pub(super) fn top_key(&self) -> Option<Key> {
        self.entries.first().map(|e| e.key)
    }

    /// Pop the minimum entry; `index_of` maps the cell back to its slot
    pub(super) fn pop(&mut self, index_of: impl Fn(GridPoint) -> usize) -> Option<(GridPoint, Key)> {
        let entry = self.entries.pop_first()?;
        self.queued[index_of(entry.point)] = None;
        Some((entry.point, entry.key))
    }
}
