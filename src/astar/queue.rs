// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Totally-ordered wrapper over a floating-point score,
/// using [f64::total_cmp] so that it can be used as a queue key.
#[derive(Debug, Clone, Copy)]
pub(super) struct Score(pub f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

struct Entry<K, T> {
    key: K,
    item: T,
}

impl<K: Ord, T> PartialEq for Entry<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord, T> Eq for Entry<K, T> {}

impl<K: Ord, T> PartialOrd for Entry<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, T> Ord for Entry<K, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: We revert the order of comparison,
        // as lower keys are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other.key.cmp(&self.key)
    }
}

/// Min-priority queue ordering items by a key extracted with a provided function.
///
/// The key is computed once, when an item is pushed. Items with equal keys
/// are popped in an unspecified order.
pub(super) struct MinQueue<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    heap: BinaryHeap<Entry<K, T>>,
    key: F,
}

impl<T, K, F> MinQueue<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    pub(super) fn new(key: F) -> Self {
        Self {
            heap: BinaryHeap::default(),
            key,
        }
    }

    pub(super) fn push(&mut self, item: T) {
        let key = (self.key)(&item);
        self.heap.push(Entry { key, item });
    }

    /// Removes and returns the item with the lowest key.
    pub(super) fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|e| e.item)
    }

    pub(super) fn len(&self) -> usize {
        self.heap.len()
    }
}
