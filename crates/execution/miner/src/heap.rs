use std::{cmp::Ordering, sync::Arc};

use crate::transaction::PooledTransaction;

struct Entry {
    tx: Arc<dyn PooledTransaction>,
    // Tie-breaker for equal gas prices: lower sequence number (first seen)
    // wins. Priced-heap ordering across equal prices is otherwise
    // unspecified, but a run must be internally deterministic.
    seq: u64,
}

impl Entry {
    fn priority(&self, other: &Entry) -> Ordering {
        self.tx.gas_price().cmp(&other.tx.gas_price()).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Max-heap over pooled transactions, ordered by `gas_price` with
/// insertion-order tie-breaking. Holds at most one transaction per origin;
/// enforcing that invariant is the caller's responsibility (see
/// `crate::selection`).
#[derive(Default)]
pub(crate) struct PricedHeap {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl PricedHeap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn peek(&self) -> Option<&Arc<dyn PooledTransaction>> {
        self.entries.first().map(|entry| &entry.tx)
    }

    pub(crate) fn push(&mut self, tx: Arc<dyn PooledTransaction>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { tx, seq });
        self.sift_up(self.entries.len() - 1);
    }

    pub(crate) fn init(&mut self, txs: Vec<Arc<dyn PooledTransaction>>) {
        self.clear();
        for tx in txs {
            self.push(tx);
        }
    }

    /// Removes the current root. Returns whether a new root remains.
    pub(crate) fn remove_best(&mut self) -> bool {
        debug_assert!(!self.entries.is_empty(), "remove_best on empty priced heap");
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        !self.entries.is_empty()
    }

    /// Overwrites the root with `tx` and re-heapifies downward. Used instead
    /// of a pop-then-push pair so the heap is never transiently without a
    /// root for this origin.
    pub(crate) fn replace_best(&mut self, tx: Arc<dyn PooledTransaction>) {
        debug_assert!(!self.entries.is_empty(), "replace_best on empty priced heap");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries[0] = Entry { tx, seq };
        self.sift_down(0);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.entries[idx].priority(&self.entries[parent]) == Ordering::Greater {
                self.entries.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = 2 * idx + 2;
            let mut largest = idx;
            if left < len && self.entries[left].priority(&self.entries[largest]) == Ordering::Greater {
                largest = left;
            }
            if right < len && self.entries[right].priority(&self.entries[largest]) == Ordering::Greater {
                largest = right;
            }
            if largest == idx {
                break;
            }
            self.entries.swap(idx, largest);
            idx = largest;
        }
    }
}
