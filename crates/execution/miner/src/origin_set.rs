use alloy::primitives::Address;
use std::collections::HashSet;

/// Mirrors exactly the set of origins currently represented in the priced
/// heap. Kept separate from the heap itself so membership checks don't need
/// a linear scan.
#[derive(Default)]
pub(crate) struct OriginSet {
    origins: HashSet<Address>,
}

impl OriginSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, origin: &Address) -> bool {
        self.origins.contains(origin)
    }

    pub(crate) fn insert(&mut self, origin: Address) {
        self.origins.insert(origin);
    }

    pub(crate) fn remove(&mut self, origin: &Address) {
        self.origins.remove(origin);
    }

    pub(crate) fn clear(&mut self) {
        self.origins.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.origins.len()
    }
}
