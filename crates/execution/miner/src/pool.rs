use alloy::primitives::{Address, B256};
use dashmap::DashSet;
use std::sync::Arc;

use crate::transaction::PooledTransaction;

/// Live view of the transaction pool's per-origin nonce-ordered queues.
///
/// The miner only ever peeks or pops the head of an origin's queue — nonce
/// ordering within an origin, and admission of new transactions, are the
/// pool's responsibility entirely.
pub trait PendingPool: Send + Sync {
    /// Origins that currently have at least one queued transaction.
    fn origins(&self) -> Vec<Address>;

    /// The lowest-nonce transaction queued for `origin`, if any.
    fn peek_origin(&self, origin: Address) -> Option<Arc<dyn PooledTransaction>>;

    /// Pops and returns the head of `origin`'s queue, advancing it to the
    /// next nonce. A no-op returning `None` if the origin has nothing
    /// queued.
    fn remove_best(&self, origin: Address) -> Option<Arc<dyn PooledTransaction>>;
}

/// Transactions the miner has committed to a block but that have not yet
/// been finalized by the pool (persisted or otherwise resolved).
#[derive(Clone, Default)]
pub(crate) struct InProgressSet {
    hashes: Arc<DashSet<B256>>,
}

impl InProgressSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, hash: B256) {
        self.hashes.insert(hash);
    }

    pub(crate) fn remove(&self, hash: &B256) {
        self.hashes.remove(hash);
    }

    pub fn contains(&self, hash: &B256) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}
