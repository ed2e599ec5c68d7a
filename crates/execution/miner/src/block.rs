use alloy::primitives::{keccak256, Bloom, B256};
use std::{collections::BTreeMap, sync::Arc};

use crate::transaction::PooledTransaction;

/// The block the selection loop builds on top of. Constructed fresh for
/// every outer loop iteration by the `create_block` collaborator; this crate
/// treats each `ParentBlock` it receives as immutable for the duration of
/// that iteration.
#[derive(Debug, Clone)]
pub struct ParentBlock {
    /// Hash of this block.
    pub hash: B256,
    /// Block number.
    pub number: u64,
    /// Unix timestamp, copied verbatim into any [`BlockData`] built on top
    /// of this block.
    pub timestamp: u64,
    /// Total gas budget for a block built on top of this one.
    pub gas_limit: u64,
}

/// An in-memory trie keyed by `rlp(index) -> value`, used for both the
/// transactions trie and the receipts trie. Root is a keccak256 over the
/// ordered key/value stream rather than a full Merkle-Patricia structure —
/// the block persistence collaborator is responsible for canonical trie
/// storage; this is the miner's own bookkeeping of what it assembled.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrieBuilder {
    entries: BTreeMap<u64, Vec<u8>>,
}

impl TrieBuilder {
    pub(crate) fn insert(&mut self, index: u64, value: Vec<u8>) {
        self.entries.insert(index, value);
    }

    pub(crate) fn root(&self) -> B256 {
        let mut buf = Vec::new();
        for (index, value) in &self.entries {
            buf.extend_from_slice(&alloy_rlp::encode(index));
            buf.extend_from_slice(value);
        }
        keccak256(buf)
    }
}

/// Artifacts accumulated by a single run of the selection loop.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    /// Accepted transactions, in commit order.
    pub transactions: Vec<Arc<dyn PooledTransaction>>,
    pub(crate) transactions_trie: TrieBuilder,
    pub(crate) receipt_trie: TrieBuilder,
    /// Cumulative gas used by `transactions`.
    pub gas_used: u64,
    /// Bitwise aggregate of every accepted transaction's log bloom.
    pub bloom: Bloom,
    /// Copied from the parent block input at construction time.
    pub timestamp: u64,
}

impl BlockData {
    pub(crate) fn new(timestamp: u64) -> Self {
        Self { timestamp, ..Default::default() }
    }

    /// Root of the in-memory transactions trie (`rlp(index) -> tx bytes`).
    pub fn transactions_root(&self) -> B256 {
        self.transactions_trie.root()
    }

    /// Root of the in-memory receipts trie (`rlp(index) -> receipt bytes`).
    pub fn receipts_root(&self) -> B256 {
        self.receipt_trie.root()
    }
}
