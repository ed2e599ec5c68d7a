use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::vm::ExecutionOutcome;

/// Synthetic VM trace attached to a rejected transaction. Mirrors the shape
/// an EVM would normally report for a reverted call, with `program_counter`
/// pinned to zero since rejection happens before execution begins.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    /// Always zero: rejection happens before the vm executes any opcode.
    pub program_counter: u64,
    /// The vm's rejection message.
    pub message: String,
}

impl RuntimeError {
    /// Builds a synthetic rejection trace carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { program_counter: 0, message: message.into() }
    }
}

/// Terminal disposition of a transaction the miner took out of the pool.
#[derive(Debug, Clone)]
pub enum FinalizeStatus {
    /// Committed into a block.
    Accepted,
    /// The vm rejected the transaction before or during execution.
    Rejected(RuntimeError),
}

/// A transaction as seen by the miner: opaque payload, priced by `gas_price`,
/// ordered within its origin by the pool's own nonce heap.
///
/// Implementors are responsible for their own `locked` bookkeeping; the
/// miner uses it as a lease so a transaction never appears in the priced
/// heap from two origins' worth of bookkeeping at once, and so a concurrent
/// pool producer knows not to hand the same head to another consumer.
#[async_trait]
pub trait PooledTransaction: Send + Sync + Debug {
    /// Sender address.
    fn from(&self) -> Address;

    /// Price used to order this transaction in the priced heap.
    fn gas_price(&self) -> U256;

    /// Minimum gas the transaction needs before execution can even start.
    fn calculate_intrinsic_gas(&self) -> u64;

    /// Canonical wire encoding, used as the trie leaf value.
    fn encode(&self) -> Vec<u8>;

    /// Transaction hash.
    fn hash(&self) -> B256;

    /// Builds the receipt bytes for this transaction given its execution
    /// outcome and the block's cumulative gas used after it ran.
    fn fill_from_result(&self, outcome: &ExecutionOutcome, cumulative_gas_used: u64) -> Vec<u8>;

    /// Marks the transaction as resolved and wakes anyone awaiting
    /// [`PooledTransaction::finalized`]. Idempotent.
    fn finalize(&self, status: FinalizeStatus);

    /// Resolves once [`PooledTransaction::finalize`] has been called.
    async fn finalized(&self);

    /// Whether the miner currently holds this transaction's pool lease.
    fn locked(&self) -> bool;

    /// Sets or clears the miner's pool lease on this transaction.
    fn set_locked(&self, value: bool);
}
