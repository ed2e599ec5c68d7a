use alloy::primitives::Bloom;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::{block::ParentBlock, transaction::PooledTransaction};

/// Result of successfully running a transaction through the VM.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Per-transaction log bloom, folded into the block bloom on commit.
    pub bloom: Bloom,
    /// Whether the transaction's own execution succeeded (as opposed to
    /// running out of gas or reverting inside the VM).
    pub success: bool,
}

/// Failure modes the VM can report for a single transaction.
///
/// `Reverted` covers a transaction that can never succeed against the
/// current state (bad nonce, insufficient balance, and the like) — the
/// selection loop handles this by rejecting the transaction and moving on.
/// `Fatal` covers anything that calls the collaborator's integrity into
/// question (state provider I/O, corrupt trie); it aborts the `mine` call.
#[derive(Debug, Error)]
pub enum VmError {
    /// The transaction can never succeed against current state; not fatal to
    /// the miner's `mine` call.
    #[error("transaction rejected: {0}")]
    Reverted(String),

    /// The collaborator's own integrity is in question; aborts `mine`.
    #[error("fatal vm error: {0}")]
    Fatal(String),
}

/// The EVM collaborator. Out of scope for this crate beyond this interface.
#[async_trait]
pub trait Vm: Send + Sync {
    /// Executes `tx` against `block`'s state. Returns [`VmError::Reverted`]
    /// for a transaction that can never succeed, or [`VmError::Fatal`] if the
    /// collaborator itself is unusable.
    async fn run_tx(
        &self,
        tx: &Arc<dyn PooledTransaction>,
        block: &ParentBlock,
    ) -> Result<ExecutionOutcome, VmError>;
}
