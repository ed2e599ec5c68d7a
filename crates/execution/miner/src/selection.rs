use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::{
    block::BlockData,
    checkpoint::{CheckpointStack, StateManager},
    config::MIN_TX_GAS,
    controller::Miner,
    error::MinerError,
    origin_set::OriginSet,
    heap::PricedHeap,
    transaction::{FinalizeStatus, PooledTransaction, RuntimeError},
    vm::{ExecutionOutcome, VmError},
    ParentBlock,
};

/// The priced heap plus the bookkeeping that travels with it across a single
/// `mine` call. Guarded by [`Miner::selection`] so a re-entrant caller's
/// `update_priced_heap` can interleave safely with the active selection loop
/// at any `.await` point, per the live-collaborator-mutation tolerance this
/// crate is built around.
#[derive(Default)]
pub(crate) struct SelectionState {
    pub(crate) priced: PricedHeap,
    pub(crate) origins: OriginSet,
    pub(crate) currently_executing_price: U256,
}

impl Miner {
    /// Seeds the priced heap from scratch: one transaction per origin that
    /// currently has an unlocked head in the pool.
    pub(crate) async fn seed_priced_heap(&self) {
        let mut selection = self.selection.lock().await;
        selection.priced.clear();
        selection.origins.clear();
        for origin in self.pending_pool.origins() {
            if let Some(head) = self.pending_pool.peek_origin(origin) {
                if !head.locked() {
                    head.set_locked(true);
                    selection.origins.insert(origin);
                    selection.priced.push(head);
                }
            }
        }
    }

    /// Absorbs pool arrivals that showed up after the heap was seeded,
    /// without letting a newly-arrived cheaper transaction preempt the
    /// in-progress sweep (see §4.5): only origins priced at or above the
    /// transaction currently being executed are admitted.
    pub(crate) async fn update_priced_heap(&self) {
        let mut selection = self.selection.lock().await;
        let currently_executing_price = selection.currently_executing_price;
        for origin in self.pending_pool.origins() {
            if selection.origins.contains(&origin) {
                continue;
            }
            let Some(head) = self.pending_pool.peek_origin(origin) else { continue };
            if head.locked() || head.gas_price() < currently_executing_price {
                continue;
            }
            head.set_locked(true);
            selection.origins.insert(origin);
            selection.priced.push(head);
        }
    }

    /// Runs the EVM against `best`. On a rejection, advances the pool and the
    /// priced heap for `best`'s origin and finalizes the transaction as
    /// rejected before returning the error — the caller only needs to revert
    /// the transaction-level checkpoint, never touch the pool itself.
    async fn run_tx(
        &self,
        best: &Arc<dyn PooledTransaction>,
        block: &ParentBlock,
    ) -> Result<ExecutionOutcome, VmError> {
        match self.vm.run_tx(best, block).await {
            Ok(outcome) => Ok(outcome),
            Err(VmError::Fatal(message)) => Err(VmError::Fatal(message)),
            Err(VmError::Reverted(message)) => {
                let origin = best.from();
                self.pending_pool.remove_best(origin);
                self.replace_or_drop(origin).await;
                best.finalize(FinalizeStatus::Rejected(RuntimeError::new(message.clone())));
                self.metrics.transactions_rejected.inc();
                debug!(target: "miner::selection", %origin, hash = %best.hash(), %message, "rejected transaction");
                Err(VmError::Reverted(message))
            }
        }
    }

    /// After an origin's pool head is consumed (committed or rejected),
    /// pulls the next queued transaction for that origin into the priced
    /// heap, or drops the origin entirely if nothing remains.
    async fn replace_or_drop(&self, origin: Address) {
        let mut selection = self.selection.lock().await;
        match self.pending_pool.peek_origin(origin) {
            Some(next) => {
                next.set_locked(true);
                selection.priced.replace_best(next);
            }
            None => {
                selection.priced.remove_best();
                selection.origins.remove(&origin);
            }
        }
    }

    /// Drops the current root without attempting a replacement — used when a
    /// transaction cannot fit in this block at all (intrinsic gas too large,
    /// or execution overflowed remaining gas). The transaction stays queued
    /// in the pool, unlocked, for a future block.
    async fn drop_without_replacement(&self, origin: Address) {
        let mut selection = self.selection.lock().await;
        selection.priced.remove_best();
        selection.origins.remove(&origin);
        trace!(target: "miner::selection", %origin, "dropped transaction without replacement");
    }

    /// Runs the selection loop for a single block: the core of §4.3. Returns
    /// the assembled [`BlockData`] once the block-level checkpoint has been
    /// committed, or propagates a [`MinerError`] on a catastrophic
    /// collaborator failure.
    ///
    /// The block-level checkpoint is always closed before this returns,
    /// on every exit path: [`Miner::select_transactions`] does the actual
    /// per-transaction work and never touches `outer` itself, so its
    /// `Result` alone decides whether `outer` is committed or reverted here.
    pub(crate) async fn run_selection_loop(
        &self,
        block: &ParentBlock,
        max_transactions: u64,
    ) -> Result<BlockData, MinerError> {
        let checkpoints = CheckpointStack::new(self.state_manager.as_ref());
        let outer = checkpoints.open().await?;

        match self.select_transactions(&checkpoints, block, max_transactions).await {
            Ok(block_data) => {
                outer.commit().await?;
                Ok(block_data)
            }
            Err(err) => {
                outer.revert().await?;
                Err(err)
            }
        }
    }

    /// The per-transaction body of the selection loop, run inside the
    /// block-level checkpoint `checkpoints` already has open. Every early
    /// return here is either `Ok` (no error, nothing left for the caller to
    /// unwind) or `Err` with the transaction-level checkpoint already
    /// reverted — the block-level scope is never this function's to close.
    async fn select_transactions(
        &self,
        checkpoints: &CheckpointStack<'_, dyn StateManager>,
        block: &ParentBlock,
        max_transactions: u64,
    ) -> Result<BlockData, MinerError> {
        let mut block_data = BlockData::new(block.timestamp);
        let mut block_gas_left = self.config.block_gas_limit;
        let mut index: u64 = 0;

        loop {
            // Checked before peeking (not just after a commit) so that
            // `max_transactions == 0` abandons the loop without attempting
            // any transaction at all — only the block-level checkpoint
            // below is touched, preserving the commit/revert pairing.
            if block_data.transactions.len() as u64 >= max_transactions {
                break;
            }

            let best = {
                let selection = self.selection.lock().await;
                match selection.priced.peek() {
                    Some(tx) => tx.clone(),
                    None => break,
                }
            };
            let origin = best.from();

            if best.calculate_intrinsic_gas() > block_gas_left {
                self.drop_without_replacement(origin).await;
                best.set_locked(false);
                continue;
            }

            {
                let mut selection = self.selection.lock().await;
                selection.currently_executing_price = best.gas_price();
            }

            let tx_scope = checkpoints.open().await?;
            let outcome = match self.run_tx(&best, block).await {
                Err(VmError::Reverted(_)) => {
                    tx_scope.revert().await?;
                    continue;
                }
                Err(VmError::Fatal(message)) => {
                    tx_scope.revert().await?;
                    return Err(MinerError::Vm(message));
                }
                Ok(outcome) => outcome,
            };

            if outcome.gas_used > block_gas_left {
                tx_scope.revert().await?;
                self.drop_without_replacement(origin).await;
                best.set_locked(false);
                continue;
            }

            tx_scope.commit().await?;

            block_gas_left = block_gas_left.saturating_sub(outcome.gas_used);
            block_data.gas_used += outcome.gas_used;
            block_data.transactions_trie.insert(index, best.encode());
            block_data
                .receipt_trie
                .insert(index, best.fill_from_result(&outcome, block_data.gas_used));
            block_data.bloom |= outcome.bloom;
            block_data.transactions.push(best.clone());
            index += 1;

            self.pending_pool.remove_best(origin);
            self.in_progress.insert(best.hash());
            self.spawn_finalized_watcher(best.clone());
            self.metrics.transactions_accepted.inc();

            let should_break = block_gas_left <= MIN_TX_GAS;
            self.replace_or_drop(origin).await;

            if should_break {
                break;
            }
        }

        Ok(block_data)
    }

    fn spawn_finalized_watcher(&self, tx: Arc<dyn PooledTransaction>) {
        let in_progress = self.in_progress.clone();
        tokio::spawn(async move {
            tx.finalized().await;
            in_progress.remove(&tx.hash());
        });
    }
}
