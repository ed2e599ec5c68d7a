//! In-memory fakes for the miner's collaborators, in the style of the
//! workspace's other `test_utils` modules. Exercised directly by this
//! crate's own unit/integration tests; exported behind `test-utils` so
//! downstream crates can build the same harness against their own
//! `Miner` instances.

use alloy::primitives::{Address, Bloom, B256, U256};
use async_trait::async_trait;
use dashmap::DashSet;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex as StdMutex,
    },
};
use tokio::sync::watch;

use crate::{
    checkpoint::StateManager,
    error::CheckpointError,
    pool::PendingPool,
    transaction::{FinalizeStatus, PooledTransaction},
    vm::{ExecutionOutcome, Vm, VmError},
    ParentBlock,
};

/// A [`PooledTransaction`] driven entirely by constructor arguments and two
/// atomics, with the `finalized` one-shot modeled as a `watch` channel —
/// the same substitution the miner itself uses for its pause/resume signal.
#[derive(Debug)]
pub struct FakeTransaction {
    from: Address,
    gas_price: U256,
    gas_used: u64,
    hash: B256,
    locked: AtomicBool,
    status_tx: watch::Sender<Option<FinalizeStatus>>,
    status_rx: watch::Receiver<Option<FinalizeStatus>>,
}

impl FakeTransaction {
    /// Builds a transaction with a unique synthetic hash, priced at
    /// `gas_price`, whose intrinsic gas and simulated execution cost are
    /// both `gas_used`. Returned as a concrete `Arc<FakeTransaction>` so
    /// callers that need to inspect [`FakeTransaction::status`] can do so
    /// directly; it coerces to `Arc<dyn PooledTransaction>` wherever that's
    /// the expected type.
    pub fn new(from: Address, gas_price: U256, gas_used: u64) -> Arc<Self> {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&seq.to_be_bytes());
        let (status_tx, status_rx) = watch::channel(None);
        Arc::new(Self {
            from,
            gas_price,
            gas_used,
            hash: B256::from(bytes),
            locked: AtomicBool::new(false),
            status_tx,
            status_rx,
        })
    }

    /// The status last passed to [`PooledTransaction::finalize`], if any.
    pub fn status(&self) -> Option<FinalizeStatus> {
        self.status_rx.borrow().clone()
    }
}

#[async_trait]
impl PooledTransaction for FakeTransaction {
    fn from(&self) -> Address {
        self.from
    }

    fn gas_price(&self) -> U256 {
        self.gas_price
    }

    fn calculate_intrinsic_gas(&self) -> u64 {
        self.gas_used
    }

    fn encode(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    fn hash(&self) -> B256 {
        self.hash
    }

    fn fill_from_result(&self, outcome: &ExecutionOutcome, cumulative_gas_used: u64) -> Vec<u8> {
        let mut bytes = self.hash.to_vec();
        bytes.extend_from_slice(&outcome.gas_used.to_be_bytes());
        bytes.extend_from_slice(&cumulative_gas_used.to_be_bytes());
        bytes
    }

    fn finalize(&self, status: FinalizeStatus) {
        let _ = self.status_tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(status);
                true
            } else {
                false
            }
        });
    }

    async fn finalized(&self) {
        let mut rx = self.status_rx.clone();
        let _ = rx.wait_for(|status| status.is_some()).await;
    }

    fn locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    fn set_locked(&self, value: bool) {
        self.locked.store(value, Ordering::SeqCst);
    }
}

/// Per-origin nonce-ordered queues, mirroring the pool's `pending` mapping.
/// Transactions are appended in nonce order by the test; `remove_best`
/// advances the queue exactly like the real pool's per-origin min-heap head
/// removal.
#[derive(Debug, Default)]
pub struct FakePendingPool {
    queues: StdMutex<HashMap<Address, VecDeque<Arc<dyn PooledTransaction>>>>,
}

impl FakePendingPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `tx` behind any other pending transaction from the same
    /// origin. Callers are responsible for inserting in nonce order.
    pub fn insert(&self, tx: Arc<dyn PooledTransaction>) {
        self.queues.lock().unwrap().entry(tx.from()).or_default().push_back(tx);
    }
}

impl PendingPool for FakePendingPool {
    fn origins(&self) -> Vec<Address> {
        self.queues
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(origin, _)| *origin)
            .collect()
    }

    fn peek_origin(&self, origin: Address) -> Option<Arc<dyn PooledTransaction>> {
        self.queues.lock().unwrap().get(&origin).and_then(|queue| queue.front().cloned())
    }

    fn remove_best(&self, origin: Address) -> Option<Arc<dyn PooledTransaction>> {
        self.queues.lock().unwrap().get_mut(&origin).and_then(|queue| queue.pop_front())
    }
}

/// A [`Vm`] whose outcome per transaction is configured ahead of time:
/// succeed with the transaction's declared gas, reject (recoverable), or
/// fail fatally (aborts the selection loop).
#[derive(Debug, Default)]
pub struct FakeVm {
    rejected: DashSet<B256>,
    fatal: DashSet<B256>,
}

impl FakeVm {
    /// A vm where every transaction succeeds unless configured otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `hash` as an always-failing transaction (EVM throws).
    pub fn reject(&self, hash: B256) {
        self.rejected.insert(hash);
    }

    /// Marks `hash` as triggering a catastrophic collaborator failure.
    pub fn fail_fatally(&self, hash: B256) {
        self.fatal.insert(hash);
    }
}

#[async_trait]
impl Vm for FakeVm {
    async fn run_tx(
        &self,
        tx: &Arc<dyn PooledTransaction>,
        _block: &ParentBlock,
    ) -> Result<ExecutionOutcome, VmError> {
        let hash = tx.hash();
        if self.fatal.contains(&hash) {
            return Err(VmError::Fatal("simulated fatal vm failure".to_string()));
        }
        if self.rejected.contains(&hash) {
            return Err(VmError::Reverted("simulated always-failing transaction".to_string()));
        }
        Ok(ExecutionOutcome {
            gas_used: tx.calculate_intrinsic_gas(),
            bloom: Bloom::default(),
            success: true,
        })
    }
}

/// A [`StateManager`] that tracks nesting depth instead of touching any real
/// state, so tests can assert checkpoints end up perfectly paired.
#[derive(Debug, Default)]
pub struct FakeStateManager {
    depth: std::sync::atomic::AtomicI64,
}

impl FakeStateManager {
    /// A state manager starting at nesting depth zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current checkpoint nesting depth. Should be zero between `mine`
    /// calls if every checkpoint was paired correctly.
    pub fn depth(&self) -> i64 {
        self.depth.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateManager for FakeStateManager {
    async fn checkpoint(&self) -> Result<(), CheckpointError> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> Result<(), CheckpointError> {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn revert(&self) -> Result<(), CheckpointError> {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Builds a `create_block` closure that advances `number`/`timestamp` by one
/// each call, holding `gas_limit` fixed — enough for tests that need more
/// than one block out of a single `mine` call.
pub fn incrementing_block_factory(
    gas_limit: u64,
) -> impl Fn(&ParentBlock) -> ParentBlock + Send + Sync + 'static {
    move |previous: &ParentBlock| ParentBlock {
        hash: B256::from(U256::from(previous.number + 1).to_be_bytes()),
        number: previous.number + 1,
        timestamp: previous.timestamp + 1,
        gas_limit,
    }
}
