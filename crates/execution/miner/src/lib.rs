//! Block-production miner for an Ethereum-compatible development node.
//!
//! Assembles blocks from a live view of a pending-transaction pool, executes
//! candidates through an EVM collaborator under nested state checkpoints, and
//! emits a sealed [`BlockData`] once a selection loop terminates. The pool,
//! EVM, and state manager are external collaborators modeled as traits
//! ([`PendingPool`], [`Vm`], [`StateManager`]); this crate owns only the
//! selection/execution state machine described in its design notes.

#![doc(
    html_logo_url = "https://www.telco.in/logos/TEL.svg",
    html_favicon_url = "https://www.telco.in/logos/TEL.svg",
    issue_tracker_base_url = "https://github.com/telcoin-association/telcoin-network/issues/"
)]
#![warn(missing_debug_implementations, missing_docs, unreachable_pub, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
mod checkpoint;
mod config;
mod controller;
mod error;
mod events;
mod heap;
mod metrics;
mod origin_set;
mod pool;
mod selection;
mod transaction;
mod vm;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use block::{BlockData, ParentBlock};
pub use checkpoint::StateManager;
pub use config::{MinerConfig, MIN_TX_GAS};
pub use controller::{CreateBlock, Miner};
pub use error::{CheckpointError, MinerError};
pub use events::{BlockMessage, MinerEvent};
pub use metrics::MinerMetrics;
pub use pool::PendingPool;
pub use transaction::{FinalizeStatus, PooledTransaction, RuntimeError};
pub use vm::{ExecutionOutcome, Vm, VmError};
