use thiserror::Error;

/// Errors surfaced from the state manager's checkpoint/commit/revert triad.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Opening a checkpoint failed.
    #[error("state manager checkpoint failed: {0}")]
    Checkpoint(String),
    /// Committing a checkpoint failed.
    #[error("state manager commit failed: {0}")]
    Commit(String),
    /// Reverting a checkpoint failed.
    #[error("state manager revert failed: {0}")]
    Revert(String),
}

/// Catastrophic failures that abort a `mine` call. Per-transaction rejection
/// is not an error and never reaches this type; see [`crate::vm::VmError`].
#[derive(Debug, Error)]
pub enum MinerError {
    /// The state manager's checkpoint/commit/revert triad failed.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// The vm reported a failure severe enough to abort the `mine` call.
    #[error("fatal vm failure: {0}")]
    Vm(String),
}
