use async_trait::async_trait;

use crate::error::CheckpointError;

/// The state-manager collaborator. Out of scope for this crate beyond this
/// interface: persistence, snapshotting strategy and backing store are all
/// the caller's concern.
#[async_trait]
pub trait StateManager: Send + Sync {
    /// Opens a new nested checkpoint.
    async fn checkpoint(&self) -> Result<(), CheckpointError>;
    /// Commits the innermost open checkpoint, folding its changes into the
    /// enclosing scope.
    async fn commit(&self) -> Result<(), CheckpointError>;
    /// Reverts the innermost open checkpoint, discarding its changes.
    async fn revert(&self) -> Result<(), CheckpointError>;
}

/// Opens nested checkpoint scopes against a [`StateManager`].
///
/// The selection loop nests two levels: one [`CheckpointScope`] wrapping the
/// whole block, and one wrapping each transaction attempt. Both levels use
/// the same scope type since the sequencing contract is identical at either
/// level — only the caller's nesting discipline distinguishes them.
pub(crate) struct CheckpointStack<'a, S: StateManager + ?Sized> {
    state: &'a S,
}

impl<'a, S: StateManager + ?Sized> CheckpointStack<'a, S> {
    pub(crate) fn new(state: &'a S) -> Self {
        Self { state }
    }

    pub(crate) async fn open(&self) -> Result<CheckpointScope<'a, S>, CheckpointError> {
        self.state.checkpoint().await?;
        Ok(CheckpointScope { state: self.state, closed: false })
    }
}

/// A single open checkpoint. Must be consumed by [`CheckpointScope::commit`]
/// or [`CheckpointScope::revert`]; an unconsumed scope is flagged by the
/// compiler via `#[must_use]` and by a debug assertion on drop.
#[must_use = "a checkpoint scope must be closed with commit() or revert()"]
pub(crate) struct CheckpointScope<'a, S: StateManager + ?Sized> {
    state: &'a S,
    closed: bool,
}

impl<'a, S: StateManager + ?Sized> CheckpointScope<'a, S> {
    pub(crate) async fn commit(mut self) -> Result<(), CheckpointError> {
        self.closed = true;
        self.state.commit().await
    }

    pub(crate) async fn revert(mut self) -> Result<(), CheckpointError> {
        self.closed = true;
        self.state.revert().await
    }
}

impl<'a, S: StateManager + ?Sized> Drop for CheckpointScope<'a, S> {
    fn drop(&mut self) {
        debug_assert!(self.closed, "checkpoint scope dropped without commit or revert");
    }
}
