use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::warn;

use crate::block::BlockData;

/// A freshly produced block.
///
/// In legacy-instamine mode `ack` is always `Some`, and the controller
/// awaits it before continuing the selection loop — the subscriber's
/// acknowledgement is the back-pressure mechanism. Outside legacy-instamine,
/// `ack` is `None` and the notification is fire-and-forget.
#[derive(Debug)]
pub struct BlockMessage {
    /// The produced block.
    pub data: Arc<BlockData>,
    ack: Option<oneshot::Sender<()>>,
}

impl BlockMessage {
    /// Acknowledges receipt. A no-op outside legacy-instamine mode.
    pub fn acknowledge(self) {
        if let Some(ack) = self.ack {
            let _ = ack.send(());
        }
    }
}

/// Broadcast-only events; `Idle` carries no payload and has no
/// back-pressure requirement, unlike `Block` (see [`BlockMessage`]).
#[derive(Debug, Clone)]
pub enum MinerEvent {
    /// A selection loop has ended and the miner is no longer busy.
    Idle,
}

pub(crate) struct EventSink {
    blocks: mpsc::Sender<BlockMessage>,
    idle: broadcast::Sender<MinerEvent>,
}

impl EventSink {
    pub(crate) fn new(
        block_capacity: usize,
    ) -> (Self, mpsc::Receiver<BlockMessage>, broadcast::Receiver<MinerEvent>) {
        let (blocks_tx, blocks_rx) = mpsc::channel(block_capacity);
        let (idle_tx, idle_rx) = broadcast::channel(32);
        (Self { blocks: blocks_tx, idle: idle_tx }, blocks_rx, idle_rx)
    }

    pub(crate) fn subscribe_idle(&self) -> broadcast::Receiver<MinerEvent> {
        self.idle.subscribe()
    }

    pub(crate) async fn emit_block(&self, data: BlockData, legacy_instamine: bool) {
        let data = Arc::new(data);
        if legacy_instamine {
            let (ack_tx, ack_rx) = oneshot::channel();
            if self.blocks.send(BlockMessage { data, ack: Some(ack_tx) }).await.is_ok() {
                let _ = ack_rx.await;
            }
        } else if let Err(err) = self.blocks.try_send(BlockMessage { data, ack: None }) {
            warn!(
                target: "miner::events",
                %err,
                "dropped block notification, consumer is not keeping up"
            );
        }
    }

    pub(crate) fn emit_idle(&self) {
        // No subscribers is a normal state (nobody is watching for idle); a
        // send error here is not an error condition for the miner.
        let _ = self.idle.send(MinerEvent::Idle);
    }
}
