use serde::{Deserialize, Serialize};

/// Minimum gas a single transfer costs; used as the fast-exit threshold once
/// the remaining block gas can no longer fit even the cheapest transaction.
pub const MIN_TX_GAS: u64 = 21_000;

/// Constructor-time configuration for a [`crate::Miner`].
///
/// Plain data only — parsing it out of a config file or CLI flags is the
/// embedding node's concern, not this crate's.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Maximum cumulative gas a single block may spend.
    pub block_gas_limit: u64,
    /// When set, successor blocks built during the same `mine` call carry at
    /// most one transaction each.
    pub instamine: bool,
    /// Instamine variant where the `Block` event is awaited before the
    /// selection loop continues, giving the consumer back-pressure over the
    /// miner.
    pub legacy_instamine: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self { block_gas_limit: 30_000_000, instamine: false, legacy_instamine: false }
    }
}
