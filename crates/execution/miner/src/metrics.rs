use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};

/// Ambient observability for the miner's own behavior. Not part of the
/// selection algorithm; registered against a caller-supplied registry so
/// tests can use a fresh one per `Miner` instance.
#[derive(Debug, Clone)]
pub struct MinerMetrics {
    /// Total number of blocks produced by the miner.
    pub blocks_produced: IntCounter,
    /// Total number of transactions committed into a produced block.
    pub transactions_accepted: IntCounter,
    /// Total number of transactions the vm rejected during selection.
    pub transactions_rejected: IntCounter,
    /// Wall-clock duration of a single block's selection loop.
    pub selection_loop_duration_seconds: Histogram,
}

impl MinerMetrics {
    /// Registers a fresh set of miner metrics against `registry`.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let blocks_produced = IntCounter::with_opts(Opts::new(
            "tn_miner_blocks_produced_total",
            "Total number of blocks produced by the miner",
        ))?;
        registry.register(Box::new(blocks_produced.clone()))?;

        let transactions_accepted = IntCounter::with_opts(Opts::new(
            "tn_miner_transactions_accepted_total",
            "Total number of transactions included in a produced block",
        ))?;
        registry.register(Box::new(transactions_accepted.clone()))?;

        let transactions_rejected = IntCounter::with_opts(Opts::new(
            "tn_miner_transactions_rejected_total",
            "Total number of transactions rejected by the vm during selection",
        ))?;
        registry.register(Box::new(transactions_rejected.clone()))?;

        let selection_loop_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "tn_miner_selection_loop_duration_seconds",
            "Wall-clock duration of a single block's selection loop",
        ))?;
        registry.register(Box::new(selection_loop_duration_seconds.clone()))?;

        Ok(Self {
            blocks_produced,
            transactions_accepted,
            transactions_rejected,
            selection_loop_duration_seconds,
        })
    }
}
