//! Fixed-interval driver: fetch boards, scan, report, wait.

use crate::aggregator::BoardAggregator;
use crate::arbitrage::{ArbitrageConfig, ArbitrageSignal, scan};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Emit a heartbeat every this many cycles without a signal.
const HEARTBEAT_EVERY: u64 = 5;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub pair: String,
    pub depth: usize,
    pub interval: Duration,
}

/// Outcome of a single poll cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub venues_ok: usize,
    pub venues_failed: usize,
    pub signals: Vec<ArbitrageSignal>,
}

pub struct PollingLoop {
    aggregator: BoardAggregator,
    config: PollerConfig,
    arbitrage: ArbitrageConfig,
}

impl PollingLoop {
    pub fn new(aggregator: BoardAggregator, config: PollerConfig, arbitrage: ArbitrageConfig) -> Self {
        Self {
            aggregator,
            config,
            arbitrage,
        }
    }

    /// Fetch one snapshot and scan it.
    pub async fn run_cycle(&self) -> CycleReport {
        let snapshot = self
            .aggregator
            .get_all_boards(&self.config.pair, self.config.depth)
            .await;
        let signals = scan(&snapshot, &self.arbitrage);
        CycleReport {
            venues_ok: snapshot.boards.len(),
            venues_failed: snapshot.failures.len(),
            signals,
        }
    }

    /// Poll until `shutdown` flips to `true` (or its sender is dropped).
    /// Returns the number of completed cycles.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;

        info!(
            pair = %self.config.pair,
            depth = self.config.depth,
            interval_secs = self.config.interval.as_secs_f64(),
            venues = ?self.aggregator.exchange_ids(),
            "[INIT] polling loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let report = tokio::select! {
                report = self.run_cycle() => report,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };
            ticks += 1;

            if !report.signals.is_empty() {
                info!(
                    cycle = ticks,
                    signals = report.signals.len(),
                    "[OPP] opportunities found"
                );
            } else if ticks % HEARTBEAT_EVERY == 0 {
                info!(
                    cycle = ticks,
                    venues_ok = report.venues_ok,
                    venues_failed = report.venues_failed,
                    "[HEARTBEAT] no opps above threshold"
                );
            }
        }

        info!(cycles = ticks, "[SHUTDOWN] polling loop stopped");
        ticks
    }
}
