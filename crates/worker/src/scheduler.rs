//! The periodic tick loop.
//!
//! Exactly one scheduler runs per deployment. Ticks never overlap: the next
//! tick starts only after the previous one returned. A tick that hits its
//! timeout stops starting firings and drains the ones in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::engine::{Engine, TickReport};

pub struct Scheduler {
    engine: Arc<Engine>,
    poll_interval: Duration,
    tick_timeout: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>, config: &EngineConfig) -> Self {
        Self {
            engine,
            poll_interval: config.poll_interval,
            tick_timeout: config.tick_timeout,
        }
    }

    /// Tick every `poll_interval` until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            tick_timeout_secs = self.tick_timeout.as_secs(),
            "Rule scheduler started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Rule scheduler shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.run_once(&cancel).await;
                }
            }
        }
    }

    /// Run a single bounded tick.
    ///
    /// When the timeout or `shutdown` fires, no new firing is started. A
    /// firing that already holds its claim finishes, so a sent message is
    /// never left without its firing record.
    pub async fn run_once(&self, shutdown: &CancellationToken) -> Option<TickReport> {
        let stop = shutdown.child_token();
        let tick = self.engine.tick_until(Utc::now(), &stop);
        tokio::pin!(tick);

        let result = tokio::select! {
            result = &mut tick => result,
            _ = tokio::time::sleep(self.tick_timeout) => {
                stop.cancel();
                tracing::error!(
                    timeout_secs = self.tick_timeout.as_secs(),
                    "Tick exceeded its timeout; finishing in-flight firings",
                );
                tick.await
            }
        };

        match result {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Tick failed");
                None
            }
        }
    }
}
