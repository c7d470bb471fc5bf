//! Live dashboard tickers.
//!
//! Two background tasks drive a mounted view: a wall-clock tick and a slower
//! recompute of today's worked hours. Both stop when [`DashboardTickers`] is
//! stopped or dropped, or when the receiving side of the channel goes away.

use crate::config::DashboardConfig;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Event sent by a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerEvent {
    /// Wall clock advanced.
    Clock(DateTime<Local>),
    /// Time to recompute today's hours.
    RecomputeHours(DateTime<Local>),
}

impl TickerEvent {
    pub fn at(&self) -> DateTime<Local> {
        match self {
            TickerEvent::Clock(now) | TickerEvent::RecomputeHours(now) => *now,
        }
    }
}

/// Handles to the running clock and hours tasks.
pub struct DashboardTickers {
    clock: JoinHandle<()>,
    hours: JoinHandle<()>,
}

impl DashboardTickers {
    /// Spawn both tickers on the current runtime.
    pub fn start(clock_every: Duration, hours_every: Duration, tx: mpsc::UnboundedSender<TickerEvent>) -> Self {
        let clock = spawn_ticker("clock", clock_every, tx.clone(), TickerEvent::Clock);
        let hours = spawn_ticker("hours", hours_every, tx, TickerEvent::RecomputeHours);
        Self { clock, hours }
    }

    /// Spawn both tickers with the intervals from the dashboard config.
    pub fn from_config(config: &DashboardConfig, tx: mpsc::UnboundedSender<TickerEvent>) -> Self {
        Self::start(
            Duration::from_secs(config.clock_tick_secs),
            Duration::from_secs(config.hours_refresh_secs),
            tx,
        )
    }

    pub fn is_running(&self) -> bool {
        !self.clock.is_finished() || !self.hours.is_finished()
    }

    /// Stop both tickers.
    pub fn stop(self) {
        // Drop aborts the tasks.
    }
}

impl Drop for DashboardTickers {
    fn drop(&mut self) {
        self.clock.abort();
        self.hours.abort();
        debug!("Dashboard tickers stopped");
    }
}

fn spawn_ticker(
    name: &'static str,
    every: Duration,
    tx: mpsc::UnboundedSender<TickerEvent>,
    event: fn(DateTime<Local>) -> TickerEvent,
) -> JoinHandle<()> {
    // tokio::time::interval panics on a zero period
    let every = every.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut interval = time::interval_at(time::Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(event(Local::now())).is_err() {
                debug!("{name} ticker receiver closed");
                break;
            }
        }
    })
}
