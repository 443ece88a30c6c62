//! Per-check task: tick, gate, then a bounded run of push attempts.
//!
//! ```text
//! Sleeping ──tick──► Gating ──proceed──► Executing ──► Sleeping
//!    │                  └──skip──────────────────────────┘
//!    └──cancelled──► Stopped
//! ```
//!
//! Cancellation is only observed while sleeping. A cycle that has started
//! always runs to success or exhaustion; cancellation prevents the next one.

use std::time::Duration;

use pushmon_core::CheckSpec;
use reqwest::Client;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::gate::{self, GateDecision};
use crate::probe;

/// Result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The precondition denied the cycle; no request was sent.
    Gated,
    /// An attempt returned 200 after `attempts` requests.
    Succeeded { attempts: u32 },
    /// Every configured attempt failed.
    Exhausted { attempts: u32 },
}

/// Runtime instance of one [`CheckSpec`], bound to a generation while running.
#[derive(Debug, Clone)]
pub struct CheckTask {
    spec: CheckSpec,
    period: Duration,
}

impl CheckTask {
    pub fn new(spec: CheckSpec) -> Self {
        let period = spec.interval();
        Self { spec, period }
    }

    /// Create a task with an explicit tick period (for testing).
    pub fn with_period(spec: CheckSpec, period: Duration) -> Self {
        Self { spec, period }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one gate-then-attempts cycle.
    ///
    /// Attempts are strictly sequential with no delay between them.
    pub async fn run_cycle(&self, client: &Client) -> CycleOutcome {
        let name = self.name();

        if gate::evaluate(name, &self.spec.command).await == GateDecision::Skip {
            debug!(check = %name, "skipping cycle, precondition not met");
            return CycleOutcome::Gated;
        }

        let max = self.spec.retries;
        debug!(check = %name, max_attempts = max, "executing push cycle");

        let mut attempts = 0;
        while attempts < max {
            attempts += 1;
            debug!(check = %name, attempt = attempts, max_attempts = max, "push attempt");
            if probe::probe(client, name, &self.spec.url).await.is_success() {
                return CycleOutcome::Succeeded { attempts };
            }
        }
        CycleOutcome::Exhausted { attempts }
    }

    /// Drive cycles on a fixed period until `cancel` fires.
    ///
    /// The first cycle runs one period after start. Ticks missed while a
    /// slow cycle is running are dropped, not replayed.
    pub async fn run(self, client: Client, cancel: CancellationToken) {
        info!(
            check = %self.name(),
            interval_secs = self.period.as_secs_f64(),
            retries = self.spec.retries,
            "starting check"
        );

        // Validated configs never carry a zero interval; interval_at panics on one.
        let period = self.period.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(check = %self.name(), "check received stop signal");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.run_cycle(&client).await;
                    debug!(check = %self.name(), ?outcome, "completed push cycle");
                }
            }
        }
    }
}
