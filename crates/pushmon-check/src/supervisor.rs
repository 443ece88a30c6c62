//! Supervisor — owns the running generation of check tasks.
//!
//! A generation is every check task spawned from one config snapshot. All
//! tasks of a generation share one cancellation token and one completion
//! barrier, and every task shares the process-wide HTTP client.
//!
//! # Lifecycle
//!
//! ```text
//! start(config)  ──► Generation #1 (one CheckTask per check)
//!
//! reload(config) ──► cancel #1 ──► [drain #1 if drain_on_reload] ──► Generation #2
//!                    #1 moves to `retired` until its tasks return
//!
//! shutdown()     ──► cancel current ──► drain current + retired ──► done
//! ```
//!
//! Without `drain_on_reload`, a task of the old generation that is mid-cycle
//! when the reload lands finishes that cycle while the new generation is
//! already running, so the same endpoint can briefly be pushed by both.

use std::time::Duration;

use pushmon_core::Config;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::CheckResult;
use crate::probe::build_client;
use crate::task::CheckTask;

/// A cohort of check tasks sharing one cancellation scope.
#[derive(Debug)]
pub struct Generation {
    id: u64,
    cancel: CancellationToken,
    tracker: TaskTracker,
    checks: Vec<String>,
}

impl Generation {
    /// Spawn one task per check in `tasks`, all bound to a fresh scope.
    pub fn spawn(id: u64, tasks: Vec<CheckTask>, client: &Client) -> Self {
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let mut checks = Vec::with_capacity(tasks.len());

        for task in tasks {
            checks.push(task.name().to_string());
            tracker.spawn(task.run(client.clone(), cancel.clone()));
        }
        tracker.close();

        info!(generation = id, checks = checks.len(), "generation started");
        Self {
            id,
            cancel,
            tracker,
            checks,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn check_names(&self) -> &[String] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Ask every task to stop before its next cycle.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of tasks that have not returned yet.
    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    /// Whether every task has returned.
    pub fn is_drained(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait until every task has returned.
    pub async fn drain(&self) {
        self.tracker.wait().await;
        debug!(generation = self.id, "generation drained");
    }
}

/// Manages the current generation and reacts to start, reload and shutdown.
pub struct Supervisor {
    client: Client,
    timeout: Duration,
    current: Generation,
    /// Cancelled generations whose tasks may still be finishing a cycle.
    retired: Vec<Generation>,
    next_id: u64,
}

impl Supervisor {
    /// Build the shared client and spawn the first generation.
    pub fn start(config: &Config) -> CheckResult<Self> {
        let timeout = config.timeout();
        let client = build_client(timeout)?;
        Ok(Self::with_client(config, client))
    }

    /// Spawn the first generation using an existing client.
    pub fn with_client(config: &Config, client: Client) -> Self {
        warn_zero_retries(config);
        let current = Generation::spawn(1, tasks_for(config), &client);
        Self {
            client,
            timeout: config.timeout(),
            current,
            retired: Vec::new(),
            next_id: 2,
        }
    }

    /// Replace the running check set with one built from `config`.
    ///
    /// The shared client is rebuilt only when the timeout changed. Unless
    /// `config.drain_on_reload` is set, the new generation starts without
    /// waiting for the old one to finish.
    pub async fn reload(&mut self, config: &Config) -> CheckResult<()> {
        if config.timeout() != self.timeout {
            self.client = build_client(config.timeout())?;
            info!(
                old_secs = self.timeout.as_secs(),
                new_secs = config.timeout,
                "http client rebuilt with new timeout"
            );
            self.timeout = config.timeout();
        }
        warn_zero_retries(config);

        self.current.cancel();
        if config.drain_on_reload {
            debug!(generation = self.current.id(), "draining before reload");
            self.current.drain().await;
        }

        let id = self.next_id;
        self.next_id += 1;
        let next = Generation::spawn(id, tasks_for(config), &self.client);
        let old = std::mem::replace(&mut self.current, next);

        self.retired.retain(|g| !g.is_drained());
        if !old.is_drained() {
            self.retired.push(old);
        }

        info!(
            generation = id,
            retired = self.retired.len(),
            "configuration reloaded and checks restarted"
        );
        Ok(())
    }

    /// Cancel the current generation and wait for every task to return,
    /// including tasks of retired generations still finishing a cycle.
    pub async fn shutdown(self) {
        info!(generation = self.current.id(), "stopping checks");
        self.current.cancel();
        self.current.drain().await;
        for old in &self.retired {
            old.drain().await;
        }
        info!("all checks stopped");
    }

    pub fn generation_id(&self) -> u64 {
        self.current.id()
    }

    pub fn current(&self) -> &Generation {
        &self.current
    }

    /// Names of the checks in the current generation.
    pub fn active_checks(&self) -> Vec<String> {
        self.current.check_names().to_vec()
    }

    /// Retired generations with tasks still running.
    pub fn draining(&self) -> usize {
        self.retired.iter().filter(|g| !g.is_drained()).count()
    }
}

fn tasks_for(config: &Config) -> Vec<CheckTask> {
    config.checks.iter().cloned().map(CheckTask::new).collect()
}

fn warn_zero_retries(config: &Config) {
    for check in config.checks.iter().filter(|c| c.retries == 0) {
        warn!(check = %check.name, "retries is 0, no push requests will be sent");
    }
}
