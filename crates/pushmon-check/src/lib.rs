//! pushmon-check — the check engine behind the pushmon daemon.
//!
//! Each configured check runs as its own task: on every tick it evaluates
//! an optional precondition command and, if that passes, sends up to
//! `retries` push requests until one is answered with 200.
//!
//! # Architecture
//!
//! ```text
//! Supervisor
//!   ├── shared reqwest::Client (pooled, client-wide timeout)
//!   ├── current Generation (CancellationToken + TaskTracker)
//!   │   └── CheckTask per check
//!   │       ├── gate::evaluate()  → Proceed | Skip
//!   │       └── probe::probe()    → Success | Rejected | Failed   (× retries)
//!   └── retired Generations still finishing their last cycle
//! ```
//!
//! Failures of individual requests or preconditions are logged and
//! absorbed by the task; only client construction can fail the caller.

pub mod error;
pub mod gate;
pub mod probe;
pub mod supervisor;
pub mod task;

pub use error::{CheckError, CheckResult};
pub use gate::GateDecision;
pub use probe::{build_client, ProbeResult};
pub use supervisor::{Generation, Supervisor};
pub use task::{CheckTask, CycleOutcome};
