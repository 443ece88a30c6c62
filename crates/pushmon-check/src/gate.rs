//! Precondition gate.
//!
//! A check may name a shell expression that must succeed before any push
//! request of a cycle is sent. A failing precondition is an ordinary skip,
//! never an error.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

/// Whether a cycle should send its push requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip,
}

/// Evaluate a check's precondition command through `sh -c`.
///
/// An empty command always proceeds. Otherwise stdout and stderr are
/// captured into one buffer (stderr after stdout); exit status 0 proceeds
/// and anything else, including a spawn failure, skips.
pub async fn evaluate(check: &str, command: &str) -> GateDecision {
    if command.trim().is_empty() {
        return GateDecision::Proceed;
    }

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            warn!(%check, %command, error = %e, "precondition command could not be started");
            return GateDecision::Skip;
        }
    };

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);
    let combined = String::from_utf8_lossy(&combined);

    if output.status.success() {
        debug!(%check, output = %combined, "precondition passed");
        GateDecision::Proceed
    } else {
        warn!(%check, status = %output.status, output = %combined, "precondition failed");
        GateDecision::Skip
    }
}
