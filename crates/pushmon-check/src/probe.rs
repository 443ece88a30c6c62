//! Push request logic.
//!
//! Sends a single GET to a check's URL and classifies the response.
//! Retry policy lives in [`crate::task`]; nothing here retries.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

use crate::error::CheckResult;

/// Result of a single push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint answered exactly 200.
    Success,
    /// The endpoint answered with any other status, including other 2xx.
    Rejected { status: u16 },
    /// The request could not be built or sent, or the body could not be read.
    Failed,
}

impl ProbeResult {
    pub fn is_success(self) -> bool {
        self == ProbeResult::Success
    }
}

/// Build the HTTP client shared by every check task in the process.
///
/// `timeout` bounds each request end to end, body included.
pub fn build_client(timeout: Duration) -> CheckResult<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pushmon/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Send one push request for `check` to `url`.
///
/// The URL is used verbatim. The response body is always read to the end
/// so the pooled connection can be reused.
pub async fn probe(client: &Client, check: &str, url: &str) -> ProbeResult {
    let request = match client.get(url).build() {
        Ok(request) => request,
        Err(e) => {
            error!(%check, %url, error = %e, "failed to build push request");
            return ProbeResult::Failed;
        }
    };
    debug!(%check, url = %request.url(), "sending push request");

    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(e) => {
            error!(%check, %url, error = %e, "push request failed");
            return ProbeResult::Failed;
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            error!(%check, %url, error = %e, "failed to read push response");
            return ProbeResult::Failed;
        }
    };

    if status == StatusCode::OK {
        info!(%check, "push succeeded");
        ProbeResult::Success
    } else {
        warn!(%check, status = status.as_u16(), %body, "push rejected");
        ProbeResult::Rejected {
            status: status.as_u16(),
        }
    }
}
