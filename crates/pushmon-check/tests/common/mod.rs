//! Scripted push endpoint for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use pushmon_core::{CheckSpec, Config};

/// A local endpoint answering with a scripted sequence of status codes,
/// then 200 once the script runs out.
#[derive(Clone)]
pub struct Endpoint {
    pub url: String,
    hits: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<u16>>>,
    delay: Duration,
}

impl Endpoint {
    pub async fn start(script: &[u16]) -> Self {
        Self::start_with_delay(script, Duration::ZERO).await
    }

    pub async fn start_with_delay(script: &[u16], delay: Duration) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let endpoint = Self {
            url: format!("http://{addr}/ping"),
            hits: Arc::new(AtomicUsize::new(0)),
            script: Arc::new(Mutex::new(script.iter().copied().collect())),
            delay,
        };

        let app = Router::new()
            .route("/ping", get(respond))
            .with_state(endpoint.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        endpoint
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn check(&self, name: &str, retries: u32) -> CheckSpec {
        CheckSpec {
            name: name.to_string(),
            url: self.url.clone(),
            interval: 1,
            retries,
            command: String::new(),
        }
    }
}

async fn respond(State(endpoint): State<Endpoint>) -> (StatusCode, &'static str) {
    endpoint.hits.fetch_add(1, Ordering::SeqCst);
    if !endpoint.delay.is_zero() {
        tokio::time::sleep(endpoint.delay).await;
    }
    let code = endpoint.script.lock().unwrap().pop_front().unwrap_or(200);
    let status = StatusCode::from_u16(code).unwrap();
    (status, "scripted")
}

pub fn config(checks: Vec<CheckSpec>) -> Config {
    Config {
        pid_file: "/tmp/pushmon-test.pid".into(),
        timeout: 5,
        drain_on_reload: false,
        logging: Default::default(),
        checks,
    }
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
