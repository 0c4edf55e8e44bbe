use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use hierarchy_core::HealthConfig;
use hierarchy_graph::HierarchyStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Minimum spacing between two probes of the graph database.
pub const PROBE_DEBOUNCE: Duration = Duration::from_secs(1);

pub const STATUS_OK: &str = "OK";
pub const STATUS_CRITICAL: &str = "CRITICAL";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_checked: DateTime<Utc>,
}

impl CheckStatus {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Checks {
    pub graph_db: CheckStatus,
}

#[derive(Serialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: Checks,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.checks.graph_db.is_ok()
    }
}

#[derive(Debug, Clone)]
struct Probe {
    at: Instant,
    status: CheckStatus,
}

/// Probes the graph database and tracks how long it has been failing.
pub struct HealthChecker {
    store: HierarchyStore,
    probe_timeout: Duration,
    critical_timeout: Duration,
    started: Instant,
    last: AsyncMutex<Option<Probe>>,
    unhealthy_since: Mutex<Option<Instant>>,
}

impl HealthChecker {
    pub fn new(store: HierarchyStore, config: &HealthConfig) -> Self {
        Self {
            store,
            probe_timeout: config.probe_timeout(),
            critical_timeout: config.critical_timeout(),
            started: Instant::now(),
            last: AsyncMutex::new(None),
            unhealthy_since: Mutex::new(None),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Graph database status, reusing the previous outcome when it is
    /// younger than [`PROBE_DEBOUNCE`]. Concurrent callers wait on the
    /// probe in flight rather than starting their own.
    pub async fn check_graph(&self) -> CheckStatus {
        let mut last = self.last.lock().await;
        if let Some(probe) = last.as_ref() {
            if probe.at.elapsed() < PROBE_DEBOUNCE {
                return probe.status.clone();
            }
        }

        let begun = Instant::now();
        let outcome = timeout(self.probe_timeout, self.store.ping()).await;
        let elapsed_ms = begun.elapsed().as_millis() as u64;
        let status = match outcome {
            Ok(Ok(())) => CheckStatus {
                status: STATUS_OK.to_string(),
                response_time_ms: Some(elapsed_ms),
                error: None,
                last_checked: Utc::now(),
            },
            Ok(Err(e)) => critical(e.to_string()),
            Err(_) => critical(format!("probe timed out after {:?}", self.probe_timeout)),
        };

        self.record(&status);
        *last = Some(Probe {
            at: Instant::now(),
            status: status.clone(),
        });
        status
    }

    pub async fn report(&self) -> HealthResponse {
        let graph_db = self.check_graph().await;
        HealthResponse {
            status: graph_db.status.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime().as_secs(),
            checks: Checks { graph_db },
        }
    }

    /// How long the graph has been failing, if it currently is.
    pub fn unhealthy_for(&self) -> Option<Duration> {
        self.unhealthy_since.lock().map(|since| since.elapsed())
    }

    pub fn is_critical(&self) -> bool {
        self.unhealthy_for()
            .is_some_and(|d| d > self.critical_timeout)
    }

    fn record(&self, status: &CheckStatus) {
        let mut since = self.unhealthy_since.lock();
        match (status.is_ok(), since.is_some()) {
            (true, true) => {
                info!("Graph database recovered");
                *since = None;
            }
            (false, false) => {
                warn!(error = status.error.as_deref().unwrap_or(""), "Graph database probe failed");
                *since = Some(Instant::now());
            }
            _ => {}
        }
    }

    /// Re-probe every `interval` until `cancel` fires.
    pub fn spawn_monitor(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Health monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let status = self.check_graph().await;
                        if self.is_critical() {
                            warn!(
                                unhealthy_secs = self.unhealthy_for().unwrap_or_default().as_secs(),
                                critical_timeout_secs = self.critical_timeout.as_secs(),
                                error = status.error.as_deref().unwrap_or(""),
                                "Graph database unhealthy beyond critical timeout"
                            );
                        }
                    }
                }
            }
        })
    }
}

fn critical(error: String) -> CheckStatus {
    CheckStatus {
        status: STATUS_CRITICAL.to_string(),
        response_time_ms: None,
        error: Some(error),
        last_checked: Utc::now(),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.report().await;
    let code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (code, Json(report))
}
