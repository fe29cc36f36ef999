//! ConnectionMonitor - Backend reachability with backoff polling

use bus::EventBus;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shared::{
    BackendStatusChanged, ConnectionStatus, BACKEND_CONNECTED, BACKEND_DISCONNECTED,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::InvoiceClient;

/// Reachability as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Unknown,
    Connected,
    Disconnected,
}

/// Polling parameters
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub base_interval: Duration,
    pub max_interval: Duration,
    pub backoff: f64,
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            backoff: 1.5,
            request_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug)]
struct MonitorState {
    link: LinkState,
    interval: Duration,
    last_error: Option<String>,
}

struct MonitorInner {
    client: InvoiceClient,
    bus: EventBus,
    config: MonitorConfig,
    state: Mutex<MonitorState>,
}

/// Polls `GET /health` and broadcasts connectivity transitions on the bus.
///
/// The first observation only sets the state; later changes emit
/// `backend:connected` or `backend:disconnected` plus `backend:statusChange`.
/// Dropping the monitor stops the poller.
pub struct ConnectionMonitor {
    inner: Arc<MonitorInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionMonitor {
    pub fn new(client: InvoiceClient, bus: EventBus) -> Self {
        Self::with_config(client, bus, MonitorConfig::default())
    }

    pub fn with_config(client: InvoiceClient, bus: EventBus, config: MonitorConfig) -> Self {
        let interval = config.base_interval;
        Self {
            inner: Arc::new(MonitorInner {
                client,
                bus,
                config,
                state: Mutex::new(MonitorState {
                    link: LinkState::Unknown,
                    interval,
                    last_error: None,
                }),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> LinkState {
        self.inner.state.lock().link
    }

    /// Delay before the next poll
    pub fn current_interval(&self) -> Duration {
        self.inner.state.lock().interval
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    /// Start polling in the background. No-op when already running.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(async move {
            loop {
                inner.check().await;
                let delay = inner.state.lock().interval;
                tokio::time::sleep(delay).await;
            }
        }));
        info!(url = %self.inner.client.base_url(), "Connection monitor started");
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Connection monitor stopped");
        }
    }

    /// Check now and return the resulting state
    pub async fn force_check(&self) -> LinkState {
        self.inner.check().await
    }

    #[cfg(test)]
    fn record(&self, next: LinkState, error: Option<String>) -> LinkState {
        self.inner.record(next, error)
    }
}

impl MonitorInner {
    async fn check(&self) -> LinkState {
        let result = self.client.health(self.config.request_timeout).await;
        let (next, error) = match result {
            Ok(_) => (LinkState::Connected, None),
            Err(e) => (LinkState::Disconnected, Some(e.to_string())),
        };
        self.record(next, error)
    }

    fn record(&self, next: LinkState, error: Option<String>) -> LinkState {
        let previous = {
            let mut state = self.state.lock();
            let previous = state.link;
            state.link = next;
            state.last_error = error.clone();
            state.interval = match next {
                LinkState::Disconnected => {
                    let grown = state.interval.mul_f64(self.config.backoff);
                    grown.min(self.config.max_interval)
                }
                _ => self.config.base_interval,
            };
            debug!(state = ?next, interval_ms = state.interval.as_millis() as u64, "Health check");
            previous
        };

        if previous != LinkState::Unknown && previous != next {
            self.broadcast(next, error);
        }
        next
    }

    fn broadcast(&self, next: LinkState, error: Option<String>) {
        let status = match next {
            LinkState::Connected => {
                info!("Backend connection restored");
                self.bus.emit(BACKEND_CONNECTED, Map::new());
                ConnectionStatus::Connected
            }
            LinkState::Disconnected => {
                warn!(error = error.as_deref().unwrap_or(""), "Backend connection lost");
                let mut payload = Map::new();
                if let Some(e) = &error {
                    payload.insert("error".to_string(), Value::String(e.clone()));
                }
                self.bus.emit(BACKEND_DISCONNECTED, payload);
                ConnectionStatus::Disconnected
            }
            LinkState::Unknown => return,
        };

        self.bus.emit_typed(&BackendStatusChanged {
            status,
            timestamp: Utc::now(),
            error,
        });
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
