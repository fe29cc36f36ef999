//! EventBus - Process-wide publish/subscribe channel between fragments
//!
//! Dispatch is synchronous and cooperative: `emit` runs every handler that is
//! subscribed to the event type at the moment of emission, in subscription
//! order, before returning. A handler that fails (returns `Err` or panics) is
//! logged and skipped; the remaining handlers still run.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shared::{DomainEvent, TypedEvent};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Error a handler may return
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Arc<dyn Fn(&DomainEvent) -> Result<(), HandlerError> + Send + Sync>;

static GLOBAL_BUS: Lazy<EventBus> = Lazy::new(EventBus::new);

/// Identifier of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

struct Entry {
    id: SubscriptionId,
    event_type: String,
    handler: Handler,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct BusInner {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|e| e.id == id) {
            Some(index) => {
                let entry = entries.remove(index);
                entry.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

/// Outcome of one emission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that completed successfully
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

/// Cross-fragment event bus
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.entries.lock().len())
            .finish()
    }
}

impl EventBus {
    /// Create a standalone bus (tests, embedded shells)
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus.
    ///
    /// Created on first use during shell startup and never torn down.
    pub fn global() -> &'static EventBus {
        &GLOBAL_BUS
    }

    /// Register a handler for `event_type`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, event_type: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&DomainEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let event_type = event_type.into();
        debug!(event_type = %event_type, subscription = id.0, "Handler subscribed");

        self.inner.entries.lock().push(Entry {
            id,
            event_type: event_type.clone(),
            handler: Arc::new(handler),
            active: Arc::new(AtomicBool::new(true)),
        });

        Subscription {
            id,
            event_type,
            bus: Arc::downgrade(&self.inner),
            detached: false,
        }
    }

    /// Register a handler receiving the decoded payload of `E`.
    ///
    /// Events whose payload does not decode as `E` are reported as failures.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe_typed<E, F>(&self, handler: F) -> Subscription
    where
        E: TypedEvent + 'static,
        F: Fn(E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe(E::TYPE, move |event| match E::from_event(event) {
            Some(typed) => handler(typed),
            None => Err(format!("Malformed '{}' payload", E::TYPE).into()),
        })
    }

    /// Broadcast an event built from `event_type` and `payload`
    pub fn emit(&self, event_type: impl Into<String>, payload: Map<String, Value>) -> DispatchReport {
        self.publish(DomainEvent::new(event_type, payload))
    }

    /// Broadcast a typed event
    pub fn emit_typed<E: TypedEvent>(&self, event: &E) -> DispatchReport {
        self.publish(event.to_event())
    }

    /// Broadcast a prepared event to the current subscribers of its type
    pub fn publish(&self, event: DomainEvent) -> DispatchReport {
        // Snapshot so handlers can subscribe/unsubscribe while we dispatch.
        let targets: Vec<(SubscriptionId, Handler, Arc<AtomicBool>)> = self
            .inner
            .entries
            .lock()
            .iter()
            .filter(|e| e.event_type == event.event_type)
            .map(|e| (e.id, Arc::clone(&e.handler), Arc::clone(&e.active)))
            .collect();

        let mut report = DispatchReport::default();

        for (id, handler, active) in targets {
            // Removed by an earlier handler in this same dispatch
            if !active.load(Ordering::SeqCst) {
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        event_type = %event.event_type,
                        subscription = id.0,
                        error = %e,
                        "Event handler failed"
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    warn!(
                        event_type = %event.event_type,
                        subscription = id.0,
                        "Event handler panicked"
                    );
                }
            }
        }

        debug!(
            event_type = %event.event_type,
            delivered = report.delivered,
            failed = report.failed,
            "Event dispatched"
        );
        report
    }

    /// Number of live handlers for `event_type`
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.inner
            .entries
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Number of live handlers across all types
    pub fn total_subscribers(&self) -> usize {
        self.inner.entries.lock().len()
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    event_type: String,
    bus: Weak<BusInner>,
    detached: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Remove the handler. Safe to call on an already removed subscription.
    pub fn unsubscribe(&self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => inner.remove(self.id),
            None => false,
        }
    }

    /// Keep the handler registered for the lifetime of the bus
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.unsubscribe();
        }
    }
}
