//! MountContext - Per-mount resources handed to a fragment

use bus::{EventBus, HandlerError, Subscription};
use parking_lot::Mutex;
use shared::{DomainEvent, TypedEvent};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::instance::InstanceSlot;
use crate::Container;

struct ContextInner {
    mount_id: String,
    fragment: String,
    container: Container,
    bus: EventBus,
    tasks: Mutex<Vec<AbortHandle>>,
    subscriptions: Mutex<Vec<Subscription>>,
    slot: Weak<InstanceSlot>,
    closed: AtomicBool,
}

/// Resources scoped to one mount.
///
/// Tasks spawned and subscriptions taken through the context are released
/// when the mount is torn down. Bus handlers must call
/// [`MountContext::request_render`] after changing state so the owning
/// runtime runs its change detection.
#[derive(Clone)]
pub struct MountContext {
    inner: Arc<ContextInner>,
}

impl MountContext {
    pub(crate) fn new(
        mount_id: String,
        fragment: String,
        container: Container,
        bus: EventBus,
        slot: Weak<InstanceSlot>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                mount_id,
                fragment,
                container,
                bus,
                tasks: Mutex::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                slot,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.inner.mount_id
    }

    pub fn fragment(&self) -> &str {
        &self.inner.fragment
    }

    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// False once the mount has been torn down
    pub fn is_live(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }

    /// Run `future` on the current tokio runtime, aborted on unmount.
    ///
    /// Returns false when the mount is gone or no runtime is available.
    pub fn spawn<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(fragment = %self.inner.fragment, "No async runtime, task not started");
            return false;
        };

        let mut tasks = self.inner.tasks.lock();
        if !self.is_live() {
            return false;
        }
        tasks.retain(|t| !t.is_finished());
        tasks.push(runtime.spawn(future).abort_handle());
        true
    }

    /// Subscribe on the bus for the lifetime of this mount
    pub fn subscribe<F>(&self, event_type: &str, handler: F) -> bool
    where
        F: Fn(&DomainEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut subscriptions = self.inner.subscriptions.lock();
        if !self.is_live() {
            return false;
        }
        subscriptions.push(self.inner.bus.subscribe(event_type, handler));
        true
    }

    /// Typed variant of [`MountContext::subscribe`]
    pub fn subscribe_typed<E, F>(&self, handler: F) -> bool
    where
        E: TypedEvent + 'static,
        F: Fn(E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut subscriptions = self.inner.subscriptions.lock();
        if !self.is_live() {
            return false;
        }
        subscriptions.push(self.inner.bus.subscribe_typed::<E, F>(handler));
        true
    }

    /// Ask the owning runtime to re-run change detection
    pub fn request_render(&self) {
        if !self.is_live() {
            return;
        }
        if let Some(slot) = self.inner.slot.upgrade() {
            slot.request_render();
        }
    }

    /// Abort tasks and drop subscriptions. Safe to call more than once.
    pub(crate) fn teardown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let tasks: Vec<AbortHandle> = self.inner.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        let subscriptions: Vec<Subscription> = self.inner.subscriptions.lock().drain(..).collect();
        let released = subscriptions.len();
        drop(subscriptions);

        debug!(
            mount = %self.inner.mount_id,
            tasks = tasks.len(),
            subscriptions = released,
            "Mount context released"
        );
    }
}

impl std::fmt::Debug for MountContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountContext")
            .field("mount_id", &self.inner.mount_id)
            .field("fragment", &self.inner.fragment)
            .field("live", &self.is_live())
            .finish()
    }
}
