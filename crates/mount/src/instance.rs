//! Live instance - a fragment together with its runtime state

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use crate::runtime::RuntimeState;
use crate::{Container, Fragment, MountContext};

pub(crate) struct LiveInstance {
    pub(crate) fragment: Box<dyn Fragment>,
    pub(crate) state: Box<dyn RuntimeState>,
    pub(crate) container: Container,
    pub(crate) ctx: MountContext,
}

impl LiveInstance {
    /// Run change detection; a panicking render leaves the old content
    pub(crate) fn render(&mut self) -> bool {
        let fragment = &self.fragment;
        let state = &mut self.state;
        let container = &self.container;
        match catch_unwind(AssertUnwindSafe(|| state.render(fragment.as_ref(), container))) {
            Ok(rendered) => rendered,
            Err(_) => {
                warn!(fragment = %self.ctx.fragment(), "Render panicked, keeping previous view");
                false
            }
        }
    }

    /// Release everything the mount owns and empty the container
    pub(crate) fn dispose(mut self) {
        self.ctx.teardown();
        if catch_unwind(AssertUnwindSafe(|| self.fragment.on_unmount())).is_err() {
            warn!(fragment = %self.ctx.fragment(), "Unmount hook panicked");
        }
        self.state.dispose();
        self.container.clear();
    }
}

/// Holder of one live instance, with deferred re-render requests.
///
/// A render requested while the instance is busy (for example from inside
/// an action handler) is run by whoever releases the lock.
pub(crate) struct InstanceSlot {
    inner: Mutex<Option<LiveInstance>>,
    pending: AtomicBool,
}

impl InstanceSlot {
    pub(crate) fn empty() -> Self {
        Self {
            inner: Mutex::new(None),
            pending: AtomicBool::new(false),
        }
    }

    /// Install the instance and run any render requested while it was being built
    pub(crate) fn install(&self, instance: LiveInstance) {
        *self.inner.lock() = Some(instance);
        self.flush();
    }

    pub(crate) fn take(&self) -> Option<LiveInstance> {
        self.pending.store(false, Ordering::SeqCst);
        self.inner.lock().take()
    }

    /// Run `f` against the live instance, then flush pending renders
    pub(crate) fn with_instance<R>(&self, f: impl FnOnce(&mut LiveInstance) -> R) -> Option<R> {
        let result = {
            let mut guard = self.inner.lock();
            guard.as_mut().map(f)
        };
        self.flush();
        result
    }

    pub(crate) fn request_render(&self) {
        self.pending.store(true, Ordering::SeqCst);
        self.flush();
    }

    pub(crate) fn mark_dirty(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    fn flush(&self) {
        while self.pending.load(Ordering::SeqCst) {
            let Some(mut guard) = self.inner.try_lock() else {
                return;
            };
            // keep the request until an instance is installed
            let Some(instance) = guard.as_mut() else {
                return;
            };
            self.pending.store(false, Ordering::SeqCst);
            instance.render();
        }
    }
}
