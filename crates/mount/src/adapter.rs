//! FragmentMountAdapter - Mounts fragments into containers and tears them down

use bus::EventBus;
use parking_lot::Mutex;
use serde_json::Value;
use shared::{ActionError, MountError, UiFramework};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::instance::{InstanceSlot, LiveInstance};
use crate::runtime::{self, BindingModules};
use crate::{Container, ContainerId, MountContext, Props, UiFactory};

/// Handle to a live mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountHandle {
    id: String,
    fragment: String,
    container: ContainerId,
    framework: UiFramework,
}

impl MountHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    pub fn framework(&self) -> UiFramework {
        self.framework
    }
}

struct MountEntry {
    handle: MountHandle,
    slot: Arc<InstanceSlot>,
}

#[derive(Default)]
struct MountTable {
    mounts: HashMap<String, MountEntry>,
    by_container: HashMap<ContainerId, String>,
}

impl MountTable {
    fn remove(&mut self, mount_id: &str) -> Option<MountEntry> {
        let entry = self.mounts.remove(mount_id)?;
        if self.by_container.get(&entry.handle.container).map(String::as_str) == Some(mount_id) {
            self.by_container.remove(&entry.handle.container);
        }
        Some(entry)
    }

    fn remove_in(&mut self, container: &ContainerId) -> Option<MountEntry> {
        let mount_id = self.by_container.get(container)?.clone();
        self.remove(&mount_id)
    }
}

/// Mounts fragment factories of either UI framework behind one interface.
///
/// At most one mount is live per container.
pub struct FragmentMountAdapter {
    bus: EventBus,
    modules: BindingModules,
    table: Mutex<MountTable>,
}

impl FragmentMountAdapter {
    /// Adapter using the process-wide binding module namespace
    pub fn new(bus: EventBus) -> Self {
        Self::with_modules(bus, BindingModules::global().clone())
    }

    pub fn with_modules(bus: EventBus, modules: BindingModules) -> Self {
        Self {
            bus,
            modules,
            table: Mutex::new(MountTable::default()),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Mount `factory` into `container`.
    ///
    /// A mount already live in the container is fully torn down first. If the
    /// factory or the initial render fails, everything created so far is
    /// released and the container is left empty.
    pub fn mount(
        &self,
        factory: &UiFactory,
        container: &Container,
        props: Props,
        framework: UiFramework,
    ) -> Result<MountHandle, MountError> {
        let previous = self.table.lock().remove_in(container.id());
        if let Some(previous) = previous {
            debug!(mount = %previous.handle.id, "Replacing existing mount");
            Self::dispose(previous);
        }

        let fragment_name = factory.name().to_string();
        let mut state = runtime::bootstrap(framework, &fragment_name, &self.modules)?;

        let mount_id = Uuid::new_v4().to_string();
        let slot = Arc::new(InstanceSlot::empty());
        let ctx = MountContext::new(
            mount_id.clone(),
            fragment_name.clone(),
            container.clone(),
            self.bus.clone(),
            Arc::downgrade(&slot),
        );

        let render_threw = |reason: String| MountError::RenderThrew {
            fragment: fragment_name.clone(),
            reason,
        };

        let built = catch_unwind(AssertUnwindSafe(|| factory.build(&props, &ctx)));
        let fragment = match built {
            Ok(Ok(fragment)) => fragment,
            Ok(Err(reason)) => {
                ctx.teardown();
                state.dispose();
                container.clear();
                warn!(fragment = %fragment_name, reason = %reason, "Fragment factory failed");
                return Err(render_threw(reason));
            }
            Err(payload) => {
                ctx.teardown();
                state.dispose();
                container.clear();
                let reason = panic_message(payload.as_ref());
                warn!(fragment = %fragment_name, reason = %reason, "Fragment factory panicked");
                return Err(render_threw(reason));
            }
        };

        let mut instance = LiveInstance {
            fragment,
            state,
            container: container.clone(),
            ctx: ctx.clone(),
        };

        let fragment_ref = &instance.fragment;
        let state_ref = &mut instance.state;
        let first_render = catch_unwind(AssertUnwindSafe(|| {
            state_ref.render(fragment_ref.as_ref(), container)
        }));
        if let Err(payload) = first_render {
            let reason = panic_message(payload.as_ref());
            warn!(fragment = %fragment_name, reason = %reason, "Initial render panicked");
            instance.dispose();
            return Err(render_threw(reason));
        }

        slot.install(instance);

        let handle = MountHandle {
            id: mount_id.clone(),
            fragment: fragment_name.clone(),
            container: container.id().clone(),
            framework,
        };

        let displaced = {
            let mut table = self.table.lock();
            let displaced = table.remove_in(container.id());
            table.by_container.insert(container.id().clone(), mount_id.clone());
            table.mounts.insert(
                mount_id.clone(),
                MountEntry {
                    handle: handle.clone(),
                    slot,
                },
            );
            displaced
        };
        if let Some(displaced) = displaced {
            Self::dispose(displaced);
            // the displaced teardown cleared the shared container
            self.refresh(&handle);
        }

        info!(
            fragment = %fragment_name,
            container = %container.id(),
            framework = %framework,
            mount = %mount_id,
            "Fragment mounted"
        );
        Ok(handle)
    }

    /// Tear down a mount. Returns false if it was already gone.
    pub fn unmount(&self, handle: &MountHandle) -> bool {
        let entry = self.table.lock().remove(&handle.id);
        match entry {
            Some(entry) => {
                Self::dispose(entry);
                info!(fragment = %handle.fragment, mount = %handle.id, "Fragment unmounted");
                true
            }
            None => false,
        }
    }

    /// Tear down every live mount
    pub fn unmount_all(&self) -> usize {
        let entries: Vec<MountEntry> = {
            let mut table = self.table.lock();
            table.by_container.clear();
            table.mounts.drain().map(|(_, e)| e).collect()
        };
        let count = entries.len();
        for entry in entries {
            Self::dispose(entry);
        }
        if count > 0 {
            info!(count, "All fragments unmounted");
        }
        count
    }

    /// Run a fragment action, then re-run change detection
    pub fn invoke(
        &self,
        handle: &MountHandle,
        action: &str,
        args: &Value,
    ) -> Result<Value, ActionError> {
        let slot = self
            .slot(&handle.id)
            .ok_or_else(|| ActionError::NotMounted(handle.id.clone()))?;

        let outcome = slot.with_instance(|instance| {
            let result = catch_unwind(AssertUnwindSafe(|| instance.fragment.invoke(action, args)));
            slot.mark_dirty();
            result
        });

        match outcome {
            None => Err(ActionError::NotMounted(handle.id.clone())),
            Some(Ok(result)) => result,
            Some(Err(payload)) => Err(ActionError::InvalidArgs {
                action: action.to_string(),
                reason: format!("handler panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }

    /// Re-run change detection for a mount
    pub fn refresh(&self, handle: &MountHandle) -> bool {
        match self.slot(&handle.id) {
            Some(slot) => {
                slot.request_render();
                true
            }
            None => false,
        }
    }

    /// Actions accepted by a live mount
    pub fn actions(&self, handle: &MountHandle) -> Option<Vec<&'static str>> {
        self.slot(&handle.id)?
            .with_instance(|instance| instance.fragment.actions())
    }

    /// Current model of a live mount
    pub fn model(&self, handle: &MountHandle) -> Option<Value> {
        self.slot(&handle.id)?
            .with_instance(|instance| instance.fragment.model())
    }

    pub fn is_live(&self, handle: &MountHandle) -> bool {
        self.table.lock().mounts.contains_key(&handle.id)
    }

    /// Live mount in `container`, if any
    pub fn mounted_in(&self, container: &ContainerId) -> Option<MountHandle> {
        let table = self.table.lock();
        let id = table.by_container.get(container)?;
        table.mounts.get(id).map(|e| e.handle.clone())
    }

    /// All live mounts, sorted by fragment name
    pub fn live_mounts(&self) -> Vec<MountHandle> {
        let mut handles: Vec<MountHandle> = self
            .table
            .lock()
            .mounts
            .values()
            .map(|e| e.handle.clone())
            .collect();
        handles.sort_by(|a, b| a.fragment.cmp(&b.fragment).then(a.id.cmp(&b.id)));
        handles
    }

    /// Live mounts grouped by framework
    pub fn mounts_by_framework(&self) -> HashMap<UiFramework, Vec<MountHandle>> {
        let mut grouped: HashMap<UiFramework, Vec<MountHandle>> = HashMap::new();
        for handle in self.live_mounts() {
            grouped.entry(handle.framework).or_default().push(handle);
        }
        grouped
    }

    pub fn mount_count(&self) -> usize {
        self.table.lock().mounts.len()
    }

    fn slot(&self, mount_id: &str) -> Option<Arc<InstanceSlot>> {
        self.table
            .lock()
            .mounts
            .get(mount_id)
            .map(|e| Arc::clone(&e.slot))
    }

    fn dispose(entry: MountEntry) {
        if let Some(instance) = entry.slot.take() {
            instance.dispose();
        }
    }
}

impl Drop for FragmentMountAdapter {
    fn drop(&mut self) {
        self.unmount_all();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
