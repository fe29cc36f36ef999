//! Framework runtimes - tree rendering and binding/digest rendering

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::Value;
use shared::{MountError, UiFramework};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::{Container, Fragment};

static GLOBAL_MODULES: Lazy<BindingModules> = Lazy::new(BindingModules::new);
static MODULE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-wide namespace of binding application modules.
///
/// Every binding mount registers a module under a name that is never
/// reused, so remounting a fragment cannot collide with an earlier mount.
#[derive(Debug, Clone, Default)]
pub struct BindingModules {
    names: Arc<Mutex<HashSet<String>>>,
}

impl BindingModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static BindingModules {
        &GLOBAL_MODULES
    }

    /// Fresh module name for `fragment`
    pub fn next_name(fragment: &str) -> String {
        format!("{}_{}", fragment, MODULE_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    pub fn register(&self, name: &str) -> Result<(), MountError> {
        if !self.names.lock().insert(name.to_string()) {
            return Err(MountError::ModuleConflict(name.to_string()));
        }
        debug!(module = name, "Binding module registered");
        Ok(())
    }

    pub fn deregister(&self, name: &str) -> bool {
        self.names.lock().remove(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.lock().contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runtime-specific state of one mount
pub(crate) trait RuntimeState: Send {
    /// Bring the container up to date; returns whether it was rewritten
    fn render(&mut self, fragment: &dyn Fragment, container: &Container) -> bool;

    /// Release runtime resources
    fn dispose(&mut self);
}

/// Create runtime state for a new mount of `fragment`
pub(crate) fn bootstrap(
    framework: UiFramework,
    fragment: &str,
    modules: &BindingModules,
) -> Result<Box<dyn RuntimeState>, MountError> {
    match framework {
        UiFramework::Tree => Ok(Box::new(TreeRoot)),
        UiFramework::Binding => {
            let module = BindingModules::next_name(fragment);
            modules.register(&module)?;
            Ok(Box::new(BindingScope {
                module,
                modules: modules.clone(),
                last_model: None,
                destroyed: false,
            }))
        }
    }
}

/// Tree runtime: every render replaces the root
struct TreeRoot;

impl RuntimeState for TreeRoot {
    fn render(&mut self, fragment: &dyn Fragment, container: &Container) -> bool {
        container.set_content(fragment.render());
        true
    }

    fn dispose(&mut self) {}
}

/// Binding runtime: a digest cycle that only re-renders when the model changed.
///
/// A fragment without a model (`null`) is treated as always dirty.
struct BindingScope {
    module: String,
    modules: BindingModules,
    last_model: Option<Value>,
    destroyed: bool,
}

impl RuntimeState for BindingScope {
    fn render(&mut self, fragment: &dyn Fragment, container: &Container) -> bool {
        if self.destroyed {
            return false;
        }

        let model = fragment.model();
        let clean = !model.is_null()
            && !container.is_empty()
            && self.last_model.as_ref() == Some(&model);
        if clean {
            return false;
        }

        container.set_content(fragment.render());
        self.last_model = Some(model);
        true
    }

    fn dispose(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.modules.deregister(&self.module);
            debug!(module = %self.module, "Binding scope destroyed");
        }
    }
}
