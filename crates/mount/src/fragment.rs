//! Fragment - The component contract every remote exposes

use serde_json::{Map, Value};
use shared::ActionError;
use std::fmt;
use std::sync::Arc;

use crate::{MountContext, View};

/// Initial properties handed to a fragment factory
pub type Props = Map<String, Value>;

/// A live UI component owned by one mount
pub trait Fragment: Send {
    /// Produce the current view
    fn render(&self) -> View;

    /// Observable state used by binding runtimes for dirty checking
    fn model(&self) -> Value {
        Value::Null
    }

    /// Actions this fragment accepts through [`Fragment::invoke`]
    fn actions(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Handle a user action
    fn invoke(&mut self, action: &str, _args: &Value) -> Result<Value, ActionError> {
        Err(ActionError::UnknownAction(action.to_string()))
    }

    /// Called once, before the container is cleared
    fn on_unmount(&mut self) {}
}

type BuildFn =
    dyn Fn(&Props, &MountContext) -> Result<Box<dyn Fragment>, String> + Send + Sync;

/// The single callable a fragment module resolves to
#[derive(Clone)]
pub struct UiFactory {
    name: String,
    build: Arc<BuildFn>,
}

impl UiFactory {
    pub fn new<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Props, &MountContext) -> Result<Box<dyn Fragment>, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            build: Arc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether two handles point at the same factory
    pub fn same_as(&self, other: &UiFactory) -> bool {
        Arc::ptr_eq(&self.build, &other.build)
    }

    pub(crate) fn build(&self, props: &Props, ctx: &MountContext) -> Result<Box<dyn Fragment>, String> {
        (self.build)(props, ctx)
    }
}

impl fmt::Debug for UiFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiFactory").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hello;

    impl Fragment for Hello {
        fn render(&self) -> View {
            View::text("hello")
        }
    }

    #[test]
    fn test_default_invoke_is_unknown_action() {
        let mut fragment = Hello;
        let err = fragment.invoke("pay", &Value::Null).unwrap_err();
        assert_eq!(err, ActionError::UnknownAction("pay".to_string()));
        assert!(fragment.actions().is_empty());
        assert_eq!(fragment.model(), Value::Null);
    }

    #[test]
    fn test_factory_identity() {
        let a = UiFactory::new("hello", |_, _| Ok(Box::new(Hello) as Box<dyn Fragment>));
        let b = a.clone();
        let c = UiFactory::new("hello", |_, _| Ok(Box::new(Hello) as Box<dyn Fragment>));

        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
        assert_eq!(format!("{:?}", a), "UiFactory { name: \"hello\" }");
    }
}
