//! Container - A mount point for fragment output

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::View;

/// Identifier of a container, unique within a shell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct ContainerState {
    content: Option<View>,
    renders: u64,
}

/// Shared reference to a mount point.
///
/// Clones refer to the same node, like two references to one DOM element.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    state: Arc<RwLock<ContainerState>>,
}

impl Container {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ContainerId::new(id),
            state: Arc::new(RwLock::new(ContainerState::default())),
        }
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Current rendered content
    pub fn content(&self) -> Option<View> {
        self.state.read().content.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().content.is_none()
    }

    /// How many times content has been written
    pub fn render_count(&self) -> u64 {
        self.state.read().renders
    }

    pub(crate) fn set_content(&self, view: View) {
        let mut state = self.state.write();
        state.content = Some(view);
        state.renders += 1;
    }

    /// Remove whatever is shown
    pub fn clear(&self) {
        self.state.write().content = None;
    }

    /// Show static content that is not owned by any fragment (fallbacks)
    pub fn show_static(&self, view: View) {
        self.set_content(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_content() {
        let a = Container::new("outlet");
        let b = a.clone();

        a.set_content(View::text("hello"));
        assert_eq!(b.content(), Some(View::text("hello")));
        assert_eq!(b.render_count(), 1);

        b.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn test_container_id_display() {
        let c = Container::new("main-outlet");
        assert_eq!(c.id().to_string(), "main-outlet");
        assert_eq!(c.id().as_str(), "main-outlet");
    }
}
