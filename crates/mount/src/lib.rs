//! PayBridge Mount - Framework-agnostic fragment mounting
//!
//! Mounts tree-rendered and binding/digest fragments behind one interface,
//! with a teardown that releases everything a mount acquired.

mod adapter;
mod container;
mod context;
mod fragment;
mod instance;
mod runtime;
mod view;

pub use adapter::{FragmentMountAdapter, MountHandle};
pub use container::{Container, ContainerId};
pub use context::MountContext;
pub use fragment::{Fragment, Props, UiFactory};
pub use runtime::BindingModules;
pub use view::View;
