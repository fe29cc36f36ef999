//! # PayBridge Bus
//!
//! Cross-fragment event bus and the theme preference that rides on it.

mod event_bus;
mod theme;

pub use event_bus::{DispatchReport, EventBus, HandlerError, Subscription, SubscriptionId};
pub use theme::{FileStorage, KeyValueStorage, MemoryStorage, ThemeController, THEME_STORAGE_KEY};
