//! # PayBridge Shared
//!
//! Common types used across all PayBridge crates: the error taxonomy, the
//! invoice model, domain events and configuration.

pub mod config;
pub mod error;
pub mod event;
pub mod fragment;
pub mod invoice;

// Re-exports
pub use config::*;
pub use error::*;
pub use event::*;
pub use fragment::*;
pub use invoice::*;
