//! PayBridge Shell - Route table, built-in fragments and fragment hosting
//!
//! The shell resolves a route to a fragment, loads and normalizes its remote
//! module, mounts it into the outlet, and falls back to a static invoice
//! table when the remote cannot be loaded.

pub mod catalog;
pub mod fragments;
mod host;
pub mod payment;
mod routes;
mod shell;

pub use catalog::{bundled_catalog, bundled_fetcher, bundled_manifest};
pub use host::{FragmentHost, HostState};
pub use payment::{format_card_number, format_expiry, transaction_id, FieldErrors, PaymentForm};
pub use routes::{Route, RouteTable};
pub use shell::{EntrySource, Shell, ShellConfig, OUTLET_ID};
