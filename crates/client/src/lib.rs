//! PayBridge Client - Backend facade used by the fragments

mod api;
mod filter;
mod monitor;

pub use api::{HealthStatus, InvoiceApi, InvoiceClient};
pub use filter::{filter_invoices, is_overdue, status_class};
pub use monitor::{ConnectionMonitor, LinkState, MonitorConfig};
