//! PayBridge Backend - Mock invoice API
//!
//! Serves the seeded invoice store over HTTP:
//! - `GET /api/invoices?status=` - list, filtered server-side
//! - `GET /api/invoices/:id` - one invoice
//! - `POST /api/invoices/:id/paid` - mark paid
//! - `GET /health`, `GET /api/health` - liveness

mod routes;
mod seed;
mod server;
mod store;

pub use routes::{cors_layer, router, AppState};
pub use seed::seed_invoices;
pub use server::{serve, serve_on};
pub use store::{InMemoryInvoiceStore, InvoiceStore, StoreError};
