//! Bundled remotes - Components and entry manifests shipped with the shell
//!
//! Each bundled remote publishes its component in a different export shape,
//! the way independently built remotes do in practice.

use client::InvoiceApi;
use remote::{ComponentCatalog, ExportSpec, NamedExport, RemoteManifest, RemoteRegistry, StaticFetcher};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::fragments::{analytics_factory, invoice_list_factory, invoice_table_factory, payment_form_factory};

pub const INVOICE_LIST: &str = "invoice-list";
pub const PAYMENT_FORM: &str = "payment-form";
pub const INVOICE_TABLE: &str = "invoice-table";
pub const ANALYTICS_DASHBOARD: &str = "analytics-dashboard";

const MANIFEST_VERSION: &str = "1.0.0";

/// Components every bundled manifest can reference
pub fn bundled_catalog(api: Arc<dyn InvoiceApi>) -> ComponentCatalog {
    ComponentCatalog::new()
        .with(INVOICE_LIST, invoice_list_factory(Arc::clone(&api)))
        .with(PAYMENT_FORM, payment_form_factory(Arc::clone(&api)))
        .with(INVOICE_TABLE, invoice_table_factory(Arc::clone(&api)))
        .with(ANALYTICS_DASHBOARD, analytics_factory(api))
}

fn export(name: &str, spec: ExportSpec) -> NamedExport {
    NamedExport {
        name: name.to_string(),
        spec,
    }
}

fn factory(component: &str) -> ExportSpec {
    ExportSpec::Factory {
        component: component.to_string(),
    }
}

/// Entry manifest of a bundled remote
pub fn bundled_manifest(name: &str) -> Option<RemoteManifest> {
    let exports = match name {
        // default export is the component itself
        "payment_app" => vec![export("default", factory(PAYMENT_FORM))],
        // default export builds the component when called
        "invoice_app" => vec![export(
            "default",
            ExportSpec::Thunk {
                returns: Box::new(factory(INVOICE_LIST)),
            },
        )],
        // interop wrapper: default.default
        "analysis_app" => vec![export(
            "default",
            ExportSpec::Object {
                members: vec![export("default", factory(ANALYTICS_DASHBOARD))],
            },
        )],
        // named export only
        "mrt_table_app" => vec![
            export("version", ExportSpec::Value { value: json!(MANIFEST_VERSION) }),
            export("MrtTableApp", factory(INVOICE_TABLE)),
        ],
        _ => return None,
    };

    Some(RemoteManifest {
        name: name.to_string(),
        version: Some(MANIFEST_VERSION.to_string()),
        exports,
    })
}

/// Serve every bundled manifest at its registered entry URL
pub fn bundled_fetcher(registry: &RemoteRegistry) -> StaticFetcher {
    let fetcher = StaticFetcher::new();
    for descriptor in registry.fragments() {
        if let Some(manifest) = bundled_manifest(&descriptor.name) {
            let url = descriptor.entry_url();
            debug!(fragment = %descriptor.name, url = %url, "Bundled remote entry");
            fetcher.insert(url, manifest.to_json());
        }
    }
    fetcher
}
