//! Manifest linking - Turn entry source into a module of exports
//!
//! A remote entry is a JSON manifest describing its exports. Factory
//! exports name a component that must be present in the host's
//! [`ComponentCatalog`]:
//!
//! ```json
//! {
//!   "name": "payment_app",
//!   "exports": [
//!     { "name": "default", "kind": "factory", "component": "payment-form" },
//!     { "name": "version", "kind": "value", "value": "1.0.0" }
//!   ]
//! }
//! ```

use mount::UiFactory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::LoadError;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{ExportValue, ModuleHandle};

/// Turns fetched entry bytes into a module
pub trait ModuleLinker: Send + Sync {
    fn link(&self, url: &str, source: &[u8]) -> Result<ModuleHandle, LoadError>;
}

/// Declared shape of one export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExportSpec {
    Factory { component: String },
    Thunk { returns: Box<ExportSpec> },
    Object { members: Vec<NamedExport> },
    Value { value: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedExport {
    pub name: String,
    #[serde(flatten)]
    pub spec: ExportSpec,
}

/// A remote entry manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub exports: Vec<NamedExport>,
}

impl RemoteManifest {
    pub fn parse(url: &str, source: &[u8]) -> Result<Self, LoadError> {
        serde_json::from_slice(source).map_err(|e| LoadError::ParseFailure {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Components the host knows how to build, keyed by component id
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    components: HashMap<String, UiFactory>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, factory: UiFactory) {
        self.components.insert(id.into(), factory);
    }

    pub fn with(mut self, id: impl Into<String>, factory: UiFactory) -> Self {
        self.register(id, factory);
        self
    }

    pub fn get(&self, id: &str) -> Option<&UiFactory> {
        self.components.get(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.components.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Links JSON manifests against a component catalog
#[derive(Debug, Clone)]
pub struct ManifestLinker {
    catalog: Arc<ComponentCatalog>,
}

impl ManifestLinker {
    pub fn new(catalog: ComponentCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    fn resolve(&self, url: &str, spec: &ExportSpec) -> Result<ExportValue, LoadError> {
        match spec {
            ExportSpec::Factory { component } => self
                .catalog
                .get(component)
                .cloned()
                .map(ExportValue::Factory)
                .ok_or_else(|| LoadError::ParseFailure {
                    url: url.to_string(),
                    reason: format!("Unresolved component '{}'", component),
                }),
            ExportSpec::Thunk { returns } => {
                let inner = self.resolve(url, returns)?;
                Ok(ExportValue::thunk(move || Ok(inner.clone())))
            }
            ExportSpec::Object { members } => {
                let members = members
                    .iter()
                    .map(|m| Ok((m.name.clone(), self.resolve(url, &m.spec)?)))
                    .collect::<Result<Vec<_>, LoadError>>()?;
                Ok(ExportValue::Object(members))
            }
            ExportSpec::Value { value } => Ok(ExportValue::Value(value.clone())),
        }
    }
}

impl ModuleLinker for ManifestLinker {
    fn link(&self, url: &str, source: &[u8]) -> Result<ModuleHandle, LoadError> {
        let manifest = RemoteManifest::parse(url, source)?;
        let exports = manifest
            .exports
            .iter()
            .map(|e| Ok((e.name.clone(), self.resolve(url, &e.spec)?)))
            .collect::<Result<Vec<_>, LoadError>>()?;
        Ok(ModuleHandle::new(manifest.name, url, exports))
    }
}
