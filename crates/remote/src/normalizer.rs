//! ExportNormalizer - Reduce a module's exports to a single UI factory

use mount::UiFactory;
use shared::NormalizeError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::{ExportValue, ModuleHandle};

/// One way of finding a factory in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// `default` is itself a factory
    DirectDefault,
    /// `default` is an object whose `default` member is a factory
    NestedDefault,
    /// `default` is a zero-argument callable returning a factory
    FactoryOfFactory,
    /// A named export: the fragment's own name first, then the first usable one
    NamedScan,
}

impl ExtractionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionStrategy::DirectDefault => "default",
            ExtractionStrategy::NestedDefault => "default.default",
            ExtractionStrategy::FactoryOfFactory => "default()",
            ExtractionStrategy::NamedScan => "named export",
        }
    }

    pub fn extract(&self, module: &ModuleHandle) -> Option<UiFactory> {
        match self {
            ExtractionStrategy::DirectDefault => module.default_export()?.as_factory().cloned(),
            ExtractionStrategy::NestedDefault => module
                .default_export()?
                .member("default")?
                .as_factory()
                .cloned(),
            ExtractionStrategy::FactoryOfFactory => match module.default_export()? {
                ExportValue::Thunk(thunk) => {
                    let produced = catch_unwind(AssertUnwindSafe(|| (**thunk)()));
                    match produced {
                        Ok(Ok(value)) => usable_factory(&value),
                        Ok(Err(reason)) => {
                            warn!(module = %module.name(), reason = %reason, "Default export call failed");
                            None
                        }
                        Err(_) => {
                            warn!(module = %module.name(), "Default export call panicked");
                            None
                        }
                    }
                }
                _ => None,
            },
            ExtractionStrategy::NamedScan => {
                let named = || module.exports().iter().filter(|(k, _)| k != "default");
                let preferred = conventional_names(module.name());
                named()
                    .filter(|(k, _)| preferred.iter().any(|p| p == k))
                    .find_map(|(_, v)| usable_factory(v))
                    .or_else(|| named().find_map(|(_, v)| usable_factory(v)))
            }
        }
    }
}

/// A factory, or an object carrying one as its `default`
fn usable_factory(value: &ExportValue) -> Option<UiFactory> {
    match value {
        ExportValue::Factory(f) => Some(f.clone()),
        ExportValue::Object(_) => value.member("default")?.as_factory().cloned(),
        _ => None,
    }
}

/// `payment_app` -> [`payment_app`, `PaymentApp`]
fn conventional_names(module: &str) -> Vec<String> {
    let pascal: String = module
        .split(|c: char| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    vec![module.to_string(), pascal]
}

/// Applies extraction strategies in order until one yields a factory
#[derive(Debug, Clone)]
pub struct ExportNormalizer {
    chain: Vec<ExtractionStrategy>,
}

impl Default for ExportNormalizer {
    fn default() -> Self {
        Self {
            chain: vec![
                ExtractionStrategy::DirectDefault,
                ExtractionStrategy::NestedDefault,
                ExtractionStrategy::FactoryOfFactory,
                ExtractionStrategy::NamedScan,
            ],
        }
    }
}

impl ExportNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(chain: Vec<ExtractionStrategy>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &[ExtractionStrategy] {
        &self.chain
    }

    pub fn normalize(&self, module: &ModuleHandle) -> Result<UiFactory, NormalizeError> {
        for strategy in &self.chain {
            if let Some(factory) = strategy.extract(module) {
                debug!(
                    module = %module.name(),
                    strategy = strategy.name(),
                    factory = %factory.name(),
                    "Resolved UI factory"
                );
                return Ok(factory);
            }
        }

        let err = NormalizeError::NoCallableExportFound {
            module: module.name().to_string(),
            tried: self.chain.iter().map(|s| s.name().to_string()).collect(),
        };
        warn!(error = %err, exports = ?module.export_names(), "No usable export");
        Err(err)
    }
}
