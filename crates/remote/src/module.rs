//! ModuleHandle - The linked exports of a remote entry

use mount::UiFactory;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Zero-argument callable export
pub type Thunk = Arc<dyn Fn() -> Result<ExportValue, String> + Send + Sync>;

/// One exported value
#[derive(Clone)]
pub enum ExportValue {
    /// A UI factory, directly callable by the mount adapter
    Factory(UiFactory),
    /// A callable that produces another export when invoked
    Thunk(Thunk),
    /// A namespace object with its own named members
    Object(Vec<(String, ExportValue)>),
    /// Plain data
    Value(Value),
}

impl ExportValue {
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn() -> Result<ExportValue, String> + Send + Sync + 'static,
    {
        ExportValue::Thunk(Arc::new(f))
    }

    pub fn as_factory(&self) -> Option<&UiFactory> {
        match self {
            ExportValue::Factory(f) => Some(f),
            _ => None,
        }
    }

    /// Member `name` of an object export
    pub fn member(&self, name: &str) -> Option<&ExportValue> {
        match self {
            ExportValue::Object(members) => {
                members.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExportValue::Factory(_) => "factory",
            ExportValue::Thunk(_) => "thunk",
            ExportValue::Object(_) => "object",
            ExportValue::Value(_) => "value",
        }
    }
}

impl fmt::Debug for ExportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportValue::Factory(factory) => write!(f, "Factory({})", factory.name()),
            ExportValue::Thunk(_) => f.write_str("Thunk"),
            ExportValue::Object(members) => f
                .debug_map()
                .entries(members.iter().map(|(k, v)| (k, v)))
                .finish(),
            ExportValue::Value(v) => write!(f, "Value({})", v),
        }
    }
}

/// A loaded remote module
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    name: String,
    url: String,
    exports: Vec<(String, ExportValue)>,
}

impl ModuleHandle {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        exports: Vec<(String, ExportValue)>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            exports,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn export(&self, name: &str) -> Option<&ExportValue> {
        self.exports.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn default_export(&self) -> Option<&ExportValue> {
        self.export("default")
    }

    /// Exports in declaration order
    pub fn exports(&self) -> &[(String, ExportValue)] {
        &self.exports
    }

    pub fn export_names(&self) -> Vec<&str> {
        self.exports.iter().map(|(k, _)| k.as_str()).collect()
    }
}
