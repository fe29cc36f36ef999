//! RemoteRegistry - Fragment descriptors keyed by name

use shared::{FragmentDescriptor, RegistryConfig, Result};
use std::path::Path;

/// Read-only lookup of configured fragments
#[derive(Debug, Clone, Default)]
pub struct RemoteRegistry {
    fragments: Vec<FragmentDescriptor>,
}

impl RemoteRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fragments: config.fragments,
        })
    }

    /// Built-in fragments with origins from the environment
    pub fn from_env() -> Self {
        Self {
            fragments: RegistryConfig::from_env().fragments,
        }
    }

    /// Fragments from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(RegistryConfig::from_file(path)?)
    }

    pub fn get(&self, name: &str) -> Option<&FragmentDescriptor> {
        self.fragments.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Descriptors in configuration order
    pub fn fragments(&self) -> &[FragmentDescriptor] {
        &self.fragments
    }

    pub fn names(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
