//! Fragment descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// UI framework a fragment is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiFramework {
    /// Declarative render-tree framework
    Tree,
    /// Two-way-binding framework with scopes and digest cycles
    Binding,
}

impl fmt::Display for UiFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiFramework::Tree => f.write_str("tree"),
            UiFramework::Binding => f.write_str("binding"),
        }
    }
}

/// Where a fragment lives and how to mount it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentDescriptor {
    /// Unique key
    pub name: String,
    /// Base URL the fragment is deployed under
    pub remote_origin: String,
    /// Entry path relative to the origin
    pub exposed_path: String,
    pub ui_framework: UiFramework,
}

impl FragmentDescriptor {
    pub fn new(
        name: impl Into<String>,
        remote_origin: impl Into<String>,
        exposed_path: impl Into<String>,
        ui_framework: UiFramework,
    ) -> Self {
        Self {
            name: name.into(),
            remote_origin: remote_origin.into(),
            exposed_path: exposed_path.into(),
            ui_framework,
        }
    }

    /// `${remoteOrigin}${exposedPath}` with exactly one slash between them
    pub fn entry_url(&self) -> String {
        let origin = self.remote_origin.trim_end_matches('/');
        let path = self
            .exposed_path
            .trim_start_matches("./")
            .trim_start_matches('/');
        format!("{}/{}", origin, path)
    }
}
