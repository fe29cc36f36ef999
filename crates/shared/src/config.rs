//! Configuration types for PayBridge

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{FragmentDescriptor, PayBridgeError, UiFramework};

/// Default entry path exposed by every fragment
pub const DEFAULT_EXPOSED_PATH: &str = "remoteEntry.json";

/// Built-in fragments: (name, default port, framework)
const DEFAULT_FRAGMENTS: [(&str, u16, UiFramework); 4] = [
    ("invoice_app", 3001, UiFramework::Binding),
    ("payment_app", 3002, UiFramework::Tree),
    ("mrt_table_app", 3003, UiFramework::Tree),
    ("analysis_app", 3004, UiFramework::Tree),
];

/// Resolve `REACT_APP_<NAME>_URL`, falling back to `http://localhost:<port>/`.
///
/// The result always ends with a slash.
pub fn remote_url(
    app_name: &str,
    default_port: u16,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    let key = format!("REACT_APP_{}_URL", app_name.to_uppercase());
    match lookup(&key).filter(|v| !v.trim().is_empty()) {
        Some(url) if url.ends_with('/') => url,
        Some(url) => format!("{}/", url),
        None => format!("http://localhost:{}/", default_port),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Fragment registry configuration (fragments.json / fragments.yaml)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Public URL of the shell itself
    #[serde(default = "default_shell_url")]
    pub shell_url: String,

    /// Remote fragments
    pub fragments: Vec<FragmentDescriptor>,
}

fn default_shell_url() -> String {
    "http://localhost:3000/".to_string()
}

impl RegistryConfig {
    /// Load configuration from a JSON or YAML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in fragments with origins taken from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Built-in fragments with origins taken from `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fragments = DEFAULT_FRAGMENTS
            .iter()
            .map(|(name, port, framework)| {
                FragmentDescriptor::new(
                    *name,
                    remote_url(name, *port, &lookup),
                    DEFAULT_EXPOSED_PATH,
                    *framework,
                )
            })
            .collect();

        Self {
            shell_url: remote_url("shell", 3000, &lookup),
            fragments,
        }
    }

    /// Fragment names must be unique and non-empty
    pub fn validate(&self) -> crate::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for fragment in &self.fragments {
            if fragment.name.trim().is_empty() {
                return Err(PayBridgeError::Config("Fragment name must not be empty".to_string()));
            }
            if !seen.insert(fragment.name.as_str()) {
                return Err(PayBridgeError::Config(format!(
                    "Duplicate fragment '{}'",
                    fragment.name
                )));
            }
        }
        Ok(())
    }

    /// Get fragment names
    pub fn fragment_names(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Backend server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            cors_origins: (3000..=3004)
                .map(|port| format!("http://localhost:{}", port))
                .collect(),
        }
    }
}

impl BackendConfig {
    /// Read `PORT` and `CORS_ORIGINS` from the process environment
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| PayBridgeError::Config(format!("Invalid PORT '{}'", port)))?;
        }

        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(config)
    }
}

/// Backend facade configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Read `PAYBRIDGE_API_URL` from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("PAYBRIDGE_API_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Remote loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Upper bound for fetching and linking one entry
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}
