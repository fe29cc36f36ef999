//! CLI Commands

pub mod fragments;
pub mod invoices;
pub mod serve;
pub mod theme;

pub use fragments::FragmentsCommand;
pub use invoices::InvoicesCommand;
pub use serve::ServeCommand;
pub use theme::ThemeCommand;

use clap::{Args, ValueEnum};
use client::InvoiceClient;
use shared::{ClientConfig, RegistryConfig};
use shell::{EntrySource, ShellConfig};
use std::path::PathBuf;

/// Where fragment entries come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RemoteSource {
    /// Entries compiled into the binary
    Bundled,
    /// Entries fetched from the configured origins
    Http,
}

impl From<RemoteSource> for EntrySource {
    fn from(source: RemoteSource) -> Self {
        match source {
            RemoteSource::Bundled => EntrySource::Bundled,
            RemoteSource::Http => EntrySource::Http,
        }
    }
}

/// Options shared by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Invoice API base URL (overrides PAYBRIDGE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where fragment entries are loaded from
    #[arg(long, value_enum, global = true, default_value_t = RemoteSource::Bundled)]
    pub remotes: RemoteSource,

    /// Fragment registry file (JSON or YAML) instead of the environment
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// File holding persisted preferences
    #[arg(long, global = true, default_value = ".paybridge/settings.json")]
    pub settings: PathBuf,
}

impl GlobalOpts {
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::from_env();
        match &self.api_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        }
    }

    pub fn invoice_client(&self) -> anyhow::Result<InvoiceClient> {
        Ok(InvoiceClient::new(&self.client_config())?)
    }

    pub fn registry_config(&self) -> anyhow::Result<RegistryConfig> {
        match &self.registry {
            Some(path) => Ok(RegistryConfig::from_file(path)?),
            None => Ok(RegistryConfig::from_env()),
        }
    }

    pub fn shell_config(&self) -> anyhow::Result<ShellConfig> {
        Ok(ShellConfig::new(self.registry_config()?).with_source(self.remotes.into()))
    }
}
