//! paybridge serve command

use backend::InMemoryInvoiceStore;
use clap::Args;
use shared::BackendConfig;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Backend settings from the environment, with the command line on top
    pub fn config(&self) -> anyhow::Result<BackendConfig> {
        let mut config = BackendConfig::from_env()?;
        if let Some(port) = self.port {
            config.port = port;
        }
        Ok(config)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let config = self.config()?;
        backend::serve(config, Arc::new(InMemoryInvoiceStore::seeded())).await?;
        Ok(())
    }
}
