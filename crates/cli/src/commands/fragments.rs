//! paybridge fragments command

use clap::{Args, Subcommand};
use client::InvoiceApi;
use console::style;
use remote::{EntryFetcher, EntryRegistry, ExportNormalizer, HttpFetcher, ManifestLinker, RemoteLoader, RemoteRegistry};
use shared::PayBridgeError;
use shell::{bundled_catalog, bundled_fetcher, EntrySource};
use std::sync::Arc;

use super::GlobalOpts;

#[derive(Debug, Args)]
pub struct FragmentsCommand {
    #[command(subcommand)]
    pub command: FragmentsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum FragmentsSubcommand {
    /// List configured fragments
    List {
        /// Load each fragment and report which component it exposes
        #[arg(long)]
        check: bool,
    },
}

/// Result of loading one fragment
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentCheck {
    pub fragment: String,
    /// Component name, or the reason loading failed
    pub outcome: Result<String, String>,
}

impl FragmentsCommand {
    pub async fn run(&self, opts: &GlobalOpts, api: Arc<dyn InvoiceApi>) -> anyhow::Result<()> {
        let registry = RemoteRegistry::new(opts.registry_config()?)?;

        match &self.command {
            FragmentsSubcommand::List { check: false } => {
                for descriptor in registry.fragments() {
                    println!(
                        "{:<16} {:<8} {}",
                        descriptor.name,
                        descriptor.ui_framework.to_string(),
                        descriptor.entry_url()
                    );
                }
            }
            FragmentsSubcommand::List { check: true } => {
                let fetcher: Arc<dyn EntryFetcher> = match EntrySource::from(opts.remotes) {
                    EntrySource::Bundled => Arc::new(bundled_fetcher(&registry)),
                    EntrySource::Http => Arc::new(HttpFetcher::new(shared::LoaderConfig::default().timeout)?),
                };
                for result in check_fragments(&registry, fetcher, api).await {
                    match result.outcome {
                        Ok(component) => println!("{} {:<16} {}", style("✓").green(), result.fragment, component),
                        Err(reason) => println!("{} {:<16} {}", style("✗").red(), result.fragment, reason),
                    }
                }
            }
        }
        Ok(())
    }
}

/// Load and normalize every registered fragment without mounting it
pub async fn check_fragments(
    registry: &RemoteRegistry,
    fetcher: Arc<dyn EntryFetcher>,
    api: Arc<dyn InvoiceApi>,
) -> Vec<FragmentCheck> {
    let linker = ManifestLinker::new(bundled_catalog(api));
    let loader = RemoteLoader::new(fetcher, Arc::new(linker)).with_entries(EntryRegistry::new());
    let normalizer = ExportNormalizer::new();

    let mut checks = Vec::with_capacity(registry.len());
    for descriptor in registry.fragments() {
        let outcome = async {
            let module = loader.load(descriptor).await?;
            let factory = normalizer.normalize(&module)?;
            Ok::<_, PayBridgeError>(factory.name().to_string())
        }
        .await
        .map_err(|e| e.to_string());

        checks.push(FragmentCheck {
            fragment: descriptor.name.clone(),
            outcome,
        });
    }
    checks
}
