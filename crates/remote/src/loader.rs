//! RemoteLoader - Fetch, link and cache remote entries

use shared::{FragmentDescriptor, LoadError, LoaderConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{EntryFetcher, EntryRegistry, ModuleHandle, ModuleLinker};

/// Loads the module behind a fragment descriptor.
///
/// Successful entries are cached by URL in the [`EntryRegistry`], so a
/// second load of the same descriptor does not touch the network. Loads
/// are never retried here.
pub struct RemoteLoader {
    fetcher: Arc<dyn EntryFetcher>,
    linker: Arc<dyn ModuleLinker>,
    entries: EntryRegistry,
    config: LoaderConfig,
}

impl RemoteLoader {
    /// Loader backed by the process-wide entry registry
    pub fn new(fetcher: Arc<dyn EntryFetcher>, linker: Arc<dyn ModuleLinker>) -> Self {
        Self {
            fetcher,
            linker,
            entries: EntryRegistry::global().clone(),
            config: LoaderConfig::default(),
        }
    }

    pub fn with_entries(mut self, entries: EntryRegistry) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entries(&self) -> &EntryRegistry {
        &self.entries
    }

    pub async fn load(&self, descriptor: &FragmentDescriptor) -> Result<ModuleHandle, LoadError> {
        let url = descriptor.entry_url();

        if let Some(source) = self.entries.get(&url) {
            debug!(fragment = %descriptor.name, url = %url, "Remote entry already loaded");
            return self.linker.link(&url, &source);
        }

        let timeout = self.config.timeout;
        let source = match tokio::time::timeout(timeout, self.fetcher.fetch(&url)).await {
            Ok(Ok(source)) => source,
            Ok(Err(e)) => {
                warn!(fragment = %descriptor.name, error = %e, "Remote entry failed to load");
                return Err(e);
            }
            Err(_) => {
                let err = LoadError::Timeout {
                    url: url.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                };
                warn!(fragment = %descriptor.name, error = %err, "Remote entry failed to load");
                return Err(err);
            }
        };

        let module = self.linker.link(&url, &source).map_err(|e| {
            warn!(fragment = %descriptor.name, error = %e, "Remote entry failed to link");
            e
        })?;

        self.entries.insert(url.clone(), Arc::from(source));
        info!(
            fragment = %descriptor.name,
            url = %url,
            exports = module.exports().len(),
            "Remote entry loaded"
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentCatalog, ManifestLinker, StaticFetcher};
    use mount::{Fragment, UiFactory, View};
    use shared::{LoadErrorKind, UiFramework};
    use std::time::Duration;

    const ENTRY: &str = "http://localhost:3002/remoteEntry.json";
    const MANIFEST: &str =
        r#"{"name": "payment_app", "exports": [{"name": "default", "kind": "factory", "component": "payment-form"}]}"#;

    struct Blank;
    impl Fragment for Blank {
        fn render(&self) -> View {
            View::text("")
        }
    }

    fn linker() -> Arc<ManifestLinker> {
        let factory = UiFactory::new("payment-form", |_, _| Ok(Box::new(Blank) as Box<dyn Fragment>));
        Arc::new(ManifestLinker::new(ComponentCatalog::new().with("payment-form", factory)))
    }

    fn descriptor() -> FragmentDescriptor {
        FragmentDescriptor::new(
            "payment_app",
            "http://localhost:3002/",
            "remoteEntry.json",
            UiFramework::Tree,
        )
    }

    #[tokio::test]
    async fn test_load_caches_successful_entry() {
        let fetcher = Arc::new(StaticFetcher::new().with_entry(ENTRY, MANIFEST));
        let loader = RemoteLoader::new(fetcher.clone(), linker()).with_entries(EntryRegistry::new());

        let first = loader.load(&descriptor()).await.unwrap();
        let second = loader.load(&descriptor()).await.unwrap();

        assert_eq!(first.name(), "payment_app");
        assert_eq!(second.url(), ENTRY);
        assert_eq!(fetcher.request_count(), 1);
        assert!(loader.entries().contains(ENTRY));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let fetcher = Arc::new(StaticFetcher::new());
        let loader = RemoteLoader::new(fetcher.clone(), linker()).with_entries(EntryRegistry::new());

        let err = loader.load(&descriptor()).await.unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Unreachable);
        assert!(loader.entries().is_empty());

        fetcher.insert(ENTRY, MANIFEST);
        assert!(loader.load(&descriptor()).await.is_ok());
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_is_not_cached() {
        let fetcher = Arc::new(StaticFetcher::new().with_entry(ENTRY, "not json"));
        let loader = RemoteLoader::new(fetcher, linker()).with_entries(EntryRegistry::new());

        let err = loader.load(&descriptor()).await.unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::ParseFailure);
        assert!(loader.entries().is_empty());
    }

    #[tokio::test]
    async fn test_slow_entry_times_out() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_entry(ENTRY, MANIFEST)
                .with_delay(Duration::from_millis(500)),
        );
        let loader = RemoteLoader::new(fetcher, linker())
            .with_entries(EntryRegistry::new())
            .with_config(LoaderConfig {
                timeout: Duration::from_millis(20),
            });

        let err = loader.load(&descriptor()).await.unwrap_err();
        assert_eq!(
            err,
            LoadError::Timeout {
                url: ENTRY.to_string(),
                timeout_ms: 20
            }
        );
    }
}
