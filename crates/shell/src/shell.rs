//! Shell - Route resolution and the single fragment outlet

use bus::{EventBus, KeyValueStorage, ThemeController};
use client::{ConnectionMonitor, InvoiceApi};
use mount::{Container, FragmentMountAdapter, MountHandle, Props, View};
use remote::{EntryFetcher, EntryRegistry, ExportNormalizer, HttpFetcher, ManifestLinker, RemoteLoader, RemoteRegistry};
use serde_json::Value;
use shared::{ActionError, LoaderConfig, PayBridgeError, RegistryConfig, Result, Theme, UiFramework};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::{bundled_catalog, bundled_fetcher};
use crate::host::{FragmentHost, HostState};
use crate::routes::{Route, RouteTable};

/// Container id of the shell outlet
pub const OUTLET_ID: &str = "shell-outlet";

/// Where remote entries come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntrySource {
    /// Manifests compiled into the shell, served at the registry URLs
    #[default]
    Bundled,
    /// Manifests fetched from the configured remote origins
    Http,
}

/// Shell configuration
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub registry: RegistryConfig,
    pub loader: LoaderConfig,
    pub source: EntrySource,
    /// Used when no theme preference has been saved
    pub system_prefers_dark: bool,
}

impl ShellConfig {
    /// Registry origins from `REACT_APP_<NAME>_URL`, everything else default
    pub fn from_env() -> Self {
        Self::new(RegistryConfig::from_env())
    }

    pub fn new(registry: RegistryConfig) -> Self {
        Self {
            registry,
            loader: LoaderConfig::default(),
            source: EntrySource::default(),
            system_prefers_dark: false,
        }
    }

    pub fn with_source(mut self, source: EntrySource) -> Self {
        self.source = source;
        self
    }
}

/// The host application: resolves routes to fragments and keeps exactly one
/// of them mounted in the outlet.
pub struct Shell {
    /// Configured fragments
    registry: RemoteRegistry,
    /// Navigable paths
    routes: RouteTable,
    /// Fetches and links remote entries
    loader: RemoteLoader,
    /// Finds the component inside a loaded module
    normalizer: ExportNormalizer,
    /// Owns every live mount
    adapter: FragmentMountAdapter,
    /// Backend facade shared with the fragments
    api: Arc<dyn InvoiceApi>,
    /// Persisted colour theme
    theme: ThemeController,
    /// Where the active fragment renders
    outlet: Container,
    /// Active route and its host
    current: Option<(Route, FragmentHost)>,
    /// Backend reachability poller, when enabled
    monitor: Option<ConnectionMonitor>,
}

impl Shell {
    /// Shell over the process-wide entry cache
    pub fn new(
        config: ShellConfig,
        api: Arc<dyn InvoiceApi>,
        bus: EventBus,
        storage: Box<dyn KeyValueStorage>,
    ) -> Result<Self> {
        let registry = RemoteRegistry::new(config.registry.clone())?;
        let fetcher: Arc<dyn EntryFetcher> = match config.source {
            EntrySource::Bundled => Arc::new(bundled_fetcher(&registry)),
            EntrySource::Http => Arc::new(HttpFetcher::new(config.loader.timeout)?),
        };
        Self::assemble(config, registry, fetcher, EntryRegistry::global().clone(), api, bus, storage)
    }

    /// Shell over a custom entry source, with its own entry cache
    pub fn with_fetcher(
        config: ShellConfig,
        fetcher: Arc<dyn EntryFetcher>,
        api: Arc<dyn InvoiceApi>,
        bus: EventBus,
        storage: Box<dyn KeyValueStorage>,
    ) -> Result<Self> {
        let registry = RemoteRegistry::new(config.registry.clone())?;
        Self::assemble(config, registry, fetcher, EntryRegistry::new(), api, bus, storage)
    }

    fn assemble(
        config: ShellConfig,
        registry: RemoteRegistry,
        fetcher: Arc<dyn EntryFetcher>,
        entries: EntryRegistry,
        api: Arc<dyn InvoiceApi>,
        bus: EventBus,
        storage: Box<dyn KeyValueStorage>,
    ) -> Result<Self> {
        let linker = ManifestLinker::new(bundled_catalog(Arc::clone(&api)));
        let loader = RemoteLoader::new(fetcher, Arc::new(linker))
            .with_entries(entries)
            .with_config(config.loader.clone());

        info!(
            fragments = registry.len(),
            source = ?config.source,
            "Shell ready"
        );

        Ok(Self {
            registry,
            routes: RouteTable::default(),
            loader,
            normalizer: ExportNormalizer::new(),
            adapter: FragmentMountAdapter::new(bus.clone()),
            api,
            theme: ThemeController::new(storage, bus, config.system_prefers_dark),
            outlet: Container::new(OUTLET_ID),
            current: None,
            monitor: None,
        })
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Attach a connection monitor; it is started immediately
    pub fn with_monitor(mut self, monitor: ConnectionMonitor) -> Self {
        monitor.start();
        self.monitor = Some(monitor);
        self
    }

    pub fn registry(&self) -> &RemoteRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn adapter(&self) -> &FragmentMountAdapter {
        &self.adapter
    }

    pub fn bus(&self) -> &EventBus {
        self.adapter.bus()
    }

    pub fn monitor(&self) -> Option<&ConnectionMonitor> {
        self.monitor.as_ref()
    }

    pub fn outlet(&self) -> &Container {
        &self.outlet
    }

    pub fn current_route(&self) -> Option<&Route> {
        self.current.as_ref().map(|(route, _)| route)
    }

    /// State of the active host, `Idle` before the first navigation
    pub fn state(&self) -> &HostState {
        const IDLE: &HostState = &HostState::Idle;
        self.current.as_ref().map(|(_, host)| host.state()).unwrap_or(IDLE)
    }

    /// What the outlet currently shows
    pub fn view(&self) -> Option<View> {
        self.outlet.content()
    }

    /// Live mounts, sorted by fragment name
    pub fn mounts(&self) -> Vec<MountHandle> {
        self.adapter.live_mounts()
    }

    pub fn mounts_by_framework(&self) -> HashMap<UiFramework, Vec<MountHandle>> {
        self.adapter.mounts_by_framework()
    }

    /// Show the fragment behind `path`, replacing whatever was shown
    pub async fn navigate(&mut self, path: &str) -> Result<&HostState> {
        let route = self
            .routes
            .resolve(path)
            .cloned()
            .ok_or_else(|| PayBridgeError::Other(format!("No route for '{}'", path)))?;
        let descriptor = self.registry.get(&route.fragment).cloned().ok_or_else(|| {
            PayBridgeError::Config(format!("Route '{}' targets unknown fragment '{}'", route.path, route.fragment))
        })?;

        let already_shown = self.current.as_ref().is_some_and(|(current, host)| {
            current.path == route.path && host.handle().is_some_and(|h| self.adapter.is_live(h))
        });
        if already_shown {
            debug!(route = %route.path, "Already active");
            return Ok(self.state());
        }

        if let Some((previous, mut host)) = self.current.take() {
            debug!(route = %previous.path, "Leaving route");
            host.deactivate(&self.adapter);
        }

        let mut host = FragmentHost::new(descriptor, self.outlet.clone()).with_props(self.props());
        host.activate(&self.loader, &self.normalizer, &self.adapter, self.api.as_ref())
            .await;
        info!(route = %route.path, fragment = %route.fragment, fallback = host.is_fallback(), "Navigated");

        let (_, host) = self.current.insert((route, host));
        Ok(host.state())
    }

    /// Load the active route's fragment again
    pub async fn retry(&mut self) -> Result<&HostState> {
        let (route, host) = self
            .current
            .as_mut()
            .ok_or_else(|| PayBridgeError::Other("Nothing to retry".to_string()))?;
        info!(route = %route.path, "Retrying fragment");
        Ok(host
            .retry(&self.loader, &self.normalizer, &self.adapter, self.api.as_ref())
            .await)
    }

    /// Run an action on the active fragment
    pub fn act(&self, action: &str, args: &Value) -> std::result::Result<Value, ActionError> {
        let handle = self
            .current
            .as_ref()
            .and_then(|(_, host)| host.handle())
            .ok_or_else(|| ActionError::NotMounted(OUTLET_ID.to_string()))?;
        self.adapter.invoke(handle, action, args)
    }

    /// Actions the active fragment accepts
    pub fn actions(&self) -> Vec<&'static str> {
        self.current
            .as_ref()
            .and_then(|(_, host)| host.handle())
            .and_then(|handle| self.adapter.actions(handle))
            .unwrap_or_default()
    }

    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        self.theme.toggle()
    }

    /// Stop the monitor and dispose every mount. Returns how many were live.
    pub fn shutdown(&mut self) -> usize {
        if let Some(monitor) = &self.monitor {
            monitor.stop();
        }
        self.current = None;
        let disposed = self.adapter.unmount_all();
        info!(disposed, "Shell shut down");
        disposed
    }

    fn props(&self) -> Props {
        let mut props = Props::new();
        props.insert("theme".to_string(), Value::from(self.theme.current().as_str()));
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::testing::{settle, FakeApi};
    use bus::MemoryStorage;
    use remote::StaticFetcher;
    use serde_json::json;

    fn config() -> ShellConfig {
        ShellConfig::new(RegistryConfig::from_lookup(|_| None))
    }

    fn shell_over(api: Arc<dyn InvoiceApi>) -> (Shell, Arc<StaticFetcher>) {
        let config = config();
        let registry = RemoteRegistry::new(config.registry.clone()).unwrap();
        let fetcher = Arc::new(bundled_fetcher(&registry));
        let shell = Shell::with_fetcher(
            config,
            fetcher.clone(),
            api,
            EventBus::new(),
            Box::new(MemoryStorage::new()),
        )
        .unwrap();
        (shell, fetcher)
    }

    fn shell() -> (Shell, Arc<StaticFetcher>) {
        shell_over(Arc::new(FakeApi::seeded()))
    }

    fn entry_of(shell: &Shell, fragment: &str) -> String {
        shell.registry().get(fragment).unwrap().entry_url()
    }

    // ============== Navigation Tests ==============

    #[tokio::test]
    async fn test_navigate_mounts_route_fragment() {
        let (mut shell, _) = shell();
        assert_eq!(shell.state(), &HostState::Idle);

        let state = shell.navigate("/payments").await.unwrap().clone();
        assert!(matches!(state, HostState::Mounted(_)));
        assert_eq!(shell.current_route().unwrap().title, "Payments");
        settle().await;

        assert!(shell.view().unwrap().text_content().contains("Process Payment"));
        assert_eq!(shell.actions(), vec!["select", "fill", "submit", "reset", "reload"]);
    }

    #[tokio::test]
    async fn test_root_resolves_to_invoice_list() {
        let (mut shell, _) = shell();
        shell.navigate("/").await.unwrap();

        assert_eq!(shell.current_route().unwrap().path, "/invoices");
        let grouped = shell.mounts_by_framework();
        assert_eq!(grouped[&UiFramework::Binding].len(), 1);
        assert_eq!(grouped[&UiFramework::Binding][0].fragment(), "invoice-list");
    }

    #[tokio::test]
    async fn test_switching_routes_keeps_one_mount() {
        let (mut shell, _) = shell();
        shell.navigate("/invoices").await.unwrap();
        shell.navigate("/table").await.unwrap();
        shell.navigate("/analysis").await.unwrap();

        let mounts = shell.mounts();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].fragment(), "analytics-dashboard");
    }

    #[tokio::test]
    async fn test_same_route_is_not_remounted() {
        let (mut shell, fetcher) = shell();
        shell.navigate("/table").await.unwrap();
        let first = shell.mounts()[0].clone();

        shell.navigate("/table/").await.unwrap();
        assert_eq!(shell.mounts()[0], first);
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_act_reaches_active_fragment() {
        let (mut shell, _) = shell();
        shell.navigate("/table").await.unwrap();
        settle().await;

        shell.act("filter", &json!({ "status": "paid" })).unwrap();
        settle().await;
        let view = shell.view().unwrap();
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-002"), 1);
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-001"), 0);
    }

    // ============== Fallback Tests ==============

    #[tokio::test]
    async fn test_missing_remote_falls_back_then_retries() {
        let (mut shell, fetcher) = shell();
        let url = entry_of(&shell, "mrt_table_app");
        let source = fetcher.fetch(&url).await.unwrap();
        fetcher.remove(&url);

        assert!(matches!(shell.navigate("/table").await.unwrap(), HostState::Fallback { .. }));
        let view = shell.view().unwrap();
        assert_eq!(view.count_with_attr("data-action", "retry"), 1);
        assert_eq!(view.count_with_attr("class", "invoice-table"), 1);
        assert!(shell.mounts().is_empty());
        assert!(matches!(shell.act("filter", &json!("paid")), Err(ActionError::NotMounted(_))));

        fetcher.insert(url, source);
        assert!(matches!(shell.retry().await.unwrap(), HostState::Mounted(_)));
        assert_eq!(shell.mounts().len(), 1);
    }

    #[tokio::test]
    async fn test_theme_reaches_dashboard() {
        let (mut shell, _) = shell();
        shell.navigate("/analysis").await.unwrap();
        assert_eq!(shell.view().unwrap().get_attr("data-theme"), Some("light"));

        assert_eq!(shell.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(shell.view().unwrap().get_attr("data-theme"), Some("dark"));

        // new mounts start from the stored theme
        shell.navigate("/table").await.unwrap();
        shell.navigate("/analysis").await.unwrap();
        assert_eq!(shell.view().unwrap().get_attr("data-theme"), Some("dark"));
    }

    #[tokio::test]
    async fn test_shutdown_disposes_mounts() {
        let (mut shell, _) = shell();
        shell.navigate("/invoices").await.unwrap();

        assert_eq!(shell.shutdown(), 1);
        assert!(shell.mounts().is_empty());
        assert!(shell.outlet().is_empty());
        assert_eq!(shell.state(), &HostState::Idle);
    }

    // ============== End-to-End Tests ==============

    #[tokio::test]
    async fn test_payment_against_real_backend() {
        use backend::{router, InMemoryInvoiceStore};
        use client::InvoiceClient;
        use shared::{BackendConfig, ClientConfig};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(InMemoryInvoiceStore::seeded()), &BackendConfig::default());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = InvoiceClient::new(&ClientConfig::default().with_base_url(format!("http://{}", addr))).unwrap();

        let (mut shell, _) = shell_over(Arc::new(client.clone()));
        shell.navigate("/payments").await.unwrap();
        settle().await;

        shell.act("select", &json!("inv-001")).unwrap();
        shell
            .act(
                "fill",
                &json!({
                    "cardholderName": "Jane Doe",
                    "cardNumber": "4242424242424242",
                    "expiryDate": "1299",
                    "cvv": "123",
                }),
            )
            .unwrap();
        let submitted = shell.act("submit", &Value::Null).unwrap();
        assert_eq!(submitted["valid"], true);
        settle().await;
        settle().await;

        assert!(shell.view().unwrap().text_content().contains("Payment processed successfully!"));
        let record = client.get_invoice("inv-001").await.unwrap();
        assert!(record.is_paid());

        shell.navigate("/analysis").await.unwrap();
        settle().await;
        assert_eq!(shell.act("refresh", &Value::Null).unwrap(), Value::Null);
    }

    mod edge_cases {
        use super::*;

        #[tokio::test]
        async fn test_unknown_route() {
            let (mut shell, _) = shell();
            assert!(matches!(shell.navigate("/settings").await, Err(PayBridgeError::Other(_))));
            assert!(shell.current_route().is_none());
        }

        #[tokio::test]
        async fn test_route_to_unregistered_fragment() {
            let (shell, _) = shell();
            let mut shell = shell.with_routes(RouteTable::new(vec![Route::new("/legacy", "legacy_app", "Legacy")]));
            assert!(matches!(shell.navigate("/legacy").await, Err(PayBridgeError::Config(_))));
        }

        #[tokio::test]
        async fn test_retry_before_navigation() {
            let (mut shell, _) = shell();
            assert!(shell.retry().await.is_err());
            assert!(matches!(shell.act("reload", &Value::Null), Err(ActionError::NotMounted(_))));
            assert!(shell.actions().is_empty());
        }

        #[test]
        fn test_duplicate_fragment_rejected() {
            let mut config = config();
            let first = config.registry.fragments[0].clone();
            config.registry.fragments.push(first);
            let result = Shell::with_fetcher(
                config,
                Arc::new(StaticFetcher::new()),
                Arc::new(FakeApi::seeded()),
                EventBus::new(),
                Box::new(MemoryStorage::new()),
            );
            assert!(matches!(result, Err(PayBridgeError::Config(_))));
        }
    }
}
