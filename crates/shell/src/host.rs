//! FragmentHost - Load, normalize and mount one fragment, with a fallback

use client::InvoiceApi;
use mount::{Container, FragmentMountAdapter, MountHandle, Props, View};
use remote::{ExportNormalizer, RemoteLoader};
use shared::{FragmentDescriptor, PayBridgeError, StatusFilter};
use tracing::{info, warn};

use crate::fragments::invoice_table_view;

/// What the host currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum HostState {
    Idle,
    Mounted(MountHandle),
    /// The remote could not be loaded, normalized or mounted
    Fallback { reason: String },
}

/// Owns the lifecycle of one fragment in one container.
///
/// Failures anywhere between fetching the entry and the first render are
/// caught here and turned into a static fallback view with a retry action.
#[derive(Debug)]
pub struct FragmentHost {
    descriptor: FragmentDescriptor,
    container: Container,
    props: Props,
    state: HostState,
    attempts: u32,
}

impl FragmentHost {
    pub fn new(descriptor: FragmentDescriptor, container: Container) -> Self {
        Self {
            descriptor,
            container,
            props: Props::new(),
            state: HostState::Idle,
            attempts: 0,
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn descriptor(&self) -> &FragmentDescriptor {
        &self.descriptor
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn state(&self) -> &HostState {
        &self.state
    }

    /// Live mount, if the fragment is mounted
    pub fn handle(&self) -> Option<&MountHandle> {
        match &self.state {
            HostState::Mounted(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.state, HostState::Fallback { .. })
    }

    /// Number of load attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Load, normalize and mount the fragment. Falls back on any failure.
    pub async fn activate(
        &mut self,
        loader: &RemoteLoader,
        normalizer: &ExportNormalizer,
        adapter: &FragmentMountAdapter,
        api: &dyn InvoiceApi,
    ) -> &HostState {
        if self.handle().is_some_and(|handle| adapter.is_live(handle)) {
            return &self.state;
        }

        self.attempts += 1;
        match self.try_mount(loader, normalizer, adapter).await {
            Ok(handle) => {
                info!(
                    fragment = %self.descriptor.name,
                    attempt = self.attempts,
                    mount = %handle.id(),
                    "Fragment active"
                );
                self.state = HostState::Mounted(handle);
            }
            Err(e) => {
                warn!(fragment = %self.descriptor.name, attempt = self.attempts, error = %e, "Showing fallback");
                let reason = e.to_string();
                self.container.show_static(self.fallback_view(&reason, api).await);
                self.state = HostState::Fallback { reason };
            }
        }
        &self.state
    }

    /// Manual retry after a fallback. Each call attempts a fresh load.
    pub async fn retry(
        &mut self,
        loader: &RemoteLoader,
        normalizer: &ExportNormalizer,
        adapter: &FragmentMountAdapter,
        api: &dyn InvoiceApi,
    ) -> &HostState {
        self.deactivate(adapter);
        self.activate(loader, normalizer, adapter, api).await
    }

    /// Unmount the fragment. Returns false if nothing was mounted.
    pub fn deactivate(&mut self, adapter: &FragmentMountAdapter) -> bool {
        let previous = std::mem::replace(&mut self.state, HostState::Idle);
        match previous {
            HostState::Mounted(handle) => adapter.unmount(&handle),
            HostState::Fallback { .. } => {
                self.container.clear();
                false
            }
            HostState::Idle => false,
        }
    }

    async fn try_mount(
        &self,
        loader: &RemoteLoader,
        normalizer: &ExportNormalizer,
        adapter: &FragmentMountAdapter,
    ) -> Result<MountHandle, PayBridgeError> {
        let module = loader.load(&self.descriptor).await?;
        let factory = normalizer.normalize(&module)?;
        let handle = adapter.mount(&factory, &self.container, self.props.clone(), self.descriptor.ui_framework)?;
        Ok(handle)
    }

    async fn fallback_view(&self, reason: &str, api: &dyn InvoiceApi) -> View {
        let notice = View::element("div")
            .attr("class", "fragment-error")
            .child(View::element("h3").child(View::text(format!("{} is unavailable", self.descriptor.name))))
            .child(View::text(reason.to_string()))
            .child(View::element("button").attr("data-action", "retry").child(View::text("Retry")));

        // degraded invoice view fed directly by the facade
        let degraded = match api.list_invoices(StatusFilter::All).await {
            Ok(invoices) => invoice_table_view(&invoices),
            Err(e) => View::element("p").attr("class", "error").child(View::text(e.user_message())),
        };

        View::element("div")
            .attr("class", "fragment-fallback")
            .attr("data-fragment", self.descriptor.name.clone())
            .child(notice)
            .child(degraded)
    }
}
