//! PayBridge Remote - Fragment registry, loading and export normalization

mod entry_registry;
mod fetcher;
mod loader;
mod manifest;
mod module;
mod normalizer;
mod registry;

pub use entry_registry::EntryRegistry;
pub use fetcher::{EntryFetcher, HttpFetcher, StaticFetcher};
pub use loader::RemoteLoader;
pub use manifest::{ComponentCatalog, ExportSpec, ManifestLinker, ModuleLinker, NamedExport, RemoteManifest};
pub use module::{ExportValue, ModuleHandle, Thunk};
pub use normalizer::{ExportNormalizer, ExtractionStrategy};
pub use registry::RemoteRegistry;
