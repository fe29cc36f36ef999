//! Theme preference - persisted choice plus `themeChanged` propagation

use parking_lot::Mutex;
use shared::{PayBridgeError, Theme, ThemeChanged};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::EventBus;

/// Storage key holding the persisted theme
pub const THEME_STORAGE_KEY: &str = "theme";

/// Minimal string key-value storage
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> shared::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> shared::Result<()>;
}

/// Volatile storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> shared::Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> shared::Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage persisted as a flat JSON object on disk
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> shared::Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> shared::Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> shared::Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Owns the current theme and broadcasts changes
pub struct ThemeController {
    storage: Box<dyn KeyValueStorage>,
    bus: EventBus,
    current: Mutex<Theme>,
}

impl ThemeController {
    /// Resolve the initial theme: saved preference first, then the system
    /// preference, then light.
    pub fn new(storage: Box<dyn KeyValueStorage>, bus: EventBus, system_prefers_dark: bool) -> Self {
        let saved = match storage.get(THEME_STORAGE_KEY) {
            Ok(value) => value.as_deref().and_then(Theme::parse),
            Err(e) => {
                warn!(error = %e, "Failed to read saved theme");
                None
            }
        };

        let initial = saved.unwrap_or(if system_prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        });

        Self {
            storage,
            bus,
            current: Mutex::new(initial),
        }
    }

    pub fn current(&self) -> Theme {
        *self.current.lock()
    }

    /// Whether the user has an explicit saved preference
    pub fn has_saved_preference(&self) -> bool {
        matches!(self.storage.get(THEME_STORAGE_KEY), Ok(Some(ref v)) if Theme::parse(v).is_some())
    }

    /// Follow a system preference change unless the user chose explicitly
    pub fn system_preference_changed(&self, prefers_dark: bool) -> Theme {
        if self.has_saved_preference() {
            return self.current();
        }
        let theme = if prefers_dark { Theme::Dark } else { Theme::Light };
        *self.current.lock() = theme;
        theme
    }

    /// Flip the theme, persist it and emit `themeChanged`
    pub fn toggle(&self) -> Result<Theme, PayBridgeError> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }

    /// Set the theme explicitly, persist it and emit `themeChanged`
    pub fn set(&self, theme: Theme) -> Result<(), PayBridgeError> {
        self.storage.set(THEME_STORAGE_KEY, theme.as_str())?;
        *self.current.lock() = theme;
        info!(theme = theme.as_str(), "Theme changed");
        self.bus.emit_typed(&ThemeChanged::new(theme));
        Ok(())
    }
}
