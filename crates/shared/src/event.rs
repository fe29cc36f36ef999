//! Domain events broadcast between mounted fragments

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event emitted after an invoice has been paid
pub const INVOICE_PAID: &str = "invoice:paid";
/// Event emitted when the colour theme changes
pub const THEME_CHANGED: &str = "themeChanged";
/// Backend came back online
pub const BACKEND_CONNECTED: &str = "backend:connected";
/// Backend went offline
pub const BACKEND_DISCONNECTED: &str = "backend:disconnected";
/// Any backend connectivity transition
pub const BACKEND_STATUS_CHANGE: &str = "backend:statusChange";

/// An application-level occurrence.
///
/// Events are transient: delivered once to whoever is subscribed at the
/// moment of emission and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Read a payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// A strongly typed event with a fixed wire name
pub trait TypedEvent: Serialize + DeserializeOwned {
    const TYPE: &'static str;

    /// Convert into the generic envelope.
    ///
    /// Types that do not serialize to a JSON object produce an empty payload.
    fn to_event(&self) -> DomainEvent {
        let payload = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        DomainEvent::new(Self::TYPE, payload)
    }

    /// Decode from the generic envelope; `None` on type or shape mismatch
    fn from_event(event: &DomainEvent) -> Option<Self> {
        if event.event_type != Self::TYPE {
            return None;
        }
        serde_json::from_value(Value::Object(event.payload.clone())).ok()
    }
}

/// Payload of [`INVOICE_PAID`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePaid {
    pub invoice_id: String,
    pub invoice_number: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TypedEvent for InvoicePaid {
    const TYPE: &'static str = INVOICE_PAID;
}

/// Colour theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Payload of [`THEME_CHANGED`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeChanged {
    pub theme: Theme,
    pub is_dark: bool,
}

impl ThemeChanged {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            is_dark: theme == Theme::Dark,
        }
    }
}

impl TypedEvent for ThemeChanged {
    const TYPE: &'static str = THEME_CHANGED;
}

/// Backend reachability as seen by the connection monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Payload of [`BACKEND_STATUS_CHANGE`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatusChanged {
    pub status: ConnectionStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TypedEvent for BackendStatusChanged {
    const TYPE: &'static str = BACKEND_STATUS_CHANGE;
}
