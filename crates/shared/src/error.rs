//! Error types for PayBridge

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Coarse classification of a [`LoadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    Unreachable,
    ParseFailure,
    Timeout,
}

/// Error returned when a remote module cannot be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Remote entry '{url}' is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Remote entry '{url}' could not be parsed: {reason}")]
    ParseFailure { url: String, reason: String },

    #[error("Remote entry '{url}' timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Unreachable { .. } => LoadErrorKind::Unreachable,
            LoadError::ParseFailure { .. } => LoadErrorKind::ParseFailure,
            LoadError::Timeout { .. } => LoadErrorKind::Timeout,
        }
    }

    /// URL of the entry that failed
    pub fn url(&self) -> &str {
        match self {
            LoadError::Unreachable { url, .. }
            | LoadError::ParseFailure { url, .. }
            | LoadError::Timeout { url, .. } => url,
        }
    }
}

/// Error returned when no UI factory can be extracted from a module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Module '{module}' exposes no callable export (tried: {})", tried.join(", "))]
    NoCallableExportFound { module: String, tried: Vec<String> },
}

/// Error returned when a fragment cannot be mounted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("Fragment '{fragment}' failed during initial render: {reason}")]
    RenderThrew { fragment: String, reason: String },

    #[error("Application module '{0}' is already registered")]
    ModuleConflict(String),
}

/// `error` text of the API's already-paid response
pub const ALREADY_PAID_MESSAGE: &str = "Invoice already paid";

/// Error returned by the invoice backend or the facade talking to it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("Invoice '{invoice_id}' not found")]
    NotFound { invoice_id: String },

    #[error("Invoice '{invoice_id}' already paid")]
    AlreadyPaid {
        invoice_id: String,
        paid_date: Option<DateTime<Utc>>,
    },

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Backend unreachable: {0}")]
    NetworkError(String),
}

impl BackendError {
    /// Message suitable for showing to the user of a fragment
    pub fn user_message(&self) -> String {
        match self {
            BackendError::NetworkError(_) => {
                "Cannot reach the billing service. Check your connection and retry.".to_string()
            }
            BackendError::AlreadyPaid { invoice_id, .. } => {
                format!("Invoice {} has already been paid.", invoice_id)
            }
            BackendError::NotFound { invoice_id } => {
                format!("Invoice {} no longer exists.", invoice_id)
            }
            BackendError::ServerError { status, .. } => {
                format!("The billing service failed (HTTP {}). Please try again later.", status)
            }
        }
    }
}

/// Error returned when invoking an action exposed by a mounted fragment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("Fragment does not expose action '{0}'")]
    UnknownAction(String),

    #[error("Invalid arguments for '{action}': {reason}")]
    InvalidArgs { action: String, reason: String },

    #[error("Mount '{0}' is no longer live")]
    NotMounted(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// General PayBridge error type
#[derive(Debug, Error)]
pub enum PayBridgeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PayBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_kind_and_url() {
        let err = LoadError::Timeout {
            url: "http://localhost:3002/remoteEntry.json".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(err.kind(), LoadErrorKind::Timeout);
        assert_eq!(err.url(), "http://localhost:3002/remoteEntry.json");
        assert!(err.to_string().contains("10000ms"));
    }

    #[test]
    fn test_normalize_error_lists_strategies() {
        let err = NormalizeError::NoCallableExportFound {
            module: "payment_app".to_string(),
            tried: vec!["direct-default".to_string(), "named-scan".to_string()],
        };
        assert!(err.to_string().contains("direct-default, named-scan"));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let network = BackendError::NetworkError("refused".to_string()).user_message();
        let paid = BackendError::AlreadyPaid {
            invoice_id: "inv-002".to_string(),
            paid_date: None,
        }
        .user_message();
        let missing = BackendError::NotFound {
            invoice_id: "inv-999".to_string(),
        }
        .user_message();

        assert!(network.contains("Cannot reach"));
        assert!(paid.contains("already been paid"));
        assert!(missing.contains("no longer exists"));
    }

    #[test]
    fn test_conversions_into_general_error() {
        let err: PayBridgeError = MountError::ModuleConflict("invoice_app_1".to_string()).into();
        assert!(matches!(err, PayBridgeError::Mount(_)));

        let err: PayBridgeError = ActionError::from(BackendError::NetworkError("down".into())).into();
        assert!(err.to_string().contains("Backend unreachable"));
    }
}
