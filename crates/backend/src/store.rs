//! Invoice store - Repository trait and in-memory implementation

use chrono::{DateTime, Utc};
use shared::{InvoiceRecord, StatusFilter};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Store operation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Invoice not found: {invoice_id}")]
    NotFound { invoice_id: String },

    #[error("Invoice already paid: {invoice_id}")]
    AlreadyPaid {
        invoice_id: String,
        paid_date: Option<DateTime<Utc>>,
    },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

/// Invoice persistence
pub trait InvoiceStore: Send + Sync {
    /// Records matching `filter`, in insertion order
    fn list(&self, filter: StatusFilter) -> Result<Vec<InvoiceRecord>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<InvoiceRecord>, StoreError>;

    /// Mark an invoice paid at `now` and return the updated record
    fn mark_paid(&self, id: &str, now: DateTime<Utc>) -> Result<InvoiceRecord, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}

/// In-memory invoice store
///
/// Thread-safe implementation using RwLock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<Vec<InvoiceRecord>>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invoices(invoices: Vec<InvoiceRecord>) -> Self {
        Self {
            invoices: Arc::new(RwLock::new(invoices)),
        }
    }

    /// Store preloaded with the demo invoices
    pub fn seeded() -> Self {
        Self::with_invoices(crate::seed::seed_invoices())
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn list(&self, filter: StatusFilter) -> Result<Vec<InvoiceRecord>, StoreError> {
        let invoices = self.invoices.read().map_err(|_| StoreError::Persistence {
            message: "Failed to acquire read lock".to_string(),
        })?;
        Ok(invoices
            .iter()
            .filter(|inv| filter.matches(inv.status))
            .cloned()
            .collect())
    }

    fn get(&self, id: &str) -> Result<Option<InvoiceRecord>, StoreError> {
        let invoices = self.invoices.read().map_err(|_| StoreError::Persistence {
            message: "Failed to acquire read lock".to_string(),
        })?;
        Ok(invoices.iter().find(|inv| inv.id == id).cloned())
    }

    fn mark_paid(&self, id: &str, now: DateTime<Utc>) -> Result<InvoiceRecord, StoreError> {
        let mut invoices = self.invoices.write().map_err(|_| StoreError::Persistence {
            message: "Failed to acquire write lock".to_string(),
        })?;

        let invoice = invoices
            .iter_mut()
            .find(|inv| inv.id == id)
            .ok_or_else(|| StoreError::NotFound {
                invoice_id: id.to_string(),
            })?;

        invoice.mark_paid(now).map_err(|_| StoreError::AlreadyPaid {
            invoice_id: id.to_string(),
            paid_date: invoice.paid_date,
        })?;
        Ok(invoice.clone())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let invoices = self.invoices.read().map_err(|_| StoreError::Persistence {
            message: "Failed to acquire read lock".to_string(),
        })?;
        Ok(invoices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::InvoiceStatus;

    #[test]
    fn test_list_filters_by_status() {
        let store = InMemoryInvoiceStore::seeded();

        assert_eq!(store.list(StatusFilter::All).unwrap().len(), 5);
        let unpaid = store.list(StatusFilter::Unpaid).unwrap();
        let ids: Vec<&str> = unpaid.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["inv-001", "inv-004", "inv-005"]);
        assert_eq!(store.list(StatusFilter::Overdue).unwrap()[0].id, "inv-003");
    }

    #[test]
    fn test_mark_paid_stamps_date() {
        let store = InMemoryInvoiceStore::seeded();
        let now = Utc::now();

        let paid = store.mark_paid("inv-001", now).unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.paid_date, Some(now));
        assert_eq!(store.get("inv-001").unwrap().unwrap().paid_date, Some(now));
    }

    #[test]
    fn test_mark_paid_twice_keeps_original_date() {
        let store = InMemoryInvoiceStore::seeded();
        let original = store.get("inv-002").unwrap().unwrap().paid_date;

        let err = store.mark_paid("inv-002", Utc::now()).unwrap_err();
        assert_eq!(
            err,
            StoreError::AlreadyPaid {
                invoice_id: "inv-002".to_string(),
                paid_date: original
            }
        );
        assert_eq!(store.get("inv-002").unwrap().unwrap().paid_date, original);
    }

    #[test]
    fn test_mark_paid_unknown() {
        let store = InMemoryInvoiceStore::new();
        assert!(matches!(
            store.mark_paid("inv-999", Utc::now()),
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }
}
