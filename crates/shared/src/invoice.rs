//! Invoice types shared by the backend, the facade and the fragments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::BackendError;

/// Lifecycle state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// CSS badge class used by list views
    pub fn badge_class(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "badge-success",
            InvoiceStatus::Unpaid => "badge-warning",
            InvoiceStatus::Overdue => "badge-danger",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter accepted by `GET /api/invoices?status=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
    Overdue,
}

impl StatusFilter {
    pub fn matches(&self, status: InvoiceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => status == InvoiceStatus::Paid,
            StatusFilter::Unpaid => status == InvoiceStatus::Unpaid,
            StatusFilter::Overdue => status == InvoiceStatus::Overdue,
        }
    }

    /// Query-string value, `None` for `all`
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Paid => Some("paid"),
            StatusFilter::Unpaid => Some("unpaid"),
            StatusFilter::Overdue => Some("overdue"),
        }
    }

    /// Exact query-string match; an empty value means `all`
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "" | "all" => Some(StatusFilter::All),
            "paid" => Some(StatusFilter::Paid),
            "unpaid" => Some(StatusFilter::Unpaid),
            "overdue" => Some(StatusFilter::Overdue),
            _ => None,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "paid" => Ok(StatusFilter::Paid),
            "unpaid" => Ok(StatusFilter::Unpaid),
            "overdue" => Ok(StatusFilter::Overdue),
            other => Err(format!("Unknown status filter '{}'", other)),
        }
    }
}

/// One billed line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            total: quantity as f64 * unit_price,
        }
    }
}

/// Invoice as exposed by the billing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl InvoiceRecord {
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Transition to `paid`, stamping `paid_date` with `now`.
    ///
    /// The transition is one-way; repeating it fails with `AlreadyPaid` and
    /// leaves the record untouched.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), BackendError> {
        if self.is_paid() {
            return Err(BackendError::AlreadyPaid {
                invoice_id: self.id.clone(),
                paid_date: self.paid_date,
            });
        }
        self.status = InvoiceStatus::Paid;
        self.paid_date = Some(now);
        Ok(())
    }

    /// Unpaid with a due date in the past
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Unpaid && self.due_date < now
    }

    /// Case-insensitive substring match over client name or invoice number
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.client_name.to_lowercase().contains(&term)
            || self.invoice_number.to_lowercase().contains(&term)
    }
}

/// Format an amount as US dollars, e.g. `$1,250.00`
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, fraction)
}
