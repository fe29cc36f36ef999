//! Demo invoices the mock API starts with

use chrono::{DateTime, TimeZone, Utc};
use shared::{InvoiceRecord, InvoiceStatus, LineItem};

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn invoice(
    seq: u32,
    client_name: &str,
    client_email: &str,
    status: InvoiceStatus,
    issue_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    paid_date: Option<DateTime<Utc>>,
    items: Vec<LineItem>,
) -> InvoiceRecord {
    InvoiceRecord {
        id: format!("inv-{:03}", seq),
        invoice_number: format!("INV-2025-{:03}", seq),
        client_name: client_name.to_string(),
        client_email: client_email.to_string(),
        amount: items.iter().map(|i| i.total).sum(),
        status,
        issue_date,
        due_date,
        paid_date,
        items,
    }
}

pub fn seed_invoices() -> Vec<InvoiceRecord> {
    vec![
        invoice(
            1,
            "Acme Corporation",
            "billing@acme.com",
            InvoiceStatus::Unpaid,
            day(2025, 10, 1),
            day(2025, 10, 31),
            None,
            vec![
                LineItem::new("Web Development Services", 40, 25.0),
                LineItem::new("Design Consultation", 5, 50.0),
            ],
        ),
        invoice(
            2,
            "Tech Startup Inc",
            "finance@techstartup.com",
            InvoiceStatus::Paid,
            day(2025, 9, 15),
            day(2025, 10, 15),
            Some(day(2025, 10, 10)),
            vec![
                LineItem::new("API Development", 80, 35.0),
                LineItem::new("System Architecture", 10, 70.0),
            ],
        ),
        invoice(
            3,
            "Global Enterprises Ltd",
            "accounts@globalent.com",
            InvoiceStatus::Overdue,
            day(2025, 9, 1),
            day(2025, 10, 1),
            None,
            vec![
                LineItem::new("Cloud Infrastructure Setup", 1, 3000.0),
                LineItem::new("Database Migration", 40, 55.0),
            ],
        ),
        invoice(
            4,
            "Small Business Co",
            "admin@smallbiz.com",
            InvoiceStatus::Unpaid,
            day(2025, 10, 10),
            day(2025, 11, 10),
            None,
            vec![
                LineItem::new("Website Maintenance", 10, 60.0),
                LineItem::new("Security Updates", 5, 50.0),
            ],
        ),
        invoice(
            5,
            "Digital Marketing Agency",
            "billing@digitalmarketing.com",
            InvoiceStatus::Unpaid,
            day(2025, 10, 15),
            day(2025, 11, 15),
            None,
            vec![LineItem::new("E-commerce Platform Development", 60, 35.0)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_amounts_match_line_items() {
        let amounts: Vec<f64> = seed_invoices().iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![1250.0, 3500.0, 5200.0, 850.0, 2100.0]);
    }

    #[test]
    fn test_seed_identity() {
        let invoices = seed_invoices();
        assert_eq!(invoices[0].id, "inv-001");
        assert_eq!(invoices[0].invoice_number, "INV-2025-001");
        assert_eq!(invoices[1].paid_date.unwrap().to_rfc3339(), "2025-10-10T00:00:00+00:00");
        assert!(invoices.iter().filter(|i| i.paid_date.is_some()).count() == 1);
    }
}
