//! Client-side invoice helpers

use chrono::{DateTime, Utc};
use shared::InvoiceRecord;

/// Records whose client name or invoice number contains `term`, ignoring case.
///
/// A blank term keeps every record.
pub fn filter_invoices(records: &[InvoiceRecord], term: &str) -> Vec<InvoiceRecord> {
    let term = term.trim();
    if term.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| r.matches_search(term))
        .cloned()
        .collect()
}

/// Badge class for an invoice status
pub fn status_class(record: &InvoiceRecord) -> &'static str {
    record.status.badge_class()
}

/// Unpaid with a due date before `now`
pub fn is_overdue(record: &InvoiceRecord, now: DateTime<Utc>) -> bool {
    record.is_overdue(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::seed_invoices;

    #[test]
    fn test_filter_matches_client_or_number() {
        let records = seed_invoices();

        let acme = filter_invoices(&records, "acme");
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].client_name, "Acme Corporation");

        let by_number = filter_invoices(&records, "inv-2025-00");
        assert_eq!(by_number.len(), 5);

        let upper = filter_invoices(&records, "DIGITAL");
        assert_eq!(upper[0].id, "inv-005");

        assert!(filter_invoices(&records, "nobody").is_empty());
        assert_eq!(filter_invoices(&records, "  ").len(), 5);
    }

    #[test]
    fn test_status_helpers() {
        let records = seed_invoices();
        assert_eq!(status_class(&records[1]), "badge-success");
        assert_eq!(status_class(&records[0]), "badge-warning");
        assert_eq!(status_class(&records[2]), "badge-danger");

        let later = records[0].due_date + chrono::Duration::days(1);
        assert!(is_overdue(&records[0], later));
        assert!(!is_overdue(&records[1], later));
    }
}
