//! Sortable invoice table (tree-rendered)

use client::InvoiceApi;
use mount::{Fragment, MountContext, UiFactory, View};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared::{format_currency, ActionError, InvoiceRecord, StatusFilter};
use std::cmp::Ordering;
use std::sync::Arc;

use super::{fetch_into, refetch_on_paid, spawn_mark_paid, status_arg, status_banner, str_arg, InvoiceFeed, SharedFeed};

const COLUMNS: [&str; 5] = ["Invoice #", "Client", "Amount", "Status", "Due Date"];

/// Static table of invoices, also used by the shell's fallback view
pub fn invoice_table_view(records: &[InvoiceRecord]) -> View {
    let header = View::element("tr").children(
        COLUMNS
            .iter()
            .map(|c| View::element("th").child(View::text(*c))),
    );

    let rows: Vec<View> = if records.is_empty() {
        vec![View::element("tr")
            .attr("class", "empty")
            .child(View::element("td").child(View::text("No invoices found")))]
    } else {
        records.iter().map(invoice_row).collect()
    };

    View::element("table")
        .attr("class", "invoice-table")
        .child(View::element("thead").child(header))
        .child(View::element("tbody").children(rows))
}

fn invoice_row(invoice: &InvoiceRecord) -> View {
    let cell = |text: String| View::element("td").child(View::text(text));
    View::element("tr")
        .attr("data-invoice-id", invoice.id.clone())
        .child(cell(invoice.invoice_number.clone()))
        .child(cell(invoice.client_name.clone()))
        .child(cell(format_currency(invoice.amount)))
        .child(
            View::element("td").child(
                View::element("span")
                    .attr("class", format!("badge {}", invoice.status.badge_class()))
                    .child(View::text(invoice.status.as_str())),
            ),
        )
        .child(cell(invoice.due_date.format("%Y-%m-%d").to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    InvoiceNumber,
    ClientName,
    Amount,
    Status,
    DueDate,
}

impl SortKey {
    fn parse(column: &str) -> Option<Self> {
        match column {
            "invoiceNumber" => Some(SortKey::InvoiceNumber),
            "clientName" => Some(SortKey::ClientName),
            "amount" => Some(SortKey::Amount),
            "status" => Some(SortKey::Status),
            "dueDate" => Some(SortKey::DueDate),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SortKey::InvoiceNumber => "invoiceNumber",
            SortKey::ClientName => "clientName",
            SortKey::Amount => "amount",
            SortKey::Status => "status",
            SortKey::DueDate => "dueDate",
        }
    }

    fn compare(&self, a: &InvoiceRecord, b: &InvoiceRecord) -> Ordering {
        match self {
            SortKey::InvoiceNumber => a.invoice_number.cmp(&b.invoice_number),
            SortKey::ClientName => a.client_name.to_lowercase().cmp(&b.client_name.to_lowercase()),
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::DueDate => a.due_date.cmp(&b.due_date),
        }
    }
}

struct InvoiceTable {
    api: Arc<dyn InvoiceApi>,
    ctx: MountContext,
    filter: Arc<Mutex<StatusFilter>>,
    feed: SharedFeed,
    sort: Option<(SortKey, bool)>,
    notice: Arc<Mutex<Option<String>>>,
}

impl InvoiceTable {
    fn sorted(&self) -> Vec<InvoiceRecord> {
        let mut records = self.feed.lock().invoices.clone();
        if let Some((key, ascending)) = self.sort {
            records.sort_by(|a, b| {
                let ord = key.compare(a, b);
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        records
    }

    fn reload(&self) {
        let filter = *self.filter.lock();
        fetch_into(&self.ctx, Arc::clone(&self.api), filter, Arc::clone(&self.feed));
    }
}

impl Fragment for InvoiceTable {
    fn render(&self) -> View {
        let feed: InvoiceFeed = self.feed.lock().clone();
        let mut root = View::element("div")
            .attr("class", "invoice-table-app")
            .child(View::element("h2").child(View::text("Invoice Table")))
            .child(
                View::element("p")
                    .attr("class", "filter")
                    .child(View::text(format!("Status: {}", self.filter.lock().as_query().unwrap_or("all")))),
            );

        if let Some(notice) = self.notice.lock().clone() {
            root = root.child(View::element("div").attr("class", "notice").child(View::text(notice)));
        }
        match status_banner(&feed) {
            Some(banner) => root.child(banner),
            None => root.child(invoice_table_view(&self.sorted())),
        }
    }

    fn model(&self) -> Value {
        json!({
            "feed": *self.feed.lock(),
            "filter": *self.filter.lock(),
            "sort": self.sort.map(|(key, asc)| json!({ "column": key.as_str(), "ascending": asc })),
            "notice": *self.notice.lock(),
        })
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["filter", "sort", "reload", "pay"]
    }

    fn invoke(&mut self, action: &str, args: &Value) -> Result<Value, ActionError> {
        match action {
            "filter" => {
                let filter = status_arg(action, args)?;
                *self.filter.lock() = filter;
                self.reload();
                Ok(json!({ "status": filter }))
            }
            "sort" => {
                let column = str_arg(action, args, "column")?;
                let key = SortKey::parse(&column).ok_or_else(|| ActionError::InvalidArgs {
                    action: action.to_string(),
                    reason: format!("unknown column '{}'", column),
                })?;
                // same column flips the direction
                let ascending = match self.sort {
                    Some((current, asc)) if current == key => !asc,
                    _ => true,
                };
                self.sort = Some((key, ascending));
                Ok(json!({ "column": key.as_str(), "ascending": ascending }))
            }
            "reload" => {
                self.reload();
                Ok(Value::Null)
            }
            "pay" => {
                let invoice_id = str_arg(action, args, "invoiceId")?;
                *self.notice.lock() = None;
                let notice = Arc::clone(&self.notice);
                spawn_mark_paid(&self.ctx, Arc::clone(&self.api), invoice_id.clone(), None, move |result| {
                    *notice.lock() = Some(match result {
                        Ok(invoice) => format!("Invoice {} marked as paid", invoice.invoice_number),
                        Err(e) => e.user_message(),
                    });
                });
                Ok(json!({ "pending": invoice_id }))
            }
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }
}

/// Factory for the `invoice-table` component.
///
/// Accepts an optional `status` prop as the initial filter.
pub fn invoice_table_factory(api: Arc<dyn InvoiceApi>) -> UiFactory {
    UiFactory::new("invoice-table", move |props, ctx| {
        let initial = match props.get("status").and_then(Value::as_str) {
            Some(status) => status.parse::<StatusFilter>()?,
            None => StatusFilter::All,
        };

        let table = InvoiceTable {
            api: Arc::clone(&api),
            ctx: ctx.clone(),
            filter: Arc::new(Mutex::new(initial)),
            feed: SharedFeed::default(),
            sort: None,
            notice: Arc::new(Mutex::new(None)),
        };
        table.reload();
        refetch_on_paid(ctx, Arc::clone(&api), Arc::clone(&table.filter), Arc::clone(&table.feed));
        Ok(Box::new(table) as Box<dyn Fragment>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::testing::{settle, FakeApi};
    use backend::seed_invoices;
    use bus::EventBus;
    use mount::{BindingModules, Container, FragmentMountAdapter, Props};
    use shared::{InvoicePaid, UiFramework};

    fn setup() -> (FragmentMountAdapter, Arc<FakeApi>, Container) {
        let adapter = FragmentMountAdapter::with_modules(EventBus::new(), BindingModules::new());
        (adapter, Arc::new(FakeApi::seeded()), Container::new("outlet"))
    }

    fn rows(container: &Container) -> usize {
        container
            .content()
            .map(|v| v.count_with_attr("class", "badge badge-success")
                + v.count_with_attr("class", "badge badge-warning")
                + v.count_with_attr("class", "badge badge-danger"))
            .unwrap_or(0)
    }

    // ============== Static View Tests ==============

    #[test]
    fn test_table_view_rows() {
        let view = invoice_table_view(&seed_invoices());
        let text = view.text_content();
        assert!(text.contains("INV-2025-001"));
        assert!(text.contains("$1,250.00"));
        assert_eq!(view.count_with_attr("class", "badge badge-warning"), 3);
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-003"), 1);
    }

    #[test]
    fn test_empty_table_view() {
        let view = invoice_table_view(&[]);
        assert!(view.text_content().contains("No invoices found"));
    }

    // ============== Mounted Fragment Tests ==============

    #[tokio::test]
    async fn test_loads_then_renders_rows() {
        let (adapter, api, container) = setup();
        let factory = invoice_table_factory(api.clone());
        adapter
            .mount(&factory, &container, Props::new(), UiFramework::Tree)
            .unwrap();
        assert!(container.content().unwrap().text_content().contains("Loading invoices..."));

        settle().await;
        assert_eq!(rows(&container), 5);
    }

    #[tokio::test]
    async fn test_filter_and_sort() {
        let (adapter, api, container) = setup();
        let factory = invoice_table_factory(api.clone());
        let handle = adapter
            .mount(&factory, &container, Props::new(), UiFramework::Tree)
            .unwrap();
        settle().await;

        adapter.invoke(&handle, "filter", &json!({ "status": "unpaid" })).unwrap();
        settle().await;
        assert_eq!(rows(&container), 3);

        adapter.invoke(&handle, "sort", &json!("amount")).unwrap();
        let desc = adapter.invoke(&handle, "sort", &json!("amount")).unwrap();
        assert_eq!(desc["ascending"], false);

        let model = adapter.model(&handle).unwrap();
        assert_eq!(model["feed"]["invoices"][0]["id"], "inv-001");
        let text = container.content().unwrap().text_content();
        let first = text.find("$2,100.00").unwrap();
        let last = text.find("$850.00").unwrap();
        assert!(first < last);
    }

    #[tokio::test]
    async fn test_pay_broadcasts_and_refreshes() {
        let (adapter, api, container) = setup();
        let paid_events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&paid_events);
        let _sub = adapter.bus().subscribe_typed(move |e: InvoicePaid| {
            sink.lock().push(e.invoice_id);
            Ok(())
        });

        let factory = invoice_table_factory(api.clone());
        let handle = adapter
            .mount(&factory, &container, Props::from_iter([("status".to_string(), json!("unpaid"))]), UiFramework::Tree)
            .unwrap();
        settle().await;
        assert_eq!(rows(&container), 3);

        adapter.invoke(&handle, "pay", &json!({ "invoiceId": "inv-004" })).unwrap();
        settle().await;

        assert_eq!(*paid_events.lock(), vec!["inv-004".to_string()]);
        assert_eq!(rows(&container), 2);
        assert!(container.content().unwrap().text_content().contains("Invoice INV-2025-004 marked as paid"));
    }

    mod edge_cases {
        use super::*;

        #[tokio::test]
        async fn test_bad_arguments() {
            let (adapter, api, container) = setup();
            let handle = adapter
                .mount(&invoice_table_factory(api), &container, Props::new(), UiFramework::Tree)
                .unwrap();

            assert!(matches!(
                adapter.invoke(&handle, "sort", &json!("colour")),
                Err(ActionError::InvalidArgs { .. })
            ));
            assert!(matches!(
                adapter.invoke(&handle, "filter", &json!({ "status": "refunded" })),
                Err(ActionError::InvalidArgs { .. })
            ));
            assert!(matches!(
                adapter.invoke(&handle, "pay", &json!(42)),
                Err(ActionError::InvalidArgs { .. })
            ));
        }

        #[tokio::test]
        async fn test_bad_status_prop_fails_mount() {
            let (adapter, api, container) = setup();
            let props = Props::from_iter([("status".to_string(), json!("refunded"))]);
            let err = adapter
                .mount(&invoice_table_factory(api), &container, props, UiFramework::Tree)
                .unwrap_err();
            assert!(err.to_string().contains("Unknown status filter"));
            assert!(container.is_empty());
        }

        #[tokio::test]
        async fn test_backend_down_shows_message() {
            let (adapter, api, container) = setup();
            api.set_offline(true);
            adapter
                .mount(&invoice_table_factory(api.clone()), &container, Props::new(), UiFramework::Tree)
                .unwrap();
            settle().await;
            assert!(container
                .content()
                .unwrap()
                .text_content()
                .contains("Cannot reach the billing service"));
        }
    }
}
