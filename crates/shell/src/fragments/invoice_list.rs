//! Invoice list with search and details (binding runtime)
//!
//! State changes made from tasks or bus handlers are picked up by the
//! binding runtime's digest, so every handler that mutates shared state
//! ends with `request_render`.

use chrono::Utc;
use client::{filter_invoices, InvoiceApi};
use mount::{Fragment, MountContext, UiFactory, View};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared::{format_currency, ActionError, InvoiceRecord, StatusFilter, BACKEND_CONNECTED};
use std::sync::Arc;
use tracing::info;

use super::{fetch_into, refetch_on_paid, spawn_mark_paid, status_arg, status_banner, str_arg, InvoiceStats, SharedFeed};

struct InvoiceList {
    api: Arc<dyn InvoiceApi>,
    ctx: MountContext,
    filter: Arc<Mutex<StatusFilter>>,
    feed: SharedFeed,
    search: String,
    selected: Option<String>,
    notice: Arc<Mutex<Option<String>>>,
}

impl InvoiceList {
    fn visible(&self) -> Vec<InvoiceRecord> {
        filter_invoices(&self.feed.lock().invoices, &self.search)
    }

    fn reload(&self) {
        let filter = *self.filter.lock();
        fetch_into(&self.ctx, Arc::clone(&self.api), filter, Arc::clone(&self.feed));
    }

    fn selected_record(&self) -> Option<InvoiceRecord> {
        let id = self.selected.as_deref()?;
        self.feed.lock().invoices.iter().find(|i| i.id == id).cloned()
    }

    fn row(invoice: &InvoiceRecord) -> View {
        let mut row = View::element("li")
            .attr("data-invoice-id", invoice.id.clone())
            .attr("class", invoice.status.badge_class())
            .child(View::text(format!(
                "{}  {}  {}  {}",
                invoice.invoice_number,
                invoice.client_name,
                format_currency(invoice.amount),
                invoice.status
            )));
        if !invoice.is_paid() {
            row = row.child(View::element("button").attr("data-action", "pay").child(View::text("Mark as Paid")));
        }
        row
    }

    fn details(invoice: &InvoiceRecord) -> View {
        let items = invoice.items.iter().map(|item| {
            View::element("li").child(View::text(format!(
                "{} x{} @ {} = {}",
                item.description,
                item.quantity,
                format_currency(item.unit_price),
                format_currency(item.total)
            )))
        });

        let mut details = View::element("div")
            .attr("class", "invoice-details")
            .child(View::element("h3").child(View::text(invoice.invoice_number.clone())))
            .child(View::text(format!("{} <{}>", invoice.client_name, invoice.client_email)))
            .child(View::text(format!("Due {}", invoice.due_date.format("%Y-%m-%d"))))
            .child(View::element("ul").children(items));
        if let Some(paid) = invoice.paid_date {
            details = details.child(View::text(format!("Paid {}", paid.format("%Y-%m-%d"))));
        }
        details
    }
}

impl Fragment for InvoiceList {
    fn render(&self) -> View {
        let feed = self.feed.lock().clone();
        let stats = InvoiceStats::from_records(&feed.invoices, Utc::now());

        let mut root = View::element("div")
            .attr("class", "invoice-app")
            .child(View::element("h2").child(View::text("Invoices")))
            .child(View::element("p").attr("class", "stats").child(View::text(format!(
                "{} invoices, {} paid, {} unpaid, {} overdue, total {}",
                stats.total,
                stats.paid,
                stats.unpaid,
                stats.overdue,
                format_currency(stats.total_amount)
            ))));

        if let Some(notice) = self.notice.lock().clone() {
            root = root.child(View::element("div").attr("class", "notice").child(View::text(notice)));
        }
        if let Some(banner) = status_banner(&feed) {
            return root.child(banner);
        }

        let visible = self.visible();
        root = if visible.is_empty() {
            root.child(View::element("p").attr("class", "empty").child(View::text("No invoices match your search")))
        } else {
            root.child(View::element("ul").attr("class", "invoice-list").children(visible.iter().map(Self::row)))
        };

        match self.selected_record() {
            Some(invoice) => root.child(Self::details(&invoice)),
            None => root,
        }
    }

    fn model(&self) -> Value {
        json!({
            "feed": *self.feed.lock(),
            "filter": *self.filter.lock(),
            "search": self.search,
            "selected": self.selected,
            "notice": *self.notice.lock(),
        })
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["search", "filter", "reload", "select", "close", "pay"]
    }

    fn invoke(&mut self, action: &str, args: &Value) -> Result<Value, ActionError> {
        match action {
            "search" => {
                self.search = str_arg(action, args, "term")?;
                Ok(json!({ "matches": self.visible().len() }))
            }
            "filter" => {
                let filter = status_arg(action, args)?;
                *self.filter.lock() = filter;
                self.reload();
                Ok(json!({ "status": filter }))
            }
            "reload" => {
                self.reload();
                Ok(Value::Null)
            }
            "select" => {
                let id = str_arg(action, args, "invoiceId")?;
                if !self.feed.lock().invoices.iter().any(|i| i.id == id) {
                    return Err(ActionError::InvalidArgs {
                        action: action.to_string(),
                        reason: format!("no invoice '{}' in the list", id),
                    });
                }
                self.selected = Some(id);
                Ok(Value::Null)
            }
            "close" => {
                self.selected = None;
                Ok(Value::Null)
            }
            "pay" => {
                let invoice_id = str_arg(action, args, "invoiceId")?;
                *self.notice.lock() = None;
                let notice = Arc::clone(&self.notice);
                spawn_mark_paid(&self.ctx, Arc::clone(&self.api), invoice_id.clone(), None, move |result| {
                    *notice.lock() = Some(match result {
                        Ok(_) => "Invoice marked as paid successfully!".to_string(),
                        Err(e) => e.user_message(),
                    });
                });
                Ok(json!({ "pending": invoice_id }))
            }
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }

    fn on_unmount(&mut self) {
        info!(mount = %self.ctx.mount_id(), "Invoice list closed");
    }
}

/// Factory for the `invoice-list` component
pub fn invoice_list_factory(api: Arc<dyn InvoiceApi>) -> UiFactory {
    UiFactory::new("invoice-list", move |props, ctx| {
        let initial = match props.get("status").and_then(Value::as_str) {
            Some(status) => status.parse::<StatusFilter>()?,
            None => StatusFilter::All,
        };

        let list = InvoiceList {
            api: Arc::clone(&api),
            ctx: ctx.clone(),
            filter: Arc::new(Mutex::new(initial)),
            feed: SharedFeed::default(),
            search: String::new(),
            selected: None,
            notice: Arc::new(Mutex::new(None)),
        };
        list.reload();
        refetch_on_paid(ctx, Arc::clone(&api), Arc::clone(&list.filter), Arc::clone(&list.feed));

        // reload once the backend comes back
        let reconnect_api = Arc::clone(&api);
        let filter = Arc::clone(&list.filter);
        let feed = Arc::clone(&list.feed);
        let reconnect_ctx = ctx.clone();
        ctx.subscribe(BACKEND_CONNECTED, move |_| {
            let current = *filter.lock();
            fetch_into(&reconnect_ctx, Arc::clone(&reconnect_api), current, Arc::clone(&feed));
            reconnect_ctx.request_render();
            Ok(())
        });

        Ok(Box::new(list) as Box<dyn Fragment>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::testing::{settle, FakeApi};
    use bus::EventBus;
    use mount::{BindingModules, Container, FragmentMountAdapter, MountHandle, Props};
    use shared::{InvoicePaid, UiFramework};

    fn mount_list(api: Arc<FakeApi>) -> (FragmentMountAdapter, MountHandle, Container) {
        let adapter = FragmentMountAdapter::with_modules(EventBus::new(), BindingModules::new());
        let container = Container::new("outlet");
        let handle = adapter
            .mount(&invoice_list_factory(api), &container, Props::new(), UiFramework::Binding)
            .unwrap();
        (adapter, handle, container)
    }

    fn listed(container: &Container) -> usize {
        let view = container.content().unwrap();
        ["badge-success", "badge-warning", "badge-danger"]
            .iter()
            .map(|class| view.count_with_attr("class", class))
            .sum()
    }

    // ============== Loading Tests ==============

    #[tokio::test]
    async fn test_renders_after_fetch() {
        let (_adapter, _handle, container) = mount_list(Arc::new(FakeApi::seeded()));
        assert!(container.content().unwrap().text_content().contains("Loading invoices..."));

        settle().await;
        assert_eq!(listed(&container), 5);
        assert!(container.content().unwrap().text_content().contains("5 invoices"));
    }

    #[tokio::test]
    async fn test_search_is_client_side() {
        let api = Arc::new(FakeApi::seeded());
        let (adapter, handle, container) = mount_list(api.clone());
        settle().await;

        let result = adapter.invoke(&handle, "search", &json!({ "term": "ACME" })).unwrap();
        assert_eq!(result["matches"], 1);
        assert_eq!(listed(&container), 1);
        assert_eq!(api.list_calls(), 1);

        adapter.invoke(&handle, "search", &json!("nobody")).unwrap();
        assert!(container.content().unwrap().text_content().contains("No invoices match your search"));
    }

    #[tokio::test]
    async fn test_filter_refetches() {
        let api = Arc::new(FakeApi::seeded());
        let (adapter, handle, container) = mount_list(api.clone());
        settle().await;

        adapter.invoke(&handle, "filter", &json!({ "status": "paid" })).unwrap();
        settle().await;
        assert_eq!(listed(&container), 1);
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_select_shows_details() {
        let (adapter, handle, container) = mount_list(Arc::new(FakeApi::seeded()));
        settle().await;

        adapter.invoke(&handle, "select", &json!({ "invoiceId": "inv-003" })).unwrap();
        let text = container.content().unwrap().text_content();
        assert!(text.contains("accounts@globalent.com"));
        assert!(text.contains("Cloud Infrastructure Setup x1 @ $3,000.00 = $3,000.00"));

        adapter.invoke(&handle, "close", &Value::Null).unwrap();
        assert!(!container.content().unwrap().text_content().contains("accounts@globalent.com"));
    }

    // ============== Cross-Fragment Tests ==============

    #[tokio::test]
    async fn test_pay_emits_and_reloads() {
        let api = Arc::new(FakeApi::seeded());
        let (adapter, handle, container) = mount_list(api.clone());
        settle().await;

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _sub = adapter.bus().subscribe_typed(move |e: InvoicePaid| {
            *sink.lock() = Some(e);
            Ok(())
        });

        adapter.invoke(&handle, "pay", &json!({ "invoiceId": "inv-001" })).unwrap();
        settle().await;

        let event = seen.lock().clone().unwrap();
        assert_eq!(event.invoice_number, "INV-2025-001");
        assert_eq!(event.amount, 1250.0);
        assert!(event.transaction_id.is_none());

        let text = container.content().unwrap().text_content();
        assert!(text.contains("Invoice marked as paid successfully!"));
        assert!(text.contains("2 paid"));
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_paid_elsewhere_triggers_digest() {
        let api = Arc::new(FakeApi::seeded());
        let (adapter, _handle, container) = mount_list(api.clone());
        settle().await;

        api.mark_paid("inv-005").await.unwrap();
        adapter.bus().emit_typed(&InvoicePaid {
            invoice_id: "inv-005".to_string(),
            invoice_number: "INV-2025-005".to_string(),
            amount: 2100.0,
            transaction_id: Some("TXN-1-ABCDEFGHI".to_string()),
            timestamp: Utc::now(),
        });
        settle().await;

        assert!(container.content().unwrap().text_content().contains("2 paid"));
    }

    mod edge_cases {
        use super::*;

        #[tokio::test]
        async fn test_pay_twice_reports_already_paid() {
            let (adapter, handle, container) = mount_list(Arc::new(FakeApi::seeded()));
            settle().await;

            adapter.invoke(&handle, "pay", &json!("inv-002")).unwrap();
            settle().await;
            assert!(container
                .content()
                .unwrap()
                .text_content()
                .contains("Invoice inv-002 has already been paid."));
        }

        #[tokio::test]
        async fn test_reconnect_reloads() {
            let api = Arc::new(FakeApi::seeded());
            api.set_offline(true);
            let (adapter, _handle, container) = mount_list(api.clone());
            settle().await;
            assert!(container.content().unwrap().text_content().contains("Cannot reach the billing service"));

            api.set_offline(false);
            adapter.bus().emit(BACKEND_CONNECTED, serde_json::Map::new());
            settle().await;
            assert_eq!(listed(&container), 5);
        }

        #[tokio::test]
        async fn test_select_unknown_invoice() {
            let (adapter, handle, _container) = mount_list(Arc::new(FakeApi::seeded()));
            settle().await;
            assert!(matches!(
                adapter.invoke(&handle, "select", &json!("inv-999")),
                Err(ActionError::InvalidArgs { .. })
            ));
        }
    }
}
