//! Analytics dashboard (tree-rendered)

use chrono::{DateTime, Utc};
use client::InvoiceApi;
use mount::{Fragment, MountContext, UiFactory, View};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use shared::{format_currency, ActionError, InvoicePaid, InvoiceRecord, InvoiceStatus, StatusFilter, Theme, ThemeChanged};
use std::sync::Arc;

use super::{fetch_into, refetch_on_paid, status_banner, SharedFeed};

/// Totals and counts per status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub total: usize,
    pub paid: usize,
    pub unpaid: usize,
    /// Marked overdue, or unpaid past the due date
    pub overdue: usize,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub outstanding_amount: f64,
}

impl InvoiceStats {
    pub fn from_records(records: &[InvoiceRecord], now: DateTime<Utc>) -> Self {
        let mut stats = InvoiceStats {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            stats.total_amount += record.amount;
            match record.status {
                InvoiceStatus::Paid => {
                    stats.paid += 1;
                    stats.paid_amount += record.amount;
                }
                InvoiceStatus::Overdue => stats.overdue += 1,
                InvoiceStatus::Unpaid if record.is_overdue(now) => stats.overdue += 1,
                InvoiceStatus::Unpaid => stats.unpaid += 1,
            }
        }
        stats.outstanding_amount = stats.total_amount - stats.paid_amount;
        stats
    }

    /// Share of the billed amount already collected, in percent
    pub fn collection_rate(&self) -> f64 {
        if self.total_amount <= 0.0 {
            return 0.0;
        }
        self.paid_amount / self.total_amount * 100.0
    }
}

struct Analytics {
    api: Arc<dyn InvoiceApi>,
    ctx: MountContext,
    feed: SharedFeed,
    last_payment: Arc<Mutex<Option<InvoicePaid>>>,
    theme: Arc<Mutex<Theme>>,
}

impl Analytics {
    fn stats(&self) -> InvoiceStats {
        InvoiceStats::from_records(&self.feed.lock().invoices, Utc::now())
    }
}

fn metric(label: &str, value: String) -> View {
    View::element("div")
        .attr("class", "metric")
        .child(View::element("span").attr("class", "metric-label").child(View::text(label)))
        .child(View::element("span").attr("class", "metric-value").child(View::text(value)))
}

impl Fragment for Analytics {
    fn render(&self) -> View {
        let feed = self.feed.lock().clone();
        let root = View::element("div")
            .attr("class", "analysis-app-container")
            .attr("data-theme", self.theme.lock().as_str())
            .child(View::element("h2").child(View::text("Analysis Dashboard")));

        if let Some(banner) = status_banner(&feed) {
            return root.child(banner);
        }

        let stats = InvoiceStats::from_records(&feed.invoices, Utc::now());
        let mut root = root
            .child(metric("Invoices", stats.total.to_string()))
            .child(metric("Paid", stats.paid.to_string()))
            .child(metric("Unpaid", stats.unpaid.to_string()))
            .child(metric("Overdue", stats.overdue.to_string()))
            .child(metric("Total billed", format_currency(stats.total_amount)))
            .child(metric("Collected", format_currency(stats.paid_amount)))
            .child(metric("Outstanding", format_currency(stats.outstanding_amount)))
            .child(metric("Collection rate", format!("{:.1}%", stats.collection_rate())));

        if let Some(payment) = self.last_payment.lock().as_ref() {
            root = root.child(
                View::element("p").attr("class", "last-payment").child(View::text(format!(
                    "Last payment: {} {}",
                    payment.invoice_number,
                    format_currency(payment.amount)
                ))),
            );
        }
        root
    }

    fn model(&self) -> Value {
        json!({
            "stats": self.stats(),
            "lastPayment": *self.last_payment.lock(),
            "theme": *self.theme.lock(),
        })
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["refresh"]
    }

    fn invoke(&mut self, action: &str, _args: &Value) -> Result<Value, ActionError> {
        match action {
            "refresh" => {
                fetch_into(&self.ctx, Arc::clone(&self.api), StatusFilter::All, Arc::clone(&self.feed));
                Ok(Value::Null)
            }
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }
}

/// Factory for the `analytics-dashboard` component
pub fn analytics_factory(api: Arc<dyn InvoiceApi>) -> UiFactory {
    UiFactory::new("analytics-dashboard", move |props, ctx| {
        let theme = props
            .get("theme")
            .and_then(Value::as_str)
            .and_then(Theme::parse)
            .unwrap_or_default();

        let dashboard = Analytics {
            api: Arc::clone(&api),
            ctx: ctx.clone(),
            feed: SharedFeed::default(),
            last_payment: Arc::new(Mutex::new(None)),
            theme: Arc::new(Mutex::new(theme)),
        };

        fetch_into(ctx, Arc::clone(&api), StatusFilter::All, Arc::clone(&dashboard.feed));
        refetch_on_paid(
            ctx,
            Arc::clone(&api),
            Arc::new(Mutex::new(StatusFilter::All)),
            Arc::clone(&dashboard.feed),
        );

        let last_payment = Arc::clone(&dashboard.last_payment);
        ctx.subscribe_typed(move |event: InvoicePaid| {
            *last_payment.lock() = Some(event);
            Ok(())
        });

        let theme = Arc::clone(&dashboard.theme);
        let theme_ctx = ctx.clone();
        ctx.subscribe_typed(move |event: ThemeChanged| {
            *theme.lock() = event.theme;
            theme_ctx.request_render();
            Ok(())
        });

        Ok(Box::new(dashboard) as Box<dyn Fragment>)
    })
}
