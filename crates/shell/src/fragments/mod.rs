//! Built-in fragments served by the bundled remotes

pub mod analytics;
pub mod invoice_list;
pub mod invoice_table;
pub mod payment_form;

pub use analytics::{analytics_factory, InvoiceStats};
pub use invoice_list::invoice_list_factory;
pub use invoice_table::{invoice_table_factory, invoice_table_view};
pub use payment_form::payment_form_factory;

use chrono::Utc;
use client::InvoiceApi;
use mount::{MountContext, View};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use shared::{ActionError, BackendError, InvoicePaid, InvoiceRecord, StatusFilter, INVOICE_PAID};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Invoice list state shared between a fragment and its fetch tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InvoiceFeed {
    pub invoices: Vec<InvoiceRecord>,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(skip)]
    generation: u64,
}

pub(crate) type SharedFeed = Arc<Mutex<InvoiceFeed>>;

/// Fetch invoices into `feed` on the mount's runtime, then re-render.
///
/// Only the most recent fetch may write its result.
pub(crate) fn fetch_into(ctx: &MountContext, api: Arc<dyn InvoiceApi>, filter: StatusFilter, feed: SharedFeed) {
    let generation = {
        let mut state = feed.lock();
        state.generation += 1;
        state.loading = true;
        state.error = None;
        state.generation
    };

    let task_ctx = ctx.clone();
    let task_feed = Arc::clone(&feed);
    let started = ctx.spawn(async move {
        let result = api.list_invoices(filter).await;
        {
            let mut state = task_feed.lock();
            if state.generation != generation {
                debug!(fragment = %task_ctx.fragment(), "Discarding stale invoice fetch");
                return;
            }
            state.loading = false;
            match result {
                Ok(invoices) => state.invoices = invoices,
                Err(e) => {
                    warn!(fragment = %task_ctx.fragment(), error = %e, "Failed to load invoices");
                    state.error = Some(e.user_message());
                }
            }
        }
        task_ctx.request_render();
    });

    if !started {
        let mut state = feed.lock();
        state.loading = false;
        state.error = Some("Invoices cannot be loaded right now.".to_string());
    }
}

/// Refetch whenever an invoice is paid anywhere in the shell
pub(crate) fn refetch_on_paid(ctx: &MountContext, api: Arc<dyn InvoiceApi>, filter: Arc<Mutex<StatusFilter>>, feed: SharedFeed) {
    let handler_ctx = ctx.clone();
    ctx.subscribe(INVOICE_PAID, move |_| {
        let current = *filter.lock();
        fetch_into(&handler_ctx, Arc::clone(&api), current, Arc::clone(&feed));
        Ok(())
    });
}

/// Mark `invoice_id` paid and broadcast [`InvoicePaid`] on success.
///
/// `done` sees the outcome after the broadcast; the mount re-renders afterwards.
pub(crate) fn spawn_mark_paid<F>(
    ctx: &MountContext,
    api: Arc<dyn InvoiceApi>,
    invoice_id: String,
    transaction_id: Option<String>,
    done: F,
) -> bool
where
    F: FnOnce(Result<InvoiceRecord, BackendError>) + Send + 'static,
{
    let task_ctx = ctx.clone();
    ctx.spawn(async move {
        let result = api.mark_paid(&invoice_id).await;
        match &result {
            Ok(invoice) => {
                info!(
                    fragment = %task_ctx.fragment(),
                    invoice = %invoice.invoice_number,
                    "Payment recorded"
                );
                task_ctx.bus().emit_typed(&InvoicePaid {
                    invoice_id: invoice.id.clone(),
                    invoice_number: invoice.invoice_number.clone(),
                    amount: invoice.amount,
                    transaction_id,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => warn!(fragment = %task_ctx.fragment(), invoice = %invoice_id, error = %e, "Payment failed"),
        }
        done(result);
        task_ctx.request_render();
    })
}

/// Loading and error banners shared by the invoice views
pub(crate) fn status_banner(feed: &InvoiceFeed) -> Option<View> {
    if let Some(error) = &feed.error {
        return Some(View::element("div").attr("class", "error").child(View::text(error.clone())));
    }
    if feed.loading {
        return Some(View::element("div").attr("class", "loading").child(View::text("Loading invoices...")));
    }
    None
}

/// String argument `key`, or the whole argument when it is a bare string
pub(crate) fn str_arg(action: &str, args: &Value, key: &str) -> Result<String, ActionError> {
    let value = match args {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(key).and_then(Value::as_str),
        _ => None,
    };
    value.map(str::to_string).ok_or_else(|| ActionError::InvalidArgs {
        action: action.to_string(),
        reason: format!("expected a string '{}'", key),
    })
}

pub(crate) fn status_arg(action: &str, args: &Value) -> Result<StatusFilter, ActionError> {
    let raw = str_arg(action, args, "status")?;
    raw.parse().map_err(|reason| ActionError::InvalidArgs {
        action: action.to_string(),
        reason,
    })
}
