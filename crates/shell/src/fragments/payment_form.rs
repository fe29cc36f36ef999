//! Payment form (tree-rendered)

use chrono::Utc;
use client::InvoiceApi;
use mount::{Fragment, MountContext, UiFactory, View};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use shared::{format_currency, ActionError, StatusFilter};
use std::sync::Arc;

use super::{fetch_into, refetch_on_paid, spawn_mark_paid, status_banner, str_arg, SharedFeed};
use crate::payment::{format_card_number, format_expiry, transaction_id, FieldErrors, PaymentForm};

/// Outcome of the last submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default)]
struct Checkout {
    form: PaymentForm,
    errors: FieldErrors,
    processing: bool,
    result: Option<PaymentResult>,
}

struct PaymentFormFragment {
    api: Arc<dyn InvoiceApi>,
    ctx: MountContext,
    feed: SharedFeed,
    checkout: Arc<Mutex<Checkout>>,
}

impl PaymentFormFragment {
    fn field(label: &str, name: &str, value: &str, error: Option<&&str>) -> View {
        let mut field = View::element("label")
            .attr("data-field", name)
            .child(View::text(format!("{}: {}", label, value)));
        if let Some(error) = error {
            field = field.child(View::element("span").attr("class", "error-text").child(View::text(*error)));
        }
        field
    }

    fn fill(&self, action: &str, args: &Value) -> Result<(), ActionError> {
        let Value::Object(fields) = args else {
            return Err(ActionError::InvalidArgs {
                action: action.to_string(),
                reason: "expected an object of form fields".to_string(),
            });
        };

        let mut checkout = self.checkout.lock();
        for (name, value) in fields {
            let value = value.as_str().unwrap_or_default();
            let key = match name.as_str() {
                "cardNumber" => {
                    checkout.form.card_number = format_card_number(value);
                    "cardNumber"
                }
                "expiryDate" => {
                    checkout.form.expiry_date = format_expiry(value);
                    "expiryDate"
                }
                "cvv" => {
                    checkout.form.cvv = value.chars().filter(char::is_ascii_digit).take(4).collect();
                    "cvv"
                }
                "cardholderName" => {
                    checkout.form.cardholder_name = value.to_string();
                    "cardholderName"
                }
                "selectedInvoiceId" => {
                    checkout.form.selected_invoice_id = value.to_string();
                    "selectedInvoiceId"
                }
                other => {
                    return Err(ActionError::InvalidArgs {
                        action: action.to_string(),
                        reason: format!("unknown field '{}'", other),
                    })
                }
            };
            // editing clears that field's error and the last outcome
            checkout.errors.remove(key);
            checkout.result = None;
        }
        Ok(())
    }

    fn submit(&self) -> Result<Value, ActionError> {
        let now = Utc::now();
        let invoice_id = {
            let mut checkout = self.checkout.lock();
            if checkout.processing {
                return Err(ActionError::InvalidArgs {
                    action: "submit".to_string(),
                    reason: "a payment is already being processed".to_string(),
                });
            }
            if let Err(errors) = checkout.form.validate(now) {
                checkout.errors = errors.clone();
                return Ok(json!({ "valid": false, "errors": errors }));
            }
            checkout.errors.clear();
            checkout.processing = true;
            checkout.result = None;
            checkout.form.selected_invoice_id.clone()
        };

        let txn = transaction_id(now);
        let checkout = Arc::clone(&self.checkout);
        let paid_txn = txn.clone();
        let started = spawn_mark_paid(
            &self.ctx,
            Arc::clone(&self.api),
            invoice_id.clone(),
            Some(txn.clone()),
            move |outcome| {
                let mut checkout = checkout.lock();
                checkout.processing = false;
                checkout.result = Some(match outcome {
                    Ok(invoice) => {
                        checkout.form = PaymentForm::default();
                        PaymentResult {
                            success: true,
                            message: "Payment processed successfully!".to_string(),
                            invoice_id: Some(invoice.id),
                            transaction_id: Some(paid_txn),
                        }
                    }
                    Err(e) => PaymentResult {
                        success: false,
                        message: e.user_message(),
                        invoice_id: None,
                        transaction_id: None,
                    },
                });
            },
        );

        if !started {
            let mut checkout = self.checkout.lock();
            checkout.processing = false;
            checkout.result = Some(PaymentResult {
                success: false,
                message: "Payment failed. Please try again.".to_string(),
                invoice_id: None,
                transaction_id: None,
            });
        }
        Ok(json!({ "valid": true, "invoiceId": invoice_id, "transactionId": txn }))
    }
}

impl Fragment for PaymentFormFragment {
    fn render(&self) -> View {
        let feed = self.feed.lock().clone();
        let checkout = self.checkout.lock();
        let form = &checkout.form;

        let selector = match status_banner(&feed) {
            Some(banner) => banner,
            None if feed.invoices.is_empty() => {
                View::element("p").attr("class", "empty").child(View::text("No unpaid invoices"))
            }
            None => View::element("ul").attr("class", "invoice-selector").children(feed.invoices.iter().map(|invoice| {
                let mut option = View::element("li")
                    .attr("data-invoice-id", invoice.id.clone())
                    .child(View::text(format!(
                        "{} - {} ({})",
                        invoice.invoice_number,
                        invoice.client_name,
                        format_currency(invoice.amount)
                    )));
                if invoice.id == form.selected_invoice_id {
                    option = option.attr("aria-selected", "true");
                }
                option
            })),
        };

        let masked: String = match form.card_number.len() {
            0 => String::new(),
            n if n > 4 => format!("**** {}", &form.card_number[n - 4..]),
            _ => form.card_number.clone(),
        };

        let mut root = View::element("div")
            .attr("class", "payment-form-container")
            .child(View::element("h2").child(View::text("Process Payment")))
            .child(selector)
            .child(Self::field(
                "Invoice",
                "selectedInvoiceId",
                &form.selected_invoice_id,
                checkout.errors.get("selectedInvoiceId"),
            ))
            .child(Self::field("Cardholder", "cardholderName", &form.cardholder_name, checkout.errors.get("cardholderName")))
            .child(Self::field("Card", "cardNumber", &masked, checkout.errors.get("cardNumber")))
            .child(Self::field("Expiry", "expiryDate", &form.expiry_date, checkout.errors.get("expiryDate")))
            .child(Self::field("CVV", "cvv", &"*".repeat(form.cvv.len()), checkout.errors.get("cvv")));

        if checkout.processing {
            root = root.child(View::element("div").attr("class", "processing").child(View::text("Processing payment...")));
        }
        if let Some(result) = &checkout.result {
            let class = if result.success { "result success" } else { "result failure" };
            let mut outcome = View::element("div").attr("class", class).child(View::text(result.message.clone()));
            if let Some(txn) = &result.transaction_id {
                outcome = outcome.child(View::text(format!("Transaction ID: {}", txn)));
            }
            root = root.child(outcome);
        }
        root
    }

    fn model(&self) -> Value {
        let checkout = self.checkout.lock();
        json!({
            "unpaid": self.feed.lock().invoices.len(),
            "form": checkout.form,
            "errors": checkout.errors,
            "processing": checkout.processing,
            "result": checkout.result,
        })
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["select", "fill", "submit", "reset", "reload"]
    }

    fn invoke(&mut self, action: &str, args: &Value) -> Result<Value, ActionError> {
        match action {
            "select" => {
                let id = str_arg(action, args, "invoiceId")?;
                self.fill(action, &json!({ "selectedInvoiceId": id }))?;
                Ok(Value::Null)
            }
            "fill" => {
                self.fill(action, args)?;
                Ok(Value::Null)
            }
            "submit" => self.submit(),
            "reset" => {
                let mut checkout = self.checkout.lock();
                if !checkout.processing {
                    *checkout = Checkout::default();
                }
                Ok(Value::Null)
            }
            "reload" => {
                fetch_into(&self.ctx, Arc::clone(&self.api), StatusFilter::Unpaid, Arc::clone(&self.feed));
                Ok(Value::Null)
            }
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }
}

/// Factory for the `payment-form` component.
///
/// An `invoiceId` prop preselects the invoice to pay.
pub fn payment_form_factory(api: Arc<dyn InvoiceApi>) -> UiFactory {
    UiFactory::new("payment-form", move |props, ctx| {
        let mut checkout = Checkout::default();
        if let Some(id) = props.get("invoiceId").and_then(Value::as_str) {
            checkout.form.selected_invoice_id = id.to_string();
        }

        let fragment = PaymentFormFragment {
            api: Arc::clone(&api),
            ctx: ctx.clone(),
            feed: SharedFeed::default(),
            checkout: Arc::new(Mutex::new(checkout)),
        };
        fetch_into(ctx, Arc::clone(&api), StatusFilter::Unpaid, Arc::clone(&fragment.feed));
        refetch_on_paid(
            ctx,
            Arc::clone(&api),
            Arc::new(Mutex::new(StatusFilter::Unpaid)),
            Arc::clone(&fragment.feed),
        );
        Ok(Box::new(fragment) as Box<dyn Fragment>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::testing::{settle, FakeApi};
    use bus::EventBus;
    use mount::{BindingModules, Container, FragmentMountAdapter, MountHandle, Props};
    use shared::{InvoicePaid, UiFramework};

    fn mount_form(api: Arc<FakeApi>) -> (FragmentMountAdapter, MountHandle, Container) {
        let adapter = FragmentMountAdapter::with_modules(EventBus::new(), BindingModules::new());
        let container = Container::new("outlet");
        let handle = adapter
            .mount(&payment_form_factory(api), &container, Props::new(), UiFramework::Tree)
            .unwrap();
        (adapter, handle, container)
    }

    fn card_details() -> Value {
        json!({
            "cardholderName": "Jane Doe",
            "cardNumber": "4242424242424242",
            "expiryDate": "1299",
            "cvv": "123",
        })
    }

    // ============== Form Tests ==============

    #[tokio::test]
    async fn test_lists_only_unpaid_invoices() {
        let (_adapter, _handle, container) = mount_form(Arc::new(FakeApi::seeded()));
        settle().await;

        let view = container.content().unwrap();
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-001"), 1);
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-002"), 0);
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-003"), 0);
    }

    #[tokio::test]
    async fn test_fill_formats_and_masks() {
        let (adapter, handle, container) = mount_form(Arc::new(FakeApi::seeded()));
        adapter.invoke(&handle, "fill", &card_details()).unwrap();

        let model = adapter.model(&handle).unwrap();
        assert_eq!(model["form"]["cardNumber"], "4242 4242 4242 4242");
        assert_eq!(model["form"]["expiryDate"], "12/99");

        let text = container.content().unwrap().text_content();
        assert!(text.contains("Card: **** 4242"));
        assert!(text.contains("CVV: ***"));
        assert!(!text.contains("4242 4242 4242 4242"));
    }

    #[tokio::test]
    async fn test_invalid_submit_shows_field_errors() {
        let (adapter, handle, container) = mount_form(Arc::new(FakeApi::seeded()));

        let result = adapter.invoke(&handle, "submit", &Value::Null).unwrap();
        assert_eq!(result["valid"], false);
        assert_eq!(result["errors"]["cvv"], "CVV is required");

        let view = container.content().unwrap();
        assert_eq!(view.count_with_attr("class", "error-text"), 5);

        adapter.invoke(&handle, "fill", &json!({ "cvv": "123" })).unwrap();
        assert_eq!(container.content().unwrap().count_with_attr("class", "error-text"), 4);
    }

    // ============== Payment Flow Tests ==============

    #[tokio::test]
    async fn test_successful_payment() {
        let api = Arc::new(FakeApi::seeded());
        let (adapter, handle, container) = mount_form(api.clone());
        settle().await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = adapter.bus().subscribe_typed(move |e: InvoicePaid| {
            sink.lock().push(e);
            Ok(())
        });

        adapter.invoke(&handle, "select", &json!("inv-004")).unwrap();
        adapter.invoke(&handle, "fill", &card_details()).unwrap();
        let submitted = adapter.invoke(&handle, "submit", &Value::Null).unwrap();
        assert_eq!(submitted["valid"], true);
        settle().await;

        let events = seen.lock().clone();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].invoice_id, "inv-004");
        assert_eq!(events[0].amount, 850.0);
        let txn = events[0].transaction_id.clone().unwrap();
        assert_eq!(submitted["transactionId"], txn);

        let view = container.content().unwrap();
        let text = view.text_content();
        assert!(text.contains("Payment processed successfully!"));
        assert!(text.contains(&format!("Transaction ID: {}", txn)));
        // paid invoice leaves the selector, form is reset
        assert_eq!(view.count_with_attr("data-invoice-id", "inv-004"), 0);
        assert_eq!(adapter.model(&handle).unwrap()["form"]["cardholderName"], "");
    }

    mod edge_cases {
        use super::*;

        #[tokio::test]
        async fn test_already_paid_is_reported() {
            let (adapter, handle, container) = mount_form(Arc::new(FakeApi::seeded()));
            adapter.invoke(&handle, "select", &json!("inv-002")).unwrap();
            adapter.invoke(&handle, "fill", &card_details()).unwrap();
            adapter.invoke(&handle, "submit", &Value::Null).unwrap();
            settle().await;

            let text = container.content().unwrap().text_content();
            assert!(text.contains("Invoice inv-002 has already been paid."));
            assert_eq!(container.content().unwrap().count_with_attr("class", "result failure"), 1);
            // the form keeps its input for another attempt
            assert_eq!(adapter.model(&handle).unwrap()["form"]["cardholderName"], "Jane Doe");
        }

        #[tokio::test]
        async fn test_unknown_field() {
            let (adapter, handle, _container) = mount_form(Arc::new(FakeApi::seeded()));
            assert!(matches!(
                adapter.invoke(&handle, "fill", &json!({ "pin": "0000" })),
                Err(ActionError::InvalidArgs { .. })
            ));
            assert!(matches!(
                adapter.invoke(&handle, "fill", &json!("4242")),
                Err(ActionError::InvalidArgs { .. })
            ));
        }

        #[tokio::test]
        async fn test_preselected_invoice_prop() {
            let adapter = FragmentMountAdapter::with_modules(EventBus::new(), BindingModules::new());
            let container = Container::new("outlet");
            let props = Props::from_iter([("invoiceId".to_string(), json!("inv-005"))]);
            let handle = adapter
                .mount(&payment_form_factory(Arc::new(FakeApi::seeded())), &container, props, UiFramework::Tree)
                .unwrap();
            assert_eq!(adapter.model(&handle).unwrap()["form"]["selectedInvoiceId"], "inv-005");
        }
    }
}
