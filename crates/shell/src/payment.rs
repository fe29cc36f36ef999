//! Payment form validation and transaction ids

use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static EXPIRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])/([0-9]{2})$").expect("valid expiry regex"));
static CARD_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{16}$").expect("valid card regex"));
static CVV: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3,4}$").expect("valid cvv regex"));

/// Payment form fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub selected_invoice_id: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
}

/// Field name to message
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

impl PaymentForm {
    /// Validate every field, collecting one message per failing field
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.selected_invoice_id.trim().is_empty() {
            errors.insert("selectedInvoiceId", "Please select an invoice");
        }

        let name = self.cardholder_name.trim();
        if name.is_empty() {
            errors.insert("cardholderName", "Cardholder name is required");
        } else if name.chars().count() < 3 {
            errors.insert("cardholderName", "Name must be at least 3 characters");
        }

        let card: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        if card.is_empty() {
            errors.insert("cardNumber", "Card number is required");
        } else if !CARD_NUMBER.is_match(&card) {
            errors.insert("cardNumber", "Card number must be 16 digits");
        }

        if self.expiry_date.is_empty() {
            errors.insert("expiryDate", "Expiry date is required");
        } else {
            match EXPIRY.captures(&self.expiry_date) {
                None => {
                    errors.insert("expiryDate", "Format must be MM/YY");
                }
                Some(caps) => {
                    let month: u32 = caps[1].parse().unwrap_or(0);
                    let year: i32 = caps[2].parse().unwrap_or(0);
                    let current_year = now.year() % 100;
                    if year < current_year || (year == current_year && month < now.month()) {
                        errors.insert("expiryDate", "Card is expired");
                    }
                }
            }
        }

        if self.cvv.is_empty() {
            errors.insert("cvv", "CVV is required");
        } else if !CVV.is_match(&self.cvv) {
            errors.insert("cvv", "CVV must be 3-4 digits");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Keep the first 16 digits, grouped by four
pub fn format_card_number(input: &str) -> String {
    let digits: Vec<char> = input.chars().filter(char::is_ascii_digit).take(16).collect();
    digits
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `MMYY` digits as `MM/YY`
pub fn format_expiry(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).take(4).collect();
    if digits.len() >= 2 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

/// `TXN-<millis>-<9 uppercase alphanumerics>`
pub fn transaction_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("TXN-{}-{}", now.timestamp_millis(), suffix)
}
