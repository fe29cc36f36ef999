//! paybridge invoices command

use clap::{Args, Subcommand};
use client::{filter_invoices, InvoiceApi};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use shared::{format_currency, InvoiceRecord, InvoiceStatus, StatusFilter};
use std::time::Duration;

#[derive(Debug, Args)]
pub struct InvoicesCommand {
    #[command(subcommand)]
    pub command: InvoicesSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum InvoicesSubcommand {
    /// List invoices
    List {
        /// all, paid, unpaid or overdue
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
        /// Client name or invoice number to look for
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark an invoice as paid
    Pay {
        /// Invoice id, e.g. inv-001
        id: String,
    },
}

impl InvoicesCommand {
    pub async fn run(&self, api: &dyn InvoiceApi) -> anyhow::Result<()> {
        match &self.command {
            InvoicesSubcommand::List { status, search, json } => {
                let spinner = spinner("Fetching invoices...");
                let result = list(api, *status, search.as_deref()).await;
                spinner.finish_and_clear();
                let invoices = result?;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&invoices)?);
                    return Ok(());
                }
                if invoices.is_empty() {
                    println!("No invoices found");
                    return Ok(());
                }
                println!("{}", style(header()).bold());
                for invoice in &invoices {
                    println!("{}", styled_line(invoice));
                }
            }
            InvoicesSubcommand::Pay { id } => {
                let spinner = spinner("Processing payment...");
                let result = api.mark_paid(id).await;
                spinner.finish_and_clear();

                match result {
                    Ok(invoice) => println!(
                        "{} Invoice {} marked as paid ({})",
                        style("✓").green(),
                        invoice.invoice_number,
                        format_currency(invoice.amount)
                    ),
                    Err(e) => anyhow::bail!(e.user_message()),
                }
            }
        }
        Ok(())
    }
}

/// Server-side status filter, then the client-side search
pub async fn list(
    api: &dyn InvoiceApi,
    status: StatusFilter,
    search: Option<&str>,
) -> anyhow::Result<Vec<InvoiceRecord>> {
    let invoices = api.list_invoices(status).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    Ok(match search {
        Some(term) => filter_invoices(&invoices, term),
        None => invoices,
    })
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn header() -> String {
    format!(
        "{:<14} {:<26} {:>12}  {:<8} {}",
        "INVOICE", "CLIENT", "AMOUNT", "STATUS", "DUE"
    )
}

/// One aligned, uncoloured table row
pub fn invoice_line(invoice: &InvoiceRecord) -> String {
    format!(
        "{:<14} {:<26} {:>12}  {:<8} {}",
        invoice.invoice_number,
        invoice.client_name,
        format_currency(invoice.amount),
        invoice.status.as_str(),
        invoice.due_date.format("%Y-%m-%d")
    )
}

fn styled_line(invoice: &InvoiceRecord) -> String {
    let line = invoice_line(invoice);
    match invoice.status {
        InvoiceStatus::Paid => style(line).green().to_string(),
        InvoiceStatus::Overdue => style(line).red().to_string(),
        InvoiceStatus::Unpaid => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::seed_invoices;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: InvoicesSubcommand,
    }

    // ============== Argument Tests ==============

    #[test]
    fn test_parse_list_arguments() {
        let harness = Harness::parse_from(["paybridge", "list", "--status", "unpaid", "-q", "acme"]);
        match harness.command {
            InvoicesSubcommand::List { status, search, json } => {
                assert_eq!(status, StatusFilter::Unpaid);
                assert_eq!(search.as_deref(), Some("acme"));
                assert!(!json);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_defaults_to_all() {
        let harness = Harness::parse_from(["paybridge", "list"]);
        assert!(matches!(
            harness.command,
            InvoicesSubcommand::List {
                status: StatusFilter::All,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(Harness::try_parse_from(["paybridge", "list", "--status", "refunded"]).is_err());
    }

    #[test]
    fn test_pay_requires_id() {
        assert!(Harness::try_parse_from(["paybridge", "pay"]).is_err());
        let harness = Harness::parse_from(["paybridge", "pay", "inv-004"]);
        assert!(matches!(harness.command, InvoicesSubcommand::Pay { ref id } if id == "inv-004"));
    }

    // ============== Output Tests ==============

    #[test]
    fn test_invoice_line() {
        let invoices = seed_invoices();
        let line = invoice_line(&invoices[0]);
        assert!(line.starts_with("INV-2025-001"));
        assert!(line.contains("Acme Corporation"));
        assert!(line.contains("$1,250.00"));
        assert!(line.ends_with("unpaid   2025-10-31"));
        assert_eq!(line.len(), header().len() - "DUE".len() + "2025-10-31".len());
    }
}
