//! PayBridge CLI - Command-line interface for PayBridge
//!
//! Usage:
//!   paybridge                              - Start the interactive shell
//!   paybridge serve [--port <port>]        - Run the mock invoice API
//!   paybridge invoices list [--status <s>] - List invoices
//!   paybridge invoices pay <id>            - Mark an invoice as paid
//!   paybridge fragments list [--check]     - Show configured fragments
//!   paybridge theme [toggle|light|dark]    - Show or change the theme

mod commands;
mod interactive;

use bus::{EventBus, FileStorage};
use clap::{Parser, Subcommand};
use client::ConnectionMonitor;
use commands::{FragmentsCommand, GlobalOpts, InvoicesCommand, ServeCommand, ThemeCommand};
use interactive::InteractiveCli;
use shell::Shell;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paybridge")]
#[command(about = "PayBridge - Micro-frontend billing shell and mock invoice API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mock invoice API
    Serve(ServeCommand),
    /// Query and pay invoices
    Invoices(InvoicesCommand),
    /// Inspect the fragment registry
    Fragments(FragmentsCommand),
    /// Show or change the colour theme
    Theme(ThemeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = cli.opts;

    match cli.command {
        Some(Commands::Serve(cmd)) => cmd.run().await,
        Some(Commands::Invoices(cmd)) => cmd.run(&opts.invoice_client()?).await,
        Some(Commands::Fragments(cmd)) => cmd.run(&opts, Arc::new(opts.invoice_client()?)).await,
        Some(Commands::Theme(cmd)) => cmd.run(&opts.settings),
        None => {
            // No subcommand - start the interactive shell
            let client = opts.invoice_client()?;
            let bus = EventBus::global().clone();
            let shell = Shell::new(
                opts.shell_config()?,
                Arc::new(client.clone()),
                bus.clone(),
                Box::new(FileStorage::new(&opts.settings)),
            )?
            .with_monitor(ConnectionMonitor::new(client, bus));

            let mut interactive = InteractiveCli::new(shell);
            interactive.run().await
        }
    }
}
