//! Interactive REPL mode

use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Select};
use indicatif::ProgressBar;
use serde_json::Value;
use shell::{HostState, Shell};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Interactive shell driving the fragment outlet from the terminal
pub struct InteractiveCli {
    shell: Shell,
}

impl InteractiveCli {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", style("PayBridge Interactive Mode").bold());
        println!("Type /help for commands, /quit to exit");
        println!();
        info!("Interactive shell started");

        loop {
            let route = self
                .shell
                .current_route()
                .map(|r| r.path.clone())
                .unwrap_or_else(|| "-".to_string());
            print!("[{}] > ", route);
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            if !input.starts_with('/') {
                println!("Commands start with '/'. Type /help for the list.");
                continue;
            }

            match self.handle_command(input).await {
                Ok(true) => break,
                Ok(false) => continue,
                Err(e) => println!("{} {}", style("Error:").red(), e),
            }
        }

        let unmounted = self.shell.shutdown();
        info!(unmounted, "Interactive shell stopped");
        Ok(())
    }

    async fn handle_command(&mut self, input: &str) -> anyhow::Result<bool> {
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        debug!(command = cmd, "Handling command");

        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye!");
                return Ok(true);
            }
            "/help" | "/h" => {
                println!("Commands:");
                println!("  /nav [route]           - Show a route (pick one when omitted)");
                println!("  /routes                - List routes");
                println!("  /act <action> [json]   - Run an action on the current fragment");
                println!("  /actions               - List actions of the current fragment");
                println!("  /view                  - Print the outlet");
                println!("  /retry                 - Reload a fragment that failed to load");
                println!("  /mounts                - List live mounts");
                println!("  /theme [toggle]        - Show or toggle the theme");
                println!("  /status                - Backend connection status");
                println!("  /quit                  - Exit");
            }
            "/routes" => {
                for route in self.shell.routes().routes() {
                    println!("  {:<12} {:<16} {}", route.path, route.fragment, route.title);
                }
            }
            "/nav" => {
                let path = if rest.is_empty() {
                    match self.pick_route()? {
                        Some(path) => path,
                        None => return Ok(false),
                    }
                } else {
                    rest.to_string()
                };

                let spinner = ProgressBar::new_spinner();
                spinner.set_message(format!("Loading {}...", path));
                spinner.enable_steady_tick(Duration::from_millis(80));
                let result = self.shell.navigate(&path).await.map(describe);
                spinner.finish_and_clear();

                println!("{}", result?);
                self.print_view();
            }
            "/act" => {
                let (action, args) = parse_act(rest)?;
                let result = self.shell.act(&action, &args)?;
                if !result.is_null() {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                self.print_view();
            }
            "/actions" => {
                let actions = self.shell.actions();
                if actions.is_empty() {
                    println!("No fragment mounted");
                } else {
                    println!("Actions: {}", actions.join(", "));
                }
            }
            "/view" => self.print_view(),
            "/retry" => {
                let state = self.shell.retry().await?;
                println!("{}", describe(state));
                self.print_view();
            }
            "/mounts" => {
                let mounts = self.shell.mounts();
                if mounts.is_empty() {
                    println!("No live mounts");
                }
                for handle in mounts {
                    println!("  {} {} ({})", handle.id(), handle.fragment(), handle.framework());
                }
            }
            "/theme" => {
                let theme = match rest {
                    "" => self.shell.theme(),
                    "toggle" => self.shell.toggle_theme()?,
                    other => anyhow::bail!("Unknown theme argument '{}'", other),
                };
                println!("Theme: {}", theme.as_str());
            }
            "/status" => match self.shell.monitor() {
                Some(monitor) => {
                    println!("Backend: {:?}", monitor.status());
                    if let Some(error) = monitor.last_error() {
                        println!("Last error: {}", error);
                    }
                }
                None => println!("Connection monitor disabled"),
            },
            _ => {
                println!("Unknown command: {}", cmd);
            }
        }

        Ok(false)
    }

    fn pick_route(&self) -> anyhow::Result<Option<String>> {
        if !Term::stdout().is_term() {
            anyhow::bail!("Usage: /nav <route>");
        }
        let routes = self.shell.routes().routes();
        let labels: Vec<String> = routes.iter().map(|r| format!("{} ({})", r.title, r.path)).collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Go to")
            .items(&labels)
            .default(0)
            .interact_opt()?;
        Ok(choice.map(|i| routes[i].path.clone()))
    }

    fn print_view(&self) {
        if let Some(view) = self.shell.view() {
            println!("{}", style("─".repeat(40)).dim());
            for line in view.text_content().lines().filter(|l| !l.trim().is_empty()) {
                println!("  {}", line);
            }
            println!("{}", style("─".repeat(40)).dim());
        }
    }
}

fn describe(state: &HostState) -> String {
    match state {
        HostState::Idle => "Nothing mounted".to_string(),
        HostState::Mounted(handle) => format!("Mounted {} ({})", handle.fragment(), handle.framework()),
        HostState::Fallback { reason } => format!("Fallback: {} (use /retry)", reason),
    }
}

/// Split `/act` input into the action name and its JSON arguments.
///
/// Arguments that are not valid JSON are passed as a plain string.
fn parse_act(rest: &str) -> anyhow::Result<(String, Value)> {
    let (action, raw) = match rest.split_once(char::is_whitespace) {
        Some((action, raw)) => (action, raw.trim()),
        None => (rest, ""),
    };
    if action.is_empty() {
        anyhow::bail!("Usage: /act <action> [json]");
    }

    let args = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    };
    Ok((action.to_string(), args))
}
