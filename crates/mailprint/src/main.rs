//! CLI entry point for `mailprint`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use mailprint::{diagnostics, find_config, load_config, logging, Config, PollCycle};

#[derive(Parser)]
#[command(name = "mailprint", version, about = "Print PDF attachments arriving in a mailbox")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./mailprint.yaml, then /etc/mailprint.yaml)
    #[arg(short, long, global = true, env = "MAILPRINT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the mailbox until interrupted (default)
    Run,
    /// Run a single poll tick and exit
    Once,
    /// List print queues and mail folders
    List,
    /// Validate the config file and resolve the password
    Check,
}

/// Commands that need the runtime.
enum Mode {
    Run,
    Once,
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = find_config(cli.config.as_deref())?;
    let config = load_config(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let mode = match cli.command.unwrap_or(Commands::Run) {
        Commands::Check => {
            config.mailbox.password()?;
            if let Some(source) = config.mailbox.password_source() {
                println!("Password resolved from {}", source);
            }
            println!("Configuration OK: {}", path.display());
            return Ok(());
        }
        Commands::Run => Mode::Run,
        Commands::Once => Mode::Once,
        Commands::List => Mode::List,
    };

    logging::init(&config.logging, cli.verbose);
    info!(config = %path.display(), "Starting mailprint");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(execute(mode, &config))
}

async fn execute(mode: Mode, config: &Config) -> anyhow::Result<()> {
    let cycle = PollCycle::from_config(config)?;

    match mode {
        Mode::Run => {
            cycle
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Cannot listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }
        Mode::Once => {
            let report = cycle.run_tick().await;
            if !report.errors.is_empty() {
                anyhow::bail!("Tick finished with errors: {}", report.errors.join("; "));
            }
        }
        Mode::List => {
            let inventory = diagnostics::collect(cycle.mailbox(), cycle.dispatcher()).await;
            print!("{}", inventory.render());
        }
    }

    info!("mailprint stopped");
    Ok(())
}
