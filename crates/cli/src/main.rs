//! Pending queue CLI - operator tooling over the durable pending execution queue

mod settings;
mod telemetry;
mod wiring;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pending_core::domain::{ExecutionId, Message, PipelineConfigKey};
use pending_core::port::ExecutionRepository;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::debug;

#[derive(Parser)]
#[command(name = "pending-queue")]
#[command(about = "Pending execution queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); missing file means defaults
    #[arg(long, default_value = settings::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log output format (pretty or json)
    #[arg(long, env = "PENDING_QUEUE_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Park a message for a pipeline config key
    Enqueue {
        /// Pipeline config key
        key: String,

        /// Start this execution once the key is free
        #[arg(long, conflicts_with = "advisory", required_unless_present = "advisory")]
        execution: Option<String>,

        /// Queue an advisory message with this name instead
        #[arg(long)]
        advisory: Option<String>,

        /// Record the execution as NOT_STARTED first, so saturation can cancel it
        #[arg(long, requires = "execution")]
        register: bool,
    },

    /// Number of entries parked for a key
    Depth { key: String },

    /// Remove and print the next message for a key
    Pop {
        key: String,

        /// Take the most recently enqueued entry instead of the oldest
        #[arg(long)]
        newest: bool,
    },

    /// Drain every entry for a key, oldest first
    Purge { key: String },

    /// Show an execution's status
    Execution { id: String },

    /// List delayed re-examination signals that are due
    Signals {
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Tabled)]
struct SignalRow {
    id: String,
    kind: String,
    message: String,
    deliver_at: i64,
}

fn parse_key(raw: &str) -> Result<PipelineConfigKey> {
    PipelineConfigKey::parse(raw).context("Invalid pipeline config key")
}

fn print_message(message: &Message) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(message)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_logging(&cli.log_format)?;

    let config = settings::load(&cli.config)?;

    if let Commands::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let wiring = wiring::build(&config).await?;
    let queue = &wiring.queue;

    match cli.command {
        Commands::Enqueue {
            key,
            execution,
            advisory,
            register,
        } => {
            let key = parse_key(&key)?;
            let message = match (execution, advisory) {
                (Some(execution), _) => {
                    let execution_id = ExecutionId::new(execution);
                    if register {
                        wiring
                            .executions
                            .insert_not_started(&execution_id, Some(&key))
                            .await?;
                    }
                    Message::StartExecution { execution_id }
                }
                (None, Some(name)) => Message::advisory(name),
                (None, None) => bail!("Either --execution or --advisory is required"),
            };

            queue.enqueue(&key, message).await?;

            let stats = wiring.metrics.snapshot();
            if stats.enqueued > 0 {
                println!("{}", format!("✓ Enqueued for {}", key).green().bold());
            } else if stats.canceled_on_saturation > 0 {
                println!(
                    "{}",
                    format!("✗ Queue for {} is saturated; execution canceled", key)
                        .yellow()
                        .bold()
                );
            } else {
                println!(
                    "{}",
                    format!("✗ Queue for {} is saturated; message dropped", key)
                        .yellow()
                        .bold()
                );
            }
            println!("  {} {}", "Depth:".bold(), queue.depth(&key).await?);
        }

        Commands::Depth { key } => {
            let key = parse_key(&key)?;
            println!("{}", queue.depth(&key).await?);
        }

        Commands::Pop { key, newest } => {
            let key = parse_key(&key)?;
            let popped = if newest {
                queue.pop_newest(&key).await?
            } else {
                queue.pop_oldest(&key).await?
            };

            match popped {
                Some(message) => print_message(&message)?,
                None if wiring.metrics.snapshot().pop_failed > 0 => {
                    println!(
                        "{}",
                        "Pop failed; a re-examination signal was scheduled".red()
                    );
                }
                None => println!("{}", format!("No pending messages for {}", key).yellow()),
            }
        }

        Commands::Purge { key } => {
            let key = parse_key(&key)?;
            let mut drained = Vec::new();
            let count = queue
                .purge(&key, &mut |message: Message| drained.push(message))
                .await?;

            for message in &drained {
                print_message(message)?;
            }
            println!(
                "{}",
                format!("✓ Purged {} message(s) for {}", count, key)
                    .green()
                    .bold()
            );
        }

        Commands::Execution { id } => {
            let id = ExecutionId::new(id);
            match wiring.executions.retrieve(&id).await? {
                Some(summary) => {
                    println!("  {} {}", "Execution:".bold(), summary.id);
                    println!("  {} {}", "Status:".bold(), summary.status);
                    if let Some(reason) = summary.cancellation_reason {
                        println!("  {} {}", "Reason:".bold(), reason);
                    }
                }
                None => println!("{}", format!("Execution {} not found", id).yellow()),
            }
        }

        Commands::Signals { limit } => {
            let ready = wiring.work_queue.list_ready(limit).await?;
            if ready.is_empty() {
                println!("{}", "No signals due".yellow());
            } else {
                let rows = ready
                    .into_iter()
                    .map(|work| -> Result<SignalRow> {
                        Ok(SignalRow {
                            id: work.id,
                            kind: work.message.kind().to_string(),
                            message: serde_json::to_string(&work.message)?,
                            deliver_at: work.deliver_at,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                println!("{}", Table::new(rows));
            }
        }

        // Printed before wiring
        Commands::Config => {}
    }

    debug!(metrics = ?wiring.metrics.snapshot(), "Command finished");
    Ok(())
}
