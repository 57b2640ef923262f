use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use cli::{printer, samples};
use triad::config::Config;
use triad::llm::{LlmClient, OllamaClient, check_connection};
use triad::refine::{Outcome, RefinementLoop};

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("triad")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("triad.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_client(config: &Config) -> Result<Arc<dyn LlmClient>> {
    let client = OllamaClient::new(config.ollama()).context("Failed to create Ollama client")?;
    Ok(Arc::new(client))
}

async fn run_application(cli: Cli, mut config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command {
        None => handle_run_command(None, None, None, &config).await,
        Some(Commands::Run {
            task,
            sample,
            max_rounds,
            model,
        }) => {
            if let Some(model) = model {
                config.llm.model = model;
            }
            handle_run_command(task, sample, max_rounds, &config).await
        }
        Some(Commands::Serve { bind, model }) => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            handle_serve_command(&config).await
        }
        Some(Commands::Models) => handle_models_command(&config).await,
        Some(Commands::Check) => handle_check_command(&config).await,
        Some(Commands::Samples) => {
            handle_samples_command();
            Ok(())
        }
    }
}

fn resolve_task(task: Option<String>, sample: Option<usize>) -> Result<Option<String>> {
    if let Some(task) = task {
        return Ok(Some(task));
    }
    if let Some(n) = sample {
        return match samples::sample(n) {
            Some(task) => Ok(Some(task.to_string())),
            None => bail!("No sample task {} (choose 1-{})", n, samples::SAMPLE_TASKS.len()),
        };
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    samples::pick_task(&mut input, &mut output).context("Failed to read task choice")
}

async fn handle_run_command(
    task: Option<String>,
    sample: Option<usize>,
    max_rounds: Option<u32>,
    config: &Config,
) -> Result<()> {
    println!("{}", "THREE-AGENT REFINEMENT".bold());
    println!("{}", "=".repeat(50));
    println!("Worker:    creates the work");
    println!("Critic:    reviews and gives feedback");
    println!("Validator: approves or rejects");
    println!("{}", "=".repeat(50));

    let client = build_client(config)?;

    println!("\n{}", "Testing Ollama connection...".cyan());
    let check = check_connection(client.as_ref()).await;
    if !check.connected {
        println!("{} {}", "Connection failed:".red(), check.error.unwrap_or_default());
        println!("\nTroubleshooting:");
        println!("1. Is Ollama running? Try: ollama serve");
        println!("2. Is the model available? Try: ollama list");
        bail!("Cannot reach Ollama at {}", config.llm.base_url);
    }
    println!("{} {}", "Connection successful:".green(), check.response.unwrap_or_default());

    let Some(task) = resolve_task(task, sample)? else {
        println!("\nGoodbye!");
        return Ok(());
    };
    let max_rounds = max_rounds.unwrap_or(config.refinement.max_rounds);

    println!("\n{} {}", "Task:".green(), task);
    println!("{}", "=".repeat(80));
    info!("Running task with {} rounds max on {}", max_rounds, config.llm.model);

    let runner = RefinementLoop::new(client, config.console_refinement());
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let (report, ()) = tokio::join!(
        runner.run_with(&task, max_rounds, &cancel, Some(tx)),
        printer::print_events(rx)
    );
    let report = report?;

    match &report.outcome {
        Outcome::Failed { stage, message, .. } => bail!("{} failed: {}", stage, message),
        Outcome::Cancelled { .. } => {
            info!("Run cancelled by user");
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn handle_serve_command(config: &Config) -> Result<()> {
    println!("{} http://{}", "Serving on".green(), config.server.bind_address);
    let client = build_client(config)?;
    triad::server::serve(config, client).await
}

async fn handle_models_command(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let models = client.list_models().await.context("Failed to list models")?;
    if models.is_empty() {
        println!("{}", "No models installed. Try: ollama pull llama3.2".yellow());
    }
    for model in models {
        let marker = if model.starts_with(&config.llm.model) { "*" } else { " " };
        println!("{} {}", marker.green(), model);
    }
    Ok(())
}

async fn handle_check_command(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let check = check_connection(client.as_ref()).await;
    if check.connected {
        println!("{} {}", "Connected:".green(), check.response.unwrap_or_default());
        Ok(())
    } else {
        println!("{} {}", "Not connected:".red(), check.error.unwrap_or_default());
        bail!("Cannot reach Ollama at {}", config.llm.base_url)
    }
}

fn handle_samples_command() {
    for (i, task) in samples::SAMPLE_TASKS.iter().enumerate() {
        println!("{}. {}", i + 1, task);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging before any work starts
    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(cli, config).await.context("Application failed")?;

    Ok(())
}
