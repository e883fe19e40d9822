// src/main.rs
mod batch;
mod llama;
mod storage;
mod termsheet;
mod utils;
mod web;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use batch::{BatchOrchestrator, BatchOutcome, PollPolicy};
use llama::agent::AgentHandle;
use llama::client::LlamaClient;
use llama::{AgentRef, ExtractionAgent};
use termsheet::TermSheetView;
use utils::config::{self, Settings};
use utils::AppError;

/// Term sheet extraction through a hosted LlamaExtract agent
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a single term sheet and print the JSON result
    Extract {
        /// PDF to extract; without it the available agents are listed
        file: Option<PathBuf>,

        /// Name of the extraction agent
        #[arg(long, env = "LLAMA_EXTRACT_AGENT_NAME", default_value = config::DEFAULT_AGENT_NAME)]
        agent_name: String,

        /// Print the sectioned view instead of raw JSON
        #[arg(long)]
        sections: bool,
    },

    /// Extract every PDF in a directory and save one JSON file per document
    Batch {
        /// Directory containing PDF term sheets
        directory: PathBuf,

        /// Output directory for extracted data (default: <directory>/extracted_data)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Id of the extraction agent
        #[arg(long, env = "LLAMA_EXTRACT_AGENT_ID", default_value = config::DEFAULT_BATCH_AGENT_ID)]
        agent_id: String,

        /// Seconds between job status checks
        #[arg(long, default_value = "3")]
        poll_interval_secs: u64,

        /// Give up after this many status checks (default: wait indefinitely)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Multiply the poll interval by this factor after each check
        #[arg(long, default_value = "1.0")]
        backoff: f64,
    },

    /// Serve the upload-and-view web UI
    Serve {
        /// Address to listen on
        #[arg(long, env = "TERMSHEET_BIND", default_value = "127.0.0.1:8501")]
        bind: String,

        /// Name of the extraction agent
        #[arg(long, env = "LLAMA_EXTRACT_AGENT_NAME", default_value = config::DEFAULT_AGENT_NAME)]
        agent_name: String,
    },

    /// Check the API key and agent access
    Check {
        /// Name of the extraction agent
        #[arg(long, env = "LLAMA_EXTRACT_AGENT_NAME", default_value = config::DEFAULT_AGENT_NAME)]
        agent_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load .env first so RUST_LOG and env-backed flags can come from it
    let dotenv = config::load_dotenv();

    // 2. Setup Logging (reads RUST_LOG env var) and parse CLI arguments
    utils::logging::setup_logging();
    dotenv.log();
    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);

    // 3. Build the extraction client; a missing key is reported on first use
    let settings = Settings::from_env();
    let client = Arc::new(LlamaClient::new(&settings)?);

    match args.command {
        Command::Extract { file, agent_name, sections } => {
            let agent = AgentHandle::new(client.clone(), AgentRef::Name(agent_name));
            match file {
                Some(file) => {
                    agent.warm_up().await;
                    extract_one(&agent, file, sections).await
                }
                None => list_agents(&client).await,
            }
        }
        Command::Batch {
            directory,
            output,
            agent_id,
            poll_interval_secs,
            max_attempts,
            backoff,
        } => {
            if !(backoff.is_finite() && backoff >= 1.0) {
                return Err(AppError::Config(format!("--backoff must be at least 1.0 (got {})", backoff)));
            }
            let policy = PollPolicy {
                interval: Duration::from_secs(poll_interval_secs),
                max_attempts,
                backoff,
                ..PollPolicy::default()
            };
            let agent = AgentHandle::new(client, AgentRef::Id(agent_id));
            run_batch(&agent, directory, output, policy).await
        }
        Command::Serve { bind, agent_name } => {
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid bind address '{}': {}", bind, e)))?;
            let agent = AgentHandle::new(client, AgentRef::Name(agent_name));
            agent.warm_up().await;
            web::serve(addr, web::AppState { agent: Arc::new(agent) }).await
        }
        Command::Check { agent_name } => check_connection(&settings, &client, &agent_name).await,
    }
}

async fn extract_one(agent: &AgentHandle, file: PathBuf, sections: bool) -> Result<(), AppError> {
    // Extraction failures are reported, not propagated: the process still exits 0.
    let result = match agent.extract(&file).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Extraction error: {}", e);
            println!("Error: {}", e);
            return Ok(());
        }
    };

    if sections {
        print!("{}", TermSheetView::from_result(&result));
    } else {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| AppError::Config(format!("Could not serialize result: {}", e)))?;
        println!("{}", json);
    }
    Ok(())
}

async fn list_agents(client: &LlamaClient) -> Result<(), AppError> {
    match client.list_agents().await {
        Ok(agents) => {
            println!("Available agents:");
            for agent in agents {
                println!("  {}", agent);
            }
        }
        Err(e) => println!("Error listing agents: {}", e),
    }
    println!("Please provide a file path as a command line argument.");
    println!("Example: termsheet-extractor extract termsheet.pdf");
    Ok(())
}

async fn run_batch(
    agent: &AgentHandle,
    directory: PathBuf,
    output: Option<PathBuf>,
    policy: PollPolicy,
) -> Result<(), AppError> {
    tracing::info!("Batch processing {} with agent {}", directory.display(), agent.reference());
    let orchestrator = BatchOrchestrator::new(agent, policy);

    match orchestrator.run(&directory, output.as_deref()).await? {
        BatchOutcome::NoInputs => {
            println!("No PDF files found in {}", directory.display());
        }
        BatchOutcome::Completed(report) => {
            let elapsed = report.finished_at - report.started_at;
            println!(
                "Saved {} result file(s) to {} in {}s",
                report.saved.len(),
                report.output_dir.display(),
                elapsed.num_seconds()
            );
        }
    }
    // Individual job failures are logged above and do not change the exit code.
    Ok(())
}

async fn check_connection(settings: &Settings, client: &Arc<LlamaClient>, agent_name: &str) -> Result<(), AppError> {
    println!("Testing LlamaExtract API connection...");
    println!("API Key found: {}", if settings.has_api_key() { "Yes" } else { "No" });

    println!("\nTesting agent access by name...");
    let agent = AgentHandle::new(client.clone(), AgentRef::Name(agent_name.to_string()));
    match agent.resolve().await {
        Ok(resolved) => {
            println!("Agent details: {}", resolved.info());
            println!("\nTrying to list available agents...");
            match client.list_agents().await {
                Ok(agents) => {
                    let names: Vec<String> = agents.iter().map(|a| a.to_string()).collect();
                    println!("Available agents: {}", names.join(", "));
                }
                Err(e) => println!("Error listing agents: {}", e),
            }
        }
        Err(e) => println!("Error accessing agent: {}", e),
    }
    Ok(())
}
