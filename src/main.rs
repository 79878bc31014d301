// ABOUTME: Entry point for the chainlift CLI application.
// ABOUTME: Wires the orchestrator to its collaborators and dispatches commands.

mod cli;

use chainlift::config::{self, Config};
use chainlift::error::{Error, Result};
use chainlift::inbound::PushEvent;
use chainlift::pipeline::{Orchestrator, SubmitRequest};
use chainlift::publish::HttpPublisher;
use chainlift::record::{FileStore, RecordStore};
use chainlift::stage::GitStageExecutor;
use chainlift::types::DeploymentId;
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)
        }
        Commands::Submit {
            source,
            revision,
            project,
        } => {
            let request = SubmitRequest {
                source,
                revision,
                project_name: project,
            };
            submit(request).await
        }
        Commands::Event { payload } => {
            let raw = read_payload(&payload)?;
            let event: PushEvent = serde_json::from_str(&raw)?;
            let orchestrator = build_orchestrator()?;
            let submission = orchestrator.submit_event(event).await?;
            await_and_print(&orchestrator, submission).await
        }
        Commands::Status { id } => {
            let store = open_store();
            let record = store.get(DeploymentId::new(id)).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::List => {
            let store = open_store();
            let records = store.list().await?;
            for record in &records {
                println!(
                    "{:>6}  {:<10}  {:<24}  {}",
                    record.id.value(),
                    record.status.to_string(),
                    record.project_name,
                    record.updated_at.to_rfc3339()
                );
            }
            Ok(())
        }
        Commands::Health => {
            let config = load_config()?;
            let store = open_store();
            let publisher = HttpPublisher::new(config.publisher.clone());
            let report = chainlift::health::check(&store, &publisher).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.healthy {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

type CliOrchestrator = Orchestrator<FileStore, GitStageExecutor, HttpPublisher>;

/// Submit a run and wait for its terminal record.
///
/// The orchestrator itself returns as soon as the pending record exists; the
/// CLI holds on to the completion signal so the process doesn't exit with
/// the run still in flight.
async fn submit(request: SubmitRequest) -> Result<()> {
    let orchestrator = build_orchestrator()?;
    let submission = orchestrator.submit(request).await?;
    await_and_print(&orchestrator, submission).await
}

fn build_orchestrator() -> Result<CliOrchestrator> {
    let config = load_config()?;
    let store = Arc::new(open_store());
    let executor = Arc::new(GitStageExecutor::new(config.build.clone()));
    let publisher = Arc::new(HttpPublisher::new(config.publisher.clone()));
    Ok(Orchestrator::new(store, executor, publisher, config))
}

async fn await_and_print(
    orchestrator: &CliOrchestrator,
    submission: chainlift::pipeline::Submission,
) -> Result<()> {
    println!("Deployment {} scheduled", submission.id);

    if submission.done.await.is_err() {
        eprintln!("Pipeline task panicked; check the deployment record");
    }

    let record = orchestrator.store().get(submission.id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn load_config() -> Result<Config> {
    let cwd = env::current_dir()?;
    Config::discover(&cwd)
}

fn open_store() -> FileStore {
    FileStore::new(state_dir().join("records.json"))
}

/// State directory for chainlift (XDG Base Directory compliant).
fn state_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/state/chainlift"),
        None => PathBuf::from(".chainlift"),
    }
}

fn read_payload(path: &std::path::Path) -> Result<String> {
    if path == std::path::Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path).map_err(Error::from)
    }
}
