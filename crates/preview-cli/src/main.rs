use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;

use preview_compute::HttpComputeService;
use preview_core::{
    DirectorySnapshotProvider, PreviewConfig, PreviewMode, PreviewModeSource, PreviewSettings,
};
use preview_pipeline::{GenerationOutcome, PipelineConfig, PipelineEvent, PipelineOrchestrator};

mod logging;
mod render;

use logging::init_logging;
use render::print_result;

#[derive(Parser, Debug)]
#[command(name = "prompt-preview")]
#[command(about = "Preview assembled prompts: raw, dialog and preflight")]
#[command(version)]
struct Cli {
    /// Compute service base URL (overrides config and PREVIEW_SERVICE_URL)
    #[arg(long)]
    service_url: Option<String>,

    /// Directory holding presets.json, history.json and the other documents
    #[arg(long, short, default_value = ".")]
    workspace: PathBuf,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate one preview and print it
    Generate {
        /// raw, message or preflight (defaults to the saved mode)
        #[arg(long, short)]
        mode: Option<PreviewMode>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Regenerate whenever the workspace changes
    Watch {
        #[arg(long, short)]
        mode: Option<PreviewMode>,

        /// How often to check the workspace for changes
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },
    /// Show or change the saved preview mode
    Mode {
        #[command(subcommand)]
        action: Option<ModeAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ModeAction {
    /// Save a new default preview mode
    Set { mode: PreviewMode },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = PreviewConfig::new();
    if let Some(url) = cli.service_url.clone() {
        config.service_url = url;
    }
    log::debug!("Configuration: {:?}", config);

    let settings = Arc::new(PreviewSettings::load(config.data_dir()).await);

    match cli.command {
        Commands::Generate { mode, json } => {
            generate(&config, cli.workspace, settings, mode, json).await
        }
        Commands::Watch { mode, interval_ms } => {
            watch(
                &config,
                cli.workspace,
                settings,
                mode,
                Duration::from_millis(interval_ms),
            )
            .await
        }
        Commands::Mode { action: None } => {
            println!("{}", settings.current_mode());
            Ok(())
        }
        Commands::Mode {
            action: Some(ModeAction::Set { mode }),
        } => {
            settings.set_mode(mode).await?;
            println!("{}", format!("✅ Preview mode saved: {}", mode).green());
            Ok(())
        }
    }
}

fn build_orchestrator(
    config: &PreviewConfig,
    snapshots: Arc<DirectorySnapshotProvider>,
    settings: Arc<PreviewSettings>,
) -> PipelineOrchestrator {
    log::info!("Using compute service at {}", config.service_url);
    PipelineOrchestrator::new(
        PipelineConfig::from_preview_config(config),
        Arc::new(HttpComputeService::from_config(config)),
        snapshots,
        settings,
    )
}

async fn generate(
    config: &PreviewConfig,
    workspace: PathBuf,
    settings: Arc<PreviewSettings>,
    mode: Option<PreviewMode>,
    json: bool,
) -> anyhow::Result<()> {
    let mode = mode.unwrap_or_else(|| settings.current_mode());
    let snapshots = Arc::new(DirectorySnapshotProvider::new(workspace));
    let orchestrator = build_orchestrator(config, snapshots, settings);

    match orchestrator.generate_now(Some(mode)).await {
        GenerationOutcome::Completed => {
            let result = orchestrator
                .result(mode)
                .ok_or_else(|| anyhow::anyhow!("no {} result after generation", mode))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(())
        }
        _ => {
            let error = orchestrator
                .last_error()
                .unwrap_or_else(|| "generation did not complete".to_string());
            anyhow::bail!(error)
        }
    }
}

async fn watch(
    config: &PreviewConfig,
    workspace: PathBuf,
    settings: Arc<PreviewSettings>,
    mode: Option<PreviewMode>,
    interval: Duration,
) -> anyhow::Result<()> {
    let snapshots = Arc::new(DirectorySnapshotProvider::new(workspace));
    let orchestrator = build_orchestrator(config, Arc::clone(&snapshots), settings);
    let mut events = orchestrator.subscribe();

    println!(
        "{}",
        format!("👀 Watching {} (Ctrl-C to stop)", snapshots.base_path().display()).cyan()
    );

    let mut last_seen = snapshots.fingerprint().await;
    orchestrator.schedule(mode, Some(Duration::ZERO));

    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                orchestrator.clear();
                println!();
                break;
            }
            _ = ticker.tick() => {
                let current = snapshots.fingerprint().await;
                if current != last_seen {
                    last_seen = current;
                    log::info!("Workspace changed, scheduling regeneration");
                    orchestrator.schedule(mode, None);
                }
            }
            event = events.recv() => match event {
                Ok(PipelineEvent::Completed { mode, .. }) => {
                    if let Some(result) = orchestrator.result(mode) {
                        print_result(&result);
                    }
                }
                Ok(PipelineEvent::Failed { mode, error }) => {
                    eprintln!("{}", format!("❌ {} preview failed: {}", mode, error).red());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} pipeline events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}
