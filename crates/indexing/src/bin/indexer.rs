use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdl_index_common::{init_tracing, shutdown_tracing, SystemConfig};
use mdl_index_indexing::chunker::{Instruction, SqlPair};
use mdl_index_indexing::display_name::clean_display_name;
use mdl_index_indexing::pipeline::IndexingPipeline;
use mdl_index_indexing::watcher::{MdlEvent, MdlWatcher};
use mdl_index_storage::DocumentStore;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "mdl-indexer")]
#[command(about = "Index MDL semantics and SQL knowledge into a vector store", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index an MDL file, replacing the project's schema documents
    Index {
        #[arg(long)]
        mdl: PathBuf,
        #[arg(long)]
        project_id: Option<String>,
        /// Keep running and re-index whenever the file changes
        #[arg(long)]
        watch: bool,
    },
    /// Index boilerplate SQL pairs for an MDL plus pairs from a JSON file
    SqlPairs {
        #[arg(long)]
        mdl: PathBuf,
        /// JSON array of {id, question, sql}
        #[arg(long)]
        pairs: Option<PathBuf>,
        #[arg(long)]
        project_id: Option<String>,
    },
    /// Index instructions from a JSON array of {id, instruction, questions, is_default}
    Instructions {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        project_id: Option<String>,
    },
    /// Delete the project's documents from every collection, or everything
    Clean {
        #[arg(long)]
        project_id: Option<String>,
    },
    /// Print display names cleaned into valid identifiers
    CleanName { names: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::CleanName { names } = &cli.command {
        for name in names {
            println!("{}", clean_display_name(name));
        }
        return Ok(());
    }

    let config = SystemConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    init_tracing(&config.tracing)?;
    info!("Starting mdl-indexer with config {}", cli.config.display());
    debug!("Loaded config: {:#?}", config);

    let result = run(cli.command, &config).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    shutdown_tracing();
    result
}

async fn run(command: Command, config: &SystemConfig) -> Result<()> {
    let pipeline = IndexingPipeline::from_config(config)
        .await
        .context("failed to build indexing pipeline")?;
    verify_services(&pipeline).await?;

    match command {
        Command::Index { mdl, project_id, watch } => {
            index_file(&pipeline, &mdl, project_id.as_deref()).await?;
            if watch {
                watch_file(&pipeline, &mdl, project_id.as_deref(), config).await?;
            }
        }
        Command::SqlPairs { mdl, pairs, project_id } => {
            let raw = read_file(&mdl).await?;
            let external: Vec<SqlPair> = match pairs {
                Some(path) => serde_json::from_str(&read_file(&path).await?)
                    .with_context(|| format!("invalid SQL pairs file {}", path.display()))?,
                None => Vec::new(),
            };
            let written = pipeline.index_sql_pairs(&raw, external, project_id.as_deref()).await?;
            info!("Indexed {} SQL pairs", written);
        }
        Command::Instructions { file, project_id } => {
            let instructions: Vec<Instruction> = serde_json::from_str(&read_file(&file).await?)
                .with_context(|| format!("invalid instructions file {}", file.display()))?;
            let written = pipeline
                .index_instructions(&instructions, project_id.as_deref())
                .await?;
            info!("Indexed {} instruction documents", written);
        }
        Command::Clean { project_id } => {
            pipeline.clean(project_id.as_deref()).await?;
            info!("Cleaned all collections");
        }
        Command::CleanName { .. } => {}
    }
    Ok(())
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn index_file(pipeline: &IndexingPipeline, path: &Path, project_id: Option<&str>) -> Result<()> {
    let raw = read_file(path).await?;
    let report = pipeline.index_mdl(&raw, project_id).await?;
    info!("Indexed {}: {}", path.display(), report);
    Ok(())
}

async fn watch_file(
    pipeline: &IndexingPipeline,
    path: &Path,
    project_id: Option<&str>,
    config: &SystemConfig,
) -> Result<()> {
    let mut watcher = MdlWatcher::new(path, Duration::from_millis(config.indexing.watch_debounce_ms))?;
    info!("Watching {} for changes. Press Ctrl+C to stop.", watcher.path().display());

    loop {
        tokio::select! {
            event = watcher.next_event() => match event {
                Some(MdlEvent::Changed(changed)) => {
                    if let Err(e) = index_file(pipeline, &changed, project_id).await {
                        error!("Failed to re-index {}: {}", changed.display(), e);
                    }
                }
                Some(MdlEvent::Removed(removed)) => {
                    warn!("{} was removed; keeping indexed documents", removed.display());
                }
                None => {
                    warn!("Watcher stopped");
                    return Ok(());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

/// Verify every document store is reachable before writing
async fn verify_services(pipeline: &IndexingPipeline) -> Result<()> {
    info!("Verifying document stores...");
    for (kind, store) in pipeline.stores() {
        store
            .health_check()
            .await
            .with_context(|| format!("store {} for {} is not available", store.name(), kind))?;
        debug!("Store {} for {} is available", store.name(), kind);
    }
    info!("All document stores verified");
    Ok(())
}
