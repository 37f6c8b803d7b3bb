use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use osm_elevation::config::Config;
use osm_elevation::observability::init_logging;
use osm_elevation::pipeline::{build_steps, Adapters, PipelineOrchestrator, RunOptions, Stage};
use osm_elevation::storage::FileSnapshotStore;

#[derive(Parser, Debug)]
#[command(name = "osm_elevation")]
#[command(about = "Add SRTM elevation data to OpenStreetMap train stations, hotels and alpine huts")]
#[command(version = "0.1.0")]
#[command(after_help = "Examples:
  osm_elevation --all                         Run the complete pipeline, upload in dry-run mode
  osm_elevation --enrich --limit 10           Enrich the first 10 items of each category
  osm_elevation --upload --live --access-token TOKEN")]
struct Cli {
    /// Extract stations and accommodations from Overpass
    #[arg(long)]
    extract: bool,
    /// Keep elements without elevation and split out alpine huts
    #[arg(long)]
    filter: bool,
    /// Fetch elevations from the configured provider
    #[arg(long)]
    enrich: bool,
    /// Check elevations against the plausible range
    #[arg(long)]
    validate: bool,
    /// Export validated elements to CSV
    #[arg(long)]
    export_csv: bool,
    /// Upload elevation tags to OSM
    #[arg(long)]
    upload: bool,
    /// Run all steps
    #[arg(long)]
    all: bool,

    /// Preview the upload without writing to OSM (default)
    #[arg(long, conflicts_with = "live")]
    dry_run: bool,
    /// Actually write to OSM; requires credentials
    #[arg(long)]
    live: bool,
    /// Limit the number of lookups per category (for testing)
    #[arg(long)]
    limit: Option<usize>,

    /// OSM username
    #[arg(long)]
    username: Option<String>,
    /// OSM password
    #[arg(long)]
    password: Option<String>,
    /// Pre-issued OAuth2 access token, used instead of username and password
    #[arg(long)]
    access_token: Option<String>,

    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    /// Directory for snapshots and the CSV export
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn stages(&self) -> Vec<Stage> {
        if self.all {
            return Stage::ALL.to_vec();
        }
        let flags = [
            (self.extract, Stage::Extract),
            (self.filter, Stage::Filter),
            (self.enrich, Stage::Enrich),
            (self.validate, Stage::Validate),
            (self.export_csv, Stage::Export),
            (self.upload, Stage::Upload),
        ];
        flags
            .into_iter()
            .filter_map(|(selected, stage)| selected.then_some(stage))
            .collect()
    }

    /// Flags win over the environment, which wins over the config file
    fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(username) = &self.username {
            config.upload.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.upload.password = Some(password.clone());
        }
        if let Some(token) = &self.access_token {
            config.upload.access_token = Some(token.clone());
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    config.apply_env_overrides()?;
    cli.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let stages = cli.stages();
    if stages.is_empty() {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    }

    let config = load_config(&cli)?;
    let _log_guard = init_logging(&config.output.log_directory);

    let options = RunOptions {
        stages,
        dry_run: !cli.live,
        limit: cli.limit,
        credentials: config.upload.credentials(),
    };
    info!(
        "🚀 OSM elevation pipeline: {}",
        options
            .stages
            .iter()
            .map(Stage::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let adapters = Adapters::from_config(&config)?;
    let steps = build_steps(&config, &options, &adapters)?;

    let store = Arc::new(FileSnapshotStore::new(&config.output.directory));
    let orchestrator = PipelineOrchestrator::new(store);

    tokio::select! {
        result = orchestrator.run(steps) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("⏹️ Interrupted, stopping the current stage");
            anyhow::bail!("Interrupted by user");
        }
    }

    info!("✅ Done. Output in {}", config.output.directory.display());
    Ok(())
}
