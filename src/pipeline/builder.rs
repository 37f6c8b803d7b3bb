//! Wiring of configuration, adapters and run options into pipeline steps.

use std::sync::Arc;
use std::time::Duration;

use super::processing::{ElevationEnricher, ElevationRange, ElevationValidator, UploadMode, Uploader};
use super::steps::{EnrichStep, ExportStep, ExtractStep, FilterStep, PipelineStep, UploadStep, ValidateStep};
use super::Stage;
use crate::app::ports::{ElevationProvider, QueryService, StoreWriteClient};
use crate::config::Config;
use crate::domain::Credentials;
use crate::error::Result;
use crate::infra::{self, CsvExporter, HttpClient, OverpassQueryService, RetryPolicy};

/// Builds the live store client once credentials have been validated
pub type StoreConnector =
    Arc<dyn Fn(&Credentials) -> Result<Arc<dyn StoreWriteClient>> + Send + Sync>;

/// What the user asked for on this run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub stages: Vec<Stage>,
    pub dry_run: bool,
    /// Per-category cap on elevation lookups
    pub limit: Option<usize>,
    pub credentials: Option<Credentials>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            dry_run: true,
            limit: None,
            credentials: None,
        }
    }
}

/// The outside world, behind the port traits
#[derive(Clone)]
pub struct Adapters {
    pub query: Arc<dyn QueryService>,
    pub provider: Arc<dyn ElevationProvider>,
    pub store_connector: StoreConnector,
}

impl Adapters {
    /// Real HTTP adapters for Overpass, the configured elevation backend and the OSM API
    pub fn from_config(config: &Config) -> Result<Self> {
        let overpass_http = HttpClient::new(
            Duration::from_secs(config.overpass.timeout_seconds),
            RetryPolicy::with_max_retries(config.overpass.max_retries),
        )?;
        let query = Arc::new(OverpassQueryService::new(
            overpass_http,
            &config.overpass.url,
            config.overpass.query_timeout_seconds,
        ));
        let provider = infra::provider_for(&config.elevation)?;

        let upload_config = config.upload.clone();
        let store_connector: StoreConnector =
            Arc::new(move |credentials: &Credentials| infra::osm_api::connect(&upload_config, credentials));

        Ok(Self {
            query,
            provider,
            store_connector,
        })
    }
}

/// One step per requested stage, in stage order.
///
/// Every step is constructed before any runs, so a live upload without usable
/// credentials fails here, before extraction touches the network.
pub fn build_steps(
    config: &Config,
    options: &RunOptions,
    adapters: &Adapters,
) -> Result<Vec<Box<dyn PipelineStep>>> {
    let mut stages = options.stages.clone();
    stages.sort();
    stages.dedup();

    let mut steps: Vec<Box<dyn PipelineStep>> = Vec::with_capacity(stages.len());
    for stage in stages {
        let step: Box<dyn PipelineStep> = match stage {
            Stage::Extract => Box::new(ExtractStep::new(
                adapters.query.clone(),
                config.overpass.region(),
                Duration::from_millis(config.overpass.query_pause_ms),
            )),
            Stage::Filter => Box::new(FilterStep),
            Stage::Enrich => Box::new(EnrichStep::new(
                ElevationEnricher::new(
                    adapters.provider.clone(),
                    Duration::from_millis(config.elevation.rate_limit_ms),
                ),
                options.limit,
            )),
            Stage::Validate => Box::new(ValidateStep::new(ElevationValidator::new(
                ElevationRange {
                    min: config.validation.min_elevation,
                    max: config.validation.max_elevation,
                },
                config.validation.example_limit,
            ))),
            Stage::Export => Box::new(ExportStep::new(CsvExporter::new(config.output.csv_path()))),
            Stage::Upload => {
                let mode = if options.dry_run {
                    UploadMode::DryRun
                } else {
                    UploadMode::Live(options.credentials.clone())
                };
                let connector = adapters.store_connector.clone();
                let uploader = Uploader::new(mode, &config.upload.changeset_comment, |credentials| {
                    connector(credentials)
                })?;
                Box::new(UploadStep::new(uploader))
            }
        };
        steps.push(step);
    }
    Ok(steps)
}
