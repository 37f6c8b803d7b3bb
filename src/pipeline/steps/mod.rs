use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ScraperError;
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

/// Common trait for all pipeline steps
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Run the stage: read the predecessor snapshot, transform, write our own
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult>;

    fn stage(&self) -> Stage;

    fn step_name(&self) -> &'static str {
        self.stage().as_str()
    }
}

/// Result of executing a pipeline step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub success: bool,
    pub processed_count: usize,
    pub failed_count: usize,
    pub error_count: usize,
    pub message: String,
    pub metadata: HashMap<String, String>,
}

impl StepResult {
    pub fn success(processed: usize, message: String) -> Self {
        Self {
            success: true,
            processed_count: processed,
            failed_count: 0,
            error_count: 0,
            message,
            metadata: HashMap::new(),
        }
    }

    /// The stage ran to completion but some elements were rejected or failed
    pub fn with_rejects(processed: usize, failed: usize, message: String) -> Self {
        Self {
            success: true,
            processed_count: processed,
            failed_count: failed,
            error_count: 0,
            message,
            metadata: HashMap::new(),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            processed_count: 0,
            failed_count: 0,
            error_count: 1,
            message,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Raw snapshot written by the stage `stage` reads from
pub(crate) async fn load_input_value(store: &dyn SnapshotStore, stage: Stage) -> Result<Value> {
    let predecessor = stage
        .input_stage()
        .with_context(|| format!("{} has no input stage", stage))?;
    let value = store
        .read(predecessor)
        .await?
        .ok_or_else(|| ScraperError::PreconditionMissing {
            stage: stage.as_str().to_string(),
            predecessor: predecessor.as_str().to_string(),
        })?;
    Ok(value)
}

pub(crate) async fn load_input<T: DeserializeOwned>(store: &dyn SnapshotStore, stage: Stage) -> Result<T> {
    let value = load_input_value(store, stage).await?;
    let predecessor = stage.input_stage().map(|s| s.as_str()).unwrap_or_default();
    serde_json::from_value(value).with_context(|| format!("{} snapshot is malformed", predecessor))
}

pub(crate) async fn save_output<T: serde::Serialize>(
    store: &dyn SnapshotStore,
    stage: Stage,
    data: &T,
) -> Result<()> {
    let value = serde_json::to_value(data)?;
    store
        .write(stage, &value)
        .await
        .with_context(|| format!("failed to write {} snapshot", stage))
}

pub mod enrich;
pub mod export;
pub mod extract;
pub mod filter;
pub mod upload;
pub mod validate;

pub use enrich::EnrichStep;
pub use export::ExportStep;
pub use extract::ExtractStep;
pub use filter::FilterStep;
pub use upload::{UploadReport, UploadStep};
pub use validate::ValidateStep;
