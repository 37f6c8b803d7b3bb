use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{load_input_value, PipelineStep, StepResult};
use crate::infra::CsvExporter;
use crate::pipeline::processing::rows_from_snapshot;
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

/// Flattens the validated snapshot into a CSV file
pub struct ExportStep {
    exporter: CsvExporter,
}

impl ExportStep {
    pub fn new(exporter: CsvExporter) -> Self {
        Self { exporter }
    }
}

#[async_trait]
impl PipelineStep for ExportStep {
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult> {
        let validated = load_input_value(store, Stage::Export).await?;
        let rows = rows_from_snapshot(&validated);
        let written = self.exporter.write(&rows)?;

        let message = format!("Exported {} rows to {}", written, self.exporter.path().display());
        info!("✅ {}", message);
        Ok(StepResult::success(written, message))
    }

    fn stage(&self) -> Stage {
        Stage::Export
    }
}
