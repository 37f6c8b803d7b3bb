use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{load_input, save_output, PipelineStep, StepResult};
use crate::domain::{CategoryMap, Element};
use crate::pipeline::processing::{UploadStats, Uploader, ValidatedCategory};
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

/// Upload outcome persisted after every run, dry or live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub dry_run: bool,
    pub generated_at: DateTime<Utc>,
    pub results: CategoryMap<Option<UploadStats>>,
}

pub struct UploadStep {
    uploader: Uploader,
}

impl UploadStep {
    pub fn new(uploader: Uploader) -> Self {
        Self { uploader }
    }
}

#[async_trait]
impl PipelineStep for UploadStep {
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult> {
        let validated: CategoryMap<ValidatedCategory> = load_input(store, Stage::Upload).await?;
        let elements: CategoryMap<Vec<Element>> =
            validated.map(|_, category| category.valid_elements.clone());

        if self.uploader.is_dry_run() {
            info!("🧪 DRY-RUN mode: no changes will be sent to OpenStreetMap");
        } else {
            warn!("🚨 LIVE mode: {} elements will be written to OpenStreetMap", elements.total());
        }

        let results = self.uploader.upload_all(&elements).await;
        let report = UploadReport {
            dry_run: self.uploader.is_dry_run(),
            generated_at: Utc::now(),
            results,
        };
        save_output(store, Stage::Upload, &report).await?;

        let (total, successful, failed) = report
            .results
            .iter()
            .filter_map(|(_, stats)| stats.as_ref())
            .fold((0, 0, 0), |(t, s, f), stats| {
                (t + stats.total, s + stats.successful, f + stats.failed)
            });
        let message = format!("{} of {} uploads successful, {} failed", successful, total, failed);
        info!("✅ {}", message);
        Ok(StepResult::with_rejects(total, failed, message).with_metadata("dry_run", report.dry_run))
    }

    fn stage(&self) -> Stage {
        Stage::Upload
    }
}
