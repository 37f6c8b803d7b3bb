use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{load_input, save_output, PipelineStep, StepResult};
use crate::domain::{CategoryMap, Element};
use crate::pipeline::processing::{ElevationValidator, ValidatedCategory};
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

pub struct ValidateStep {
    validator: ElevationValidator,
}

impl ValidateStep {
    pub fn new(validator: ElevationValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl PipelineStep for ValidateStep {
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult> {
        let enriched: CategoryMap<Vec<Element>> = load_input(store, Stage::Validate).await?;
        let range = self.validator.range();
        info!("🔎 Checking elevations against [{}, {}] m", range.min, range.max);

        let reports = self.validator.validate_all(&enriched);
        let validated: CategoryMap<ValidatedCategory> =
            reports.map(|_, report| ValidatedCategory::from(report.clone()));
        save_output(store, Stage::Validate, &validated).await?;

        let valid: usize = validated.iter().map(|(_, v)| v.valid_count).sum();
        let invalid: usize = validated.iter().map(|(_, v)| v.invalid_count).sum();
        let message = format!("{} valid, {} invalid", valid, invalid);
        info!("✅ {}", message);
        Ok(StepResult::with_rejects(valid + invalid, invalid, message))
    }

    fn stage(&self) -> Stage {
        Stage::Validate
    }
}
