use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use super::{load_input, save_output, PipelineStep, StepResult};
use crate::domain::{Category, CategoryMap, Element, RawExtract};
use crate::pipeline::processing::{categorize, filter_all};
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

pub struct FilterStep;

#[async_trait]
impl PipelineStep for FilterStep {
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult> {
        let mut raw: RawExtract = load_input(store, Stage::Filter).await?;
        let input_count = raw.train_stations.len() + raw.accommodations.len();

        // Only the accommodation classes this pipeline enriches
        let before = raw.accommodations.len();
        raw.accommodations.retain(|element| {
            matches!(
                categorize(element),
                Some(Category::AlpineHuts | Category::OtherAccommodations)
            )
        });
        let unclassified = before - raw.accommodations.len();
        if unclassified > 0 {
            warn!("⚠️ Dropped {} accommodations with an unsupported tourism tag", unclassified);
        }

        let filtered: CategoryMap<Vec<Element>> = filter_all(&raw);
        save_output(store, Stage::Filter, &filtered).await?;

        for (category, elements) in filtered.iter() {
            info!("  {}: {} without elevation", category.label(), elements.len());
        }
        let message = format!(
            "{} of {} elements need elevation ({} alpine huts prioritized)",
            filtered.total(),
            input_count,
            filtered.alpine_huts.len()
        );
        info!("✅ {}", message);
        Ok(StepResult::success(filtered.total(), message)
            .with_metadata("input", input_count)
            .with_metadata("unclassified", unclassified))
    }

    fn stage(&self) -> Stage {
        Stage::Filter
    }
}
