use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{load_input, save_output, PipelineStep, StepResult};
use crate::domain::{CategoryMap, Element};
use crate::pipeline::processing::enrich::count_with_elevation;
use crate::pipeline::processing::ElevationEnricher;
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

pub struct EnrichStep {
    enricher: ElevationEnricher,
    limit: Option<usize>,
}

impl EnrichStep {
    /// `limit` caps lookups per category
    pub fn new(enricher: ElevationEnricher, limit: Option<usize>) -> Self {
        Self { enricher, limit }
    }
}

#[async_trait]
impl PipelineStep for EnrichStep {
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult> {
        let filtered: CategoryMap<Vec<Element>> = load_input(store, Stage::Enrich).await?;
        if let Some(limit) = self.limit {
            info!("Limiting enrichment to {} elements per category", limit);
        }
        info!(
            "⛰️ Fetching elevations for {} elements ({:?} between lookups)",
            filtered.total(),
            self.enricher.rate_limit()
        );

        let enriched = self.enricher.enrich_all(&filtered, self.limit).await;
        save_output(store, Stage::Enrich, &enriched).await?;

        let processed = enriched.total();
        let with_elevation = count_with_elevation(&enriched);
        for (category, elements) in enriched.iter() {
            info!("  {}: {}", category.label(), elements.len());
        }
        let message = format!(
            "Enriched {} of {} processed elements",
            with_elevation, processed
        );
        info!("✅ {}", message);
        Ok(StepResult::with_rejects(
            processed,
            processed - with_elevation,
            message,
        ))
    }

    fn stage(&self) -> Stage {
        Stage::Enrich
    }
}
