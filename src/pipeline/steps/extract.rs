use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{save_output, PipelineStep, StepResult};
use crate::app::ports::{QueryService, Region, TagPredicate};
use crate::domain::RawExtract;
use crate::pipeline::Stage;
use crate::storage::SnapshotStore;

/// Queries stations and accommodations for the region
pub struct ExtractStep {
    query: Arc<dyn QueryService>,
    region: Region,
    query_pause: Duration,
}

impl ExtractStep {
    pub fn new(query: Arc<dyn QueryService>, region: Region, query_pause: Duration) -> Self {
        Self {
            query,
            region,
            query_pause,
        }
    }
}

#[async_trait]
impl PipelineStep for ExtractStep {
    async fn execute(&self, store: &dyn SnapshotStore) -> Result<StepResult> {
        info!("🔍 Querying train stations in {}...", self.region.name);
        let train_stations = self
            .query
            .lookup_by_tag_predicate(&self.region, &TagPredicate::train_stations())
            .await;

        if !self.query_pause.is_zero() {
            tokio::time::sleep(self.query_pause).await;
        }

        info!("🔍 Querying accommodations in {}...", self.region.name);
        let accommodations = self
            .query
            .lookup_by_tag_predicate(&self.region, &TagPredicate::accommodations())
            .await;

        let raw = RawExtract {
            train_stations,
            accommodations,
        };
        save_output(store, Stage::Extract, &raw).await?;

        let total = raw.train_stations.len() + raw.accommodations.len();
        let message = format!(
            "Extracted {} train stations and {} accommodations",
            raw.train_stations.len(),
            raw.accommodations.len()
        );
        info!("✅ {}", message);
        Ok(StepResult::success(total, message))
    }

    fn stage(&self) -> Stage {
        Stage::Extract
    }
}
