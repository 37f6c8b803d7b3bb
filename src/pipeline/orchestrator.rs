use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

use super::steps::{PipelineStep, StepResult};
use super::Stage;
use crate::observability::metrics;
use crate::storage::SnapshotStore;

const BANNER_WIDTH: usize = 60;

/// Runs pipeline steps in stage order over one snapshot store
pub struct PipelineOrchestrator {
    store: Arc<dyn SnapshotStore>,
}

impl PipelineOrchestrator {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Run `steps` in stage order, stopping at the first step that fails hard.
    ///
    /// The error of the failed step is returned; results of steps that finished
    /// before it are in the snapshots they wrote.
    pub async fn run(&self, mut steps: Vec<Box<dyn PipelineStep>>) -> Result<PipelineExecutionResult> {
        steps.sort_by_key(|step| step.stage());
        steps.dedup_by_key(|step| step.stage());

        let mut execution = PipelineExecutionResult::new();
        info!("🚀 Pipeline started at {}", execution.started_at.format("%Y-%m-%d %H:%M:%S"));

        for step in &steps {
            let stage = step.stage();
            info!("{}", "=".repeat(BANNER_WIDTH));
            info!("{}", stage.banner());
            info!("{}", "=".repeat(BANNER_WIDTH));

            match self.run_step(step.as_ref()).await {
                Ok(result) => execution.add_step_result(stage, result),
                Err(e) => {
                    error!("❌ Step '{}' failed: {:#}", step.step_name(), e);
                    execution.add_step_result(stage, StepResult::failure(format!("{:#}", e)));
                    execution.success = false;
                    execution.complete();
                    return Err(e);
                }
            }
        }

        execution.complete();
        info!("{}", "=".repeat(BANNER_WIDTH));
        info!(
            "🎉 Pipeline finished at {}: {} processed, {} rejected or failed ({}s)",
            execution
                .completed_at
                .unwrap_or(execution.started_at)
                .format("%Y-%m-%d %H:%M:%S"),
            execution.total_processed,
            execution.total_failed,
            execution.duration().map(|d| d.num_seconds()).unwrap_or_default()
        );
        Ok(execution)
    }

    /// Run a single step independently
    pub async fn run_step(&self, step: &dyn PipelineStep) -> Result<StepResult> {
        let result = step.execute(self.store.as_ref()).await?;
        metrics::stage::completed(step.step_name());
        Ok(result)
    }
}

/// Result of executing a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineExecutionResult {
    pub success: bool,
    pub total_processed: usize,
    pub total_failed: usize,
    pub step_results: Vec<(Stage, StepResult)>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for PipelineExecutionResult {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutionResult {
    pub fn new() -> Self {
        Self {
            success: true,
            total_processed: 0,
            total_failed: 0,
            step_results: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn add_step_result(&mut self, stage: Stage, result: StepResult) {
        self.total_processed += result.processed_count;
        self.total_failed += result.failed_count + result.error_count;
        self.step_results.push((stage, result));
    }

    pub fn result_for(&self, stage: Stage) -> Option<&StepResult> {
        self.step_results
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, result)| result)
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySnapshotStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingStep {
        stage: Stage,
        fail: bool,
        log: Arc<Mutex<Vec<Stage>>>,
    }

    #[async_trait]
    impl PipelineStep for RecordingStep {
        async fn execute(&self, _store: &dyn SnapshotStore) -> Result<StepResult> {
            self.log.lock().unwrap().push(self.stage);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(StepResult::success(1, "ok".into()))
        }

        fn stage(&self) -> Stage {
            self.stage
        }
    }

    fn step(stage: Stage, fail: bool, log: &Arc<Mutex<Vec<Stage>>>) -> Box<dyn PipelineStep> {
        Box::new(RecordingStep {
            stage,
            fail,
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn test_steps_run_in_stage_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = PipelineOrchestrator::new(Arc::new(InMemorySnapshotStore::new()));

        let result = orchestrator
            .run(vec![
                step(Stage::Validate, false, &log),
                step(Stage::Extract, false, &log),
                step(Stage::Filter, false, &log),
            ])
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec![Stage::Extract, Stage::Filter, Stage::Validate]);
        assert!(result.success);
        assert_eq!(result.total_processed, 3);
        assert!(result.completed_at.is_some());
        assert!(result.result_for(Stage::Filter).is_some());
    }

    #[tokio::test]
    async fn test_chain_aborts_on_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = PipelineOrchestrator::new(Arc::new(InMemorySnapshotStore::new()));

        let error = orchestrator
            .run(vec![
                step(Stage::Extract, false, &log),
                step(Stage::Filter, true, &log),
                step(Stage::Enrich, false, &log),
            ])
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "boom");
        assert_eq!(*log.lock().unwrap(), vec![Stage::Extract, Stage::Filter]);
    }
}
