//! The six-stage elevation pipeline: extract, filter, enrich, validate, export, upload.

pub mod builder;
pub mod orchestrator;
pub mod processing;
pub mod stage;
pub mod steps;

pub use builder::{build_steps, Adapters, RunOptions, StoreConnector};
pub use orchestrator::{PipelineExecutionResult, PipelineOrchestrator};
pub use stage::Stage;
pub use steps::{PipelineStep, StepResult};
