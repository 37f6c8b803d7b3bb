use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, ScraperError};
use crate::pipeline::Stage;

/// Storage trait for persisting stage snapshots.
///
/// A snapshot is written in full by the stage that owns it and read by the next one.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `None` when the stage has not produced a snapshot yet
    async fn read(&self, stage: Stage) -> Result<Option<Value>>;

    /// Replace the stage's snapshot
    async fn write(&self, stage: Stage, data: &Value) -> Result<()>;
}

/// Pretty-printed JSON files under one output directory
pub struct FileSnapshotStore {
    directory: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, stage: Stage) -> Result<PathBuf> {
        stage
            .snapshot_file()
            .map(|file| self.directory.join(file))
            .ok_or_else(|| ScraperError::Config(format!("stage {stage} does not persist a snapshot")))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read(&self, stage: Stage) -> Result<Option<Value>> {
        let path = self.path_for(stage)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Read {} snapshot from {:?}", stage, path);
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, stage: Stage, data: &Value) -> Result<()> {
        let path = self.path_for(stage)?;
        tokio::fs::create_dir_all(&self.directory).await?;

        // Write to a sibling temp file first so a crash never leaves half a snapshot
        let tmp_path = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!("Wrote {} snapshot to {:?}", stage, path);
        Ok(())
    }
}

/// In-memory snapshot store for tests and dry experiments
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<Stage, Value>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn read(&self, stage: Stage) -> Result<Option<Value>> {
        Ok(self.snapshots.lock().await.get(&stage).cloned())
    }

    async fn write(&self, stage: Stage, data: &Value) -> Result<()> {
        self.snapshots.lock().await.insert(stage, data.clone());
        Ok(())
    }
}
