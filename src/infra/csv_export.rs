use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::pipeline::processing::ExportRow;

pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a header plus one line per row. With no rows nothing is written and 0 is returned.
    pub fn write(&self, rows: &[ExportRow]) -> Result<usize> {
        if rows.is_empty() {
            info!("No data to export");
            return Ok(0);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!("📄 Exported {} elements to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }
}
