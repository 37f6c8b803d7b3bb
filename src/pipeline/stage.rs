use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Filter,
    Enrich,
    Validate,
    Export,
    Upload,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Extract,
        Stage::Filter,
        Stage::Enrich,
        Stage::Validate,
        Stage::Export,
        Stage::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Filter => "filter",
            Stage::Enrich => "enrich",
            Stage::Validate => "validate",
            Stage::Export => "export-csv",
            Stage::Upload => "upload",
        }
    }

    /// The stage whose snapshot this stage reads. Export and Upload both read
    /// the validated snapshot; Export writes a CSV, not a snapshot.
    pub fn input_stage(&self) -> Option<Stage> {
        match self {
            Stage::Extract => None,
            Stage::Filter => Some(Stage::Extract),
            Stage::Enrich => Some(Stage::Filter),
            Stage::Validate => Some(Stage::Enrich),
            Stage::Export | Stage::Upload => Some(Stage::Validate),
        }
    }

    /// File name of the snapshot this stage writes, if it writes one
    pub fn snapshot_file(&self) -> Option<&'static str> {
        match self {
            Stage::Extract => Some(RAW_SNAPSHOT_FILE),
            Stage::Filter => Some(FILTERED_SNAPSHOT_FILE),
            Stage::Enrich => Some(ENRICHED_SNAPSHOT_FILE),
            Stage::Validate => Some(VALIDATED_SNAPSHOT_FILE),
            Stage::Export => None,
            Stage::Upload => Some(UPLOAD_REPORT_FILE),
        }
    }

    /// Banner title, e.g. "STEP 3: ENRICH"
    pub fn banner(&self) -> String {
        let position = Stage::ALL.iter().position(|s| s == self).unwrap_or(0) + 1;
        format!("STEP {}: {}", position, self.as_str().to_uppercase())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
