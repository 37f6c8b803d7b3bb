use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::ports::{ChangeGroupHandle, StoreWriteClient};
use crate::constants::{ELE_SOURCE_TAG, ELE_TAG, PROGRESS_INTERVAL};
use crate::domain::{Category, CategoryMap, Credentials, Element};
use crate::error::{Result, ScraperError};
use crate::observability::metrics;

/// Whether the upload touches OSM at all
#[derive(Debug, Clone, PartialEq)]
pub enum UploadMode {
    DryRun,
    Live(Option<Credentials>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub id: i64,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadError {
    pub element_id: i64,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<UploadError>,
}

impl UploadStats {
    fn record(&mut self, result: UploadResult) {
        self.total += 1;
        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
            self.errors.push(UploadError {
                element_id: result.id,
                error: result.message,
            });
        }
    }
}

/// Writes `ele` and `ele:source` back to the store, one change group per element.
///
/// In dry-run mode there is no store client and nothing leaves the process.
pub struct Uploader {
    store: Option<Arc<dyn StoreWriteClient>>,
    comment: String,
}

impl Uploader {
    /// Build an uploader for `mode`.
    ///
    /// Live mode validates the credentials before calling `connect`, so a missing
    /// or blank credential is a configuration error with no network effect. There
    /// is no fallback to dry-run.
    pub fn new<F>(mode: UploadMode, comment: impl Into<String>, connect: F) -> Result<Self>
    where
        F: FnOnce(&Credentials) -> Result<Arc<dyn StoreWriteClient>>,
    {
        let store = match mode {
            UploadMode::DryRun => None,
            UploadMode::Live(None) => {
                return Err(ScraperError::Config(
                    "Username and password required for actual upload".to_string(),
                ))
            }
            UploadMode::Live(Some(credentials)) => {
                credentials.validate()?;
                Some(connect(&credentials)?)
            }
        };
        Ok(Self {
            store,
            comment: comment.into(),
        })
    }

    pub fn dry_run(comment: impl Into<String>) -> Self {
        Self {
            store: None,
            comment: comment.into(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.store.is_none()
    }

    pub async fn upload_one(&self, element: &Element) -> UploadResult {
        let (Some(ele), Some(source)) = (element.tag(ELE_TAG), element.tag(ELE_SOURCE_TAG)) else {
            return self.finish(element, Err(ScraperError::api("Element is missing ele or ele:source tag")));
        };

        let Some(store) = &self.store else {
            info!(
                "[DRY-RUN] Would update {} {}: ele={}, ele:source={}",
                element.kind(),
                element.id,
                ele,
                source
            );
            metrics::upload::element_processed(true, true);
            return UploadResult {
                id: element.id,
                success: true,
                message: "Dry-run successful".to_string(),
            };
        };

        let outcome = self.write_tags(store.as_ref(), element, ele, source).await;
        self.finish(element, outcome)
    }

    fn finish(&self, element: &Element, outcome: Result<()>) -> UploadResult {
        let dry_run = self.is_dry_run();
        match outcome {
            Ok(()) => {
                metrics::upload::element_processed(true, dry_run);
                UploadResult {
                    id: element.id,
                    success: true,
                    message: "Upload successful".to_string(),
                }
            }
            Err(e) => {
                warn!("Error uploading {} {}: {}", element.kind(), element.id, e);
                metrics::upload::element_processed(false, dry_run);
                UploadResult {
                    id: element.id,
                    success: false,
                    message: format!("Error uploading: {}", e),
                }
            }
        }
    }

    async fn write_tags(
        &self,
        store: &dyn StoreWriteClient,
        element: &Element,
        ele: &str,
        source: &str,
    ) -> Result<()> {
        let mut record = store.fetch_by_id(element.kind(), element.id).await?;
        // Last writer wins: concurrent upstream edits to these two tags are overwritten
        record.tags.insert(ELE_TAG.to_string(), ele.to_string());
        record.tags.insert(ELE_SOURCE_TAG.to_string(), source.to_string());

        let change_group = store.open_change_group(&self.comment).await?;
        let updated = store.update(&record, &change_group).await;
        let closed = self.close(store, &change_group).await;
        updated.and(closed)
    }

    async fn close(&self, store: &dyn StoreWriteClient, change_group: &ChangeGroupHandle) -> Result<()> {
        store.close_change_group(change_group).await.map_err(|e| {
            error!("Failed to close changeset {}: {}", change_group.id, e);
            e
        })
    }

    /// Sequential upload, one change group per element
    pub async fn upload_many(&self, elements: &[Element]) -> UploadStats {
        let mut stats = UploadStats::default();
        for (index, element) in elements.iter().enumerate() {
            let result = self.upload_one(element).await;
            stats.record(result);
            if (index + 1) % PROGRESS_INTERVAL == 0 {
                info!("Uploaded {}/{} elements...", index + 1, elements.len());
            }
        }
        stats
    }

    /// Upload every non-empty category; empty ones map to `None`
    pub async fn upload_all(&self, validated: &CategoryMap<Vec<Element>>) -> CategoryMap<Option<UploadStats>> {
        let mut results = CategoryMap::<Option<UploadStats>>::default();
        for category in Category::ALL {
            let elements = validated.get(category);
            if elements.is_empty() {
                continue;
            }
            info!("📤 Uploading {} {}...", elements.len(), category.label().to_lowercase());
            let stats = self.upload_many(elements).await;
            info!(
                "{}: {} successful, {} failed",
                category.label(),
                stats.successful,
                stats.failed
            );
            *results.get_mut(category) = Some(stats);
        }
        results
    }
}
