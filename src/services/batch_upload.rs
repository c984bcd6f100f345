//! Batch upload with a single aggregated progress percentage
//!
//! Files are uploaded strictly one after another. Every file carries the same
//! weight `1/total`, so while file `i` reports its local percent `p` the whole
//! job is at `round((i/total + p/100 * 1/total) * 100)`. The first failure
//! aborts the job and no partial result is returned.

use crate::model::error::UploadResult;
use crate::model::file_handle::FileHandle;
use crate::services::storage::{ProgressCallback, Uploader};
use std::sync::Arc;

/// Folder every upload lands under unless configured otherwise
pub const DEFAULT_UPLOAD_PREFIX: &str = "pet_adoption";

/// Overall job percentage while file number `completed` (0-based) is at `local_percent`.
///
/// The two fractions are summed, scaled by 100 and rounded once, half away
/// from zero.
pub fn overall_percent(completed: usize, total: usize, local_percent: u8) -> u8 {
    if total == 0 {
        return 100;
    }
    let total_f = total as f64;
    let file_weight = 1.0 / total_f;
    let overall = ((completed as f64 / total_f) + (local_percent as f64 / 100.0 * file_weight)) * 100.0;
    overall.round().clamp(0.0, 100.0) as u8
}

/// Upload `files` in order to `destination_path`, returning one locator per file
pub async fn upload_many(
    uploader: &dyn Uploader,
    files: &[FileHandle],
    destination_path: &str,
    on_progress: Option<ProgressCallback>,
) -> UploadResult<Vec<String>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let total = files.len();
    tracing::info!("Starting upload of {} file(s) to {}", total, destination_path);

    let mut locators = Vec::with_capacity(total);
    for (completed, file) in files.iter().enumerate() {
        tracing::debug!("Uploading file {}/{}: {}", completed + 1, total, file.name);

        let file_progress = on_progress.clone().map(|callback| -> ProgressCallback {
            Arc::new(move |local_percent: u8| {
                callback(overall_percent(completed, total, local_percent))
            })
        });

        match uploader.upload_one(file, destination_path, file_progress).await {
            Ok(locator) => {
                tracing::debug!("Completed file {}/{}: {}", completed + 1, total, locator);
                locators.push(locator);
            }
            Err(e) => {
                tracing::error!(
                    "Upload of {} failed after {}/{} file(s): {}",
                    file.name,
                    completed,
                    total,
                    e
                );
                return Err(e);
            }
        }
    }

    tracing::info!("All {} upload(s) completed successfully", total);
    Ok(locators)
}

/// Uploads an owner's files under `<prefix>/<owner_id>`
#[derive(Clone)]
pub struct BatchUploader {
    uploader: Arc<dyn Uploader>,
    prefix: String,
}

impl BatchUploader {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self::with_prefix(uploader, DEFAULT_UPLOAD_PREFIX)
    }

    pub fn with_prefix(uploader: Arc<dyn Uploader>, prefix: impl Into<String>) -> Self {
        BatchUploader {
            uploader,
            prefix: prefix.into(),
        }
    }

    /// Destination folder of an owner
    pub fn destination_path(&self, owner_id: &str) -> String {
        format!("{}/{}", self.prefix, owner_id)
    }

    pub async fn upload_many(
        &self,
        files: &[FileHandle],
        owner_id: &str,
        on_progress: Option<ProgressCallback>,
    ) -> UploadResult<Vec<String>> {
        let destination = self.destination_path(owner_id);
        upload_many(self.uploader.as_ref(), files, &destination, on_progress).await
    }
}
