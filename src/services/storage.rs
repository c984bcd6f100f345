//! The single-file upload primitive offered by a storage collaborator

use crate::model::error::UploadResult;
use crate::model::file_handle::FileHandle;
use async_trait::async_trait;
use std::sync::Arc;

/// Receives a 0..=100 percentage
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Uploads one file and resolves to its public locator.
///
/// Implementations report the file's own progress through `on_progress` with
/// non-decreasing values, and report 100 once the transfer has completed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload_one(
        &self,
        file: &FileHandle,
        destination_path: &str,
        on_progress: Option<ProgressCallback>,
    ) -> UploadResult<String>;
}

/// Percentage of `done` over `total`, rounded; an empty transfer counts as complete
pub fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (done as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}
