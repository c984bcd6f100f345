//! Image CDN backend: unsigned uploads through a Cloudinary upload preset,
//! plus delivery URL transformations

use crate::model::error::{UploadError, UploadResult};
use crate::model::file_handle::FileHandle;
use crate::services::storage::{percent_of, ProgressCallback, Uploader};
use crate::settings::app_config::CloudinarySettings;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Shown when a listing has no photo
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/400x300?text=No+Image+Available";

/// Size of the body chunks progress is reported on
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

const UPLOAD_SEGMENT: &str = "upload/";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Uploads images to a Cloudinary cloud with an unsigned preset
#[derive(Clone)]
pub struct CloudinaryUploader {
    http_client: reqwest::Client,
    settings: CloudinarySettings,
}

impl CloudinaryUploader {
    pub fn new(settings: CloudinarySettings) -> Self {
        CloudinaryUploader {
            http_client: reqwest::Client::new(),
            settings,
        }
    }

    fn upload_url(&self) -> String {
        let base = self
            .settings
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        format!("{}/{}/image/upload", base, self.settings.cloud_name)
    }

    /// Body chunks that report progress as they are handed to the connection
    fn progress_stream(
        data: Bytes,
        on_progress: Option<ProgressCallback>,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
        let total = data.len() as u64;
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
            .collect();
        let mut sent = 0u64;
        futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(callback) = &on_progress {
                callback(percent_of(sent, total));
            }
            Ok(chunk)
        }))
    }

    fn error_from_response(status: StatusCode, body: &str) -> UploadError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|r| r.error.message)
            .unwrap_or_else(|_| format!("{} {}", status, body.trim()));
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UploadError::AccessDenied(message),
            s if s.is_client_error() => UploadError::Rejected(message),
            _ => UploadError::from_message(message),
        }
    }
}

#[async_trait]
impl Uploader for CloudinaryUploader {
    async fn upload_one(
        &self,
        file: &FileHandle,
        destination_path: &str,
        on_progress: Option<ProgressCallback>,
    ) -> UploadResult<String> {
        let data = Bytes::from(tokio::fs::read(&file.path).await?);
        let length = data.len() as u64;
        let public_id = Uuid::new_v4().to_string();

        let part = Part::stream_with_length(
            Body::wrap_stream(Self::progress_stream(data, on_progress.clone())),
            length,
        )
        .file_name(file.name.clone());
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.settings.upload_preset.clone())
            .text("folder", destination_path.to_string())
            .text("public_id", public_id);

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;
        if !status.is_success() {
            let error = Self::error_from_response(status, &body);
            tracing::error!("Cloudinary rejected {}: {}", file.name, error);
            return Err(error);
        }

        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::Other(format!("unexpected upload response: {}", e)))?;
        if let Some(callback) = on_progress {
            callback(100);
        }
        tracing::debug!("File uploaded successfully to Cloudinary: {}", uploaded.secure_url);
        Ok(uploaded.secure_url)
    }
}

/// Delivery transformation applied to listing images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
    pub quality: String,
}

impl Default for ImageTransform {
    fn default() -> Self {
        ImageTransform {
            width: 400,
            height: 300,
            quality: "auto".to_string(),
        }
    }
}

/// Insert a fill/resize/quality transformation into a Cloudinary delivery URL.
///
/// Other URLs are returned unchanged; an empty URL becomes the placeholder image.
pub fn optimized_image_url(original_url: &str, transform: &ImageTransform) -> String {
    if original_url.is_empty() {
        return PLACEHOLDER_IMAGE_URL.to_string();
    }
    if !original_url.contains("cloudinary.com") {
        return original_url.to_string();
    }
    let Some(index) = original_url.find(UPLOAD_SEGMENT) else {
        return original_url.to_string();
    };
    let (base, image) = original_url.split_at(index + UPLOAD_SEGMENT.len());
    format!(
        "{}c_fill,w_{},h_{},q_{},f_auto/{}",
        base, transform.width, transform.height, transform.quality, image
    )
}
