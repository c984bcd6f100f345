//! Object storage backend for S3-compatible services

use crate::model::error::{UploadError, UploadResult};
use crate::model::file_handle::FileHandle;
use crate::services::storage::{percent_of, ProgressCallback, Uploader};
use crate::settings::app_config::S3Settings;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::{
    primitives::{ByteStream, SdkBody},
    Client,
};
use aws_smithy_runtime_api::http::Request;
use aws_smithy_types::error::display::DisplayErrorContext;
use bytes::Bytes;
use http_body::{Body, SizeHint};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::sync::Arc;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Characters kept verbatim inside a key segment of a locator
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Cache key for S3 clients - combines credentials identity, region and endpoint
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ClientCacheKey {
    access_key_id: String,
    region: String,
    endpoint_url: Option<String>,
}

/// Pool of S3 clients for reuse across uploads.
///
/// AWS SDK clients are designed to be reused, so they are cached by
/// credentials, region and endpoint.
#[derive(Clone, Default)]
pub struct S3ClientPool {
    clients: Arc<RwLock<HashMap<ClientCacheKey, Client>>>,
}

impl S3ClientPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing client or create a new one for the given settings
    pub async fn get_or_create(&self, settings: &S3Settings) -> Client {
        let key = ClientCacheKey {
            access_key_id: settings.access_key.clone(),
            region: settings.region.clone(),
            endpoint_url: settings.endpoint_url.clone(),
        };

        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(&key) {
                tracing::debug!("Reusing cached S3 client for region: {}", key.region);
                return client.clone();
            }
        }

        let mut clients = self.clients.write().await;

        // Another task may have created it while we waited for the write lock
        if let Some(client) = clients.get(&key) {
            return client.clone();
        }

        tracing::debug!(
            "Creating new S3 client for region: {}, access_key: {}...",
            key.region,
            &key.access_key_id[..8.min(key.access_key_id.len())]
        );

        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "petmarket",
        );
        let region_provider = RegionProviderChain::first_try(Region::new(settings.region.clone()))
            .or_default_provider()
            .or_else(Region::new("us-east-1"));
        let shared_config = aws_config::from_env()
            .credentials_provider(credentials)
            .region(region_provider)
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(settings.force_path_style);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        clients.insert(key, client.clone());
        client
    }

    #[allow(dead_code)] // Used in tests
    pub async fn cached_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

struct ProgressTracker {
    bytes_written: u64,
    content_length: u64,
    last_reported: Option<u8>,
    on_progress: ProgressCallback,
}

impl ProgressTracker {
    fn track(&mut self, len: u64) {
        self.bytes_written += len;
        let percent = percent_of(self.bytes_written, self.content_length);
        if self.last_reported != Some(percent) {
            self.last_reported = Some(percent);
            (self.on_progress)(percent);
        }
    }
}

/// Request body that reports the share of bytes handed to the transport
#[pin_project::pin_project]
pub struct ProgressBody<InnerBody> {
    #[pin]
    inner: InnerBody,
    progress_tracker: ProgressTracker,
}

impl ProgressBody<SdkBody> {
    /// Swap the body of an outgoing request for a progress-reporting one
    pub fn replace(
        value: Request<SdkBody>,
        on_progress: ProgressCallback,
    ) -> Result<Request<SdkBody>, Infallible> {
        let value = value.map(|body| {
            let len = body.content_length().unwrap_or(0);
            let body = ProgressBody::new(body, len, on_progress.clone());
            SdkBody::from_body_0_4(body)
        });
        Ok(value)
    }
}

impl<InnerBody> ProgressBody<InnerBody>
where
    InnerBody: Body<Data = Bytes, Error = aws_smithy_types::body::Error>,
{
    pub fn new(body: InnerBody, content_length: u64, on_progress: ProgressCallback) -> Self {
        Self {
            inner: body,
            progress_tracker: ProgressTracker {
                bytes_written: 0,
                content_length,
                last_reported: None,
                on_progress,
            },
        }
    }
}

impl<InnerBody> Body for ProgressBody<InnerBody>
where
    InnerBody: Body<Data = Bytes, Error = aws_smithy_types::body::Error>,
{
    type Data = Bytes;

    type Error = aws_smithy_types::body::Error;

    fn poll_data(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Self::Data, Self::Error>>> {
        let this = self.project();
        match this.inner.poll_data(cx) {
            Poll::Ready(Some(Ok(data))) => {
                this.progress_tracker.track(data.len() as u64);
                Poll::Ready(Some(Ok(data)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_trailers(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<http::HeaderMap>, Self::Error>> {
        self.project().inner.poll_trailers(cx)
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.progress_tracker.content_length)
    }
}

/// Uploads photos as objects of one bucket
#[derive(Clone)]
pub struct S3Uploader {
    settings: S3Settings,
    client_pool: S3ClientPool,
}

impl S3Uploader {
    pub fn new(settings: S3Settings) -> Self {
        S3Uploader {
            settings,
            client_pool: S3ClientPool::new(),
        }
    }

    /// Key of a new object: `<destination>/<uuid>.<ext>`
    fn object_key(destination_path: &str, file: &FileHandle) -> String {
        let stored = file.stored_name(&Uuid::new_v4().to_string());
        let destination = destination_path.trim_matches('/');
        if destination.is_empty() {
            stored
        } else {
            format!("{}/{}", destination, stored)
        }
    }

    /// Public URL of an object
    pub fn locator(&self, key: &str) -> String {
        let encoded_key = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        if let Some(base) = &self.settings.public_base_url {
            format!("{}/{}", base.trim_end_matches('/'), encoded_key)
        } else if let Some(endpoint) = &self.settings.endpoint_url {
            format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.settings.bucket,
                encoded_key
            )
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.settings.bucket, self.settings.region, encoded_key
            )
        }
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload_one(
        &self,
        file: &FileHandle,
        destination_path: &str,
        on_progress: Option<ProgressCallback>,
    ) -> UploadResult<String> {
        let client = self.client_pool.get_or_create(&self.settings).await;
        let body = ByteStream::read_from()
            .path(&file.path)
            .build()
            .await
            .map_err(|e| UploadError::Io(format!("{}: {}", file.path.display(), e)))?;
        let key = Self::object_key(destination_path, file);
        tracing::debug!("Putting {} as s3://{}/{}", file.name, self.settings.bucket, key);

        let request = client
            .put_object()
            .bucket(&self.settings.bucket)
            .key(&key)
            .body(body);

        let sent = match on_progress.clone() {
            Some(callback) => {
                request
                    .customize()
                    .map_request(move |req| ProgressBody::<SdkBody>::replace(req, callback.clone()))
                    .send()
                    .await
            }
            None => request.send().await,
        };

        match sent {
            Ok(_) => {
                if let Some(callback) = on_progress {
                    callback(100);
                }
                Ok(self.locator(&key))
            }
            Err(e) => {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!("Upload SdkError: {}", message);
                Err(UploadError::from_message(message))
            }
        }
    }
}
