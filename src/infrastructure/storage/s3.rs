use super::{BlobStore, BlobStoreError};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    raw_bucket: String,
    processed_bucket: String,
}

impl S3BlobStore {
    pub fn new(
        endpoint: Option<&str>,
        region: &str,
        access_key: &str,
        secret_key: &str,
        raw_bucket: &str,
        processed_bucket: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);

        if let Some(endpoint) = endpoint {
            // Path-style addressing is what MinIO and most S3-compatible stores expect.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            raw_bucket,
            processed_bucket,
            endpoint = endpoint.unwrap_or("aws"),
            "✅ S3 blob store configured"
        );

        Self {
            client,
            raw_bucket: raw_bucket.to_string(),
            processed_bucket: processed_bucket.to_string(),
        }
    }

    async fn make_public(&self, object_name: &str) -> Result<(), BlobStoreError> {
        self.client
            .put_object_acl()
            .bucket(&self.processed_bucket)
            .key(object_name)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| BlobStoreError::MakePublic {
                object: object_name.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn download(&self, object_name: &str, destination: &Path) -> Result<(), BlobStoreError> {
        let start = Instant::now();

        let object = self
            .client
            .get_object()
            .bucket(&self.raw_bucket)
            .key(object_name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    BlobStoreError::NotFound(format!("{}/{}", self.raw_bucket, object_name))
                } else {
                    BlobStoreError::Transfer(DisplayErrorContext(&e).to_string())
                }
            })?;

        let expected = object.content_length().and_then(|len| u64::try_from(len).ok());
        let reader = object.body.into_async_read();
        tokio::pin!(reader);

        let mut file = tokio::fs::File::create(destination).await?;
        let written = tokio::io::copy_buf(&mut reader, &mut file).await.map_err(|e| {
            error!(
                bucket = %self.raw_bucket,
                key = %object_name,
                error = %e,
                "S3 download interrupted"
            );
            BlobStoreError::Transfer(format!("body stream interrupted: {}", e))
        })?;
        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = expected {
            if written != expected {
                return Err(BlobStoreError::Transfer(format!(
                    "short read: got {} of {} bytes",
                    written, expected
                )));
            }
        }

        info!(
            bucket = %self.raw_bucket,
            key = %object_name,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "⬇️ s3://{}/{} downloaded to {}",
            self.raw_bucket,
            object_name,
            destination.display()
        );

        Ok(())
    }

    async fn upload(&self, source: &Path, object_name: &str) -> Result<(), BlobStoreError> {
        let start = Instant::now();

        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| BlobStoreError::Transfer(format!("failed to open upload body: {}", e)))?;

        let content_type = mime_guess::from_path(object_name)
            .first_or_octet_stream()
            .to_string();

        self.client
            .put_object()
            .bucket(&self.processed_bucket)
            .key(object_name)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(
                    bucket = %self.processed_bucket,
                    key = %object_name,
                    error = %DisplayErrorContext(&e),
                    "S3 upload failed"
                );
                BlobStoreError::Transfer(DisplayErrorContext(&e).to_string())
            })?;

        info!(
            bucket = %self.processed_bucket,
            key = %object_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "⬆️ {} uploaded",
            source.display()
        );

        self.make_public(object_name).await
    }

    async fn exists(&self, object_name: &str) -> Result<bool, BlobStoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.processed_bucket)
            .key(object_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(BlobStoreError::Transfer(DisplayErrorContext(&e).to_string())),
        }
    }
}
