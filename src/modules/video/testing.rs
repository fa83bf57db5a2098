//! In-memory stand-ins for the blob store and the transcoder.

use crate::infrastructure::storage::{BlobStore, BlobStoreError};
use crate::infrastructure::transcoder::{TranscodeError, TranscodeProfile, Transcoder};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub data: Vec<u8>,
    pub public: bool,
}

#[derive(Default)]
pub struct FakeBlobStore {
    raw: Mutex<HashMap<String, Vec<u8>>>,
    processed: Mutex<HashMap<String, RemoteObject>>,
    pub fail_download_midway: AtomicBool,
    pub fail_upload: AtomicBool,
    /// Stores the object, then reports a transfer error as if the response was lost.
    pub store_then_fail_upload: AtomicBool,
    pub fail_make_public: AtomicBool,
    pub fail_exists: AtomicBool,
    pub downloads: AtomicUsize,
}

impl FakeBlobStore {
    pub fn with_raw(name: &str, data: &[u8]) -> Self {
        let store = Self::default();
        store.seed_raw(name, data);
        store
    }

    pub fn seed_raw(&self, name: &str, data: &[u8]) {
        self.raw.lock().unwrap().insert(name.to_string(), data.to_vec());
    }

    pub fn seed_processed(&self, name: &str, data: &[u8], public: bool) {
        self.processed.lock().unwrap().insert(
            name.to_string(),
            RemoteObject {
                data: data.to_vec(),
                public,
            },
        );
    }

    pub fn processed_object(&self, name: &str) -> Option<RemoteObject> {
        self.processed.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn download(&self, object_name: &str, destination: &Path) -> Result<(), BlobStoreError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let data = self
            .raw
            .lock()
            .unwrap()
            .get(object_name)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(object_name.to_string()))?;

        if self.fail_download_midway.load(Ordering::SeqCst) {
            tokio::fs::write(destination, &data[..data.len() / 2]).await?;
            return Err(BlobStoreError::Transfer("connection reset".to_string()));
        }

        tokio::fs::write(destination, &data).await?;
        Ok(())
    }

    async fn upload(&self, source: &Path, object_name: &str) -> Result<(), BlobStoreError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Transfer("403 Forbidden".to_string()));
        }

        let meta = tokio::fs::metadata(source).await?;
        let data = if meta.is_file() {
            tokio::fs::read(source).await?
        } else {
            Vec::new()
        };

        self.processed.lock().unwrap().insert(
            object_name.to_string(),
            RemoteObject {
                data,
                public: false,
            },
        );

        if self.store_then_fail_upload.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Transfer("connection closed".to_string()));
        }

        if self.fail_make_public.load(Ordering::SeqCst) {
            return Err(BlobStoreError::MakePublic {
                object: object_name.to_string(),
                reason: "AccessDenied".to_string(),
            });
        }

        if let Some(object) = self.processed.lock().unwrap().get_mut(object_name) {
            object.public = true;
        }
        Ok(())
    }

    async fn exists(&self, object_name: &str) -> Result<bool, BlobStoreError> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Transfer("503 Slow Down".to_string()));
        }
        Ok(self.processed.lock().unwrap().contains_key(object_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderMode {
    Succeed,
    /// Writes part of the output, then reports an engine error.
    FailWithPartialOutput,
    /// Writes part of the output and never finishes.
    Hang,
    /// Blocks until `release` is notified, then succeeds.
    WaitForRelease,
    /// Leaves a directory at the output path, which file deletion cannot remove.
    OutputIsDirectory,
}

pub struct FakeTranscoder {
    mode: TranscoderMode,
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub started: Notify,
    pub release: Notify,
}

impl FakeTranscoder {
    pub fn new(mode: TranscoderMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        _profile: &TranscodeProfile,
    ) -> Result<(), TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.started.notify_one();

        let result: Result<(), TranscodeError> = async {
            let input = tokio::fs::read(input).await?;
            match self.mode {
                TranscoderMode::Succeed => {
                    tokio::fs::write(output, [b"360p:".as_slice(), &input].concat()).await?;
                    Ok(())
                }
                TranscoderMode::FailWithPartialOutput => {
                    tokio::fs::write(output, b"360p:partial").await?;
                    Err(TranscodeError::Engine(
                        "Invalid data found when processing input".to_string(),
                    ))
                }
                TranscoderMode::Hang => {
                    tokio::fs::write(output, b"360p:partial").await?;
                    std::future::pending::<()>().await;
                    Ok(())
                }
                TranscoderMode::WaitForRelease => {
                    self.release.notified().await;
                    tokio::fs::write(output, [b"360p:".as_slice(), &input].concat()).await?;
                    Ok(())
                }
                TranscoderMode::OutputIsDirectory => {
                    tokio::fs::create_dir(output).await?;
                    Ok(())
                }
            }
        }
        .await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
