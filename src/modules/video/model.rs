use crate::infrastructure::staging::StagingArea;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

const PROCESSED_PREFIX: &str = "processed-";
const MAX_NAME_BYTES: usize = 255;

/// Why an inbound notification was refused before any file was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidJob {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("missing filename.")]
    MissingName,

    #[error("invalid filename: {0}")]
    InvalidName(&'static str),
}

/// The validated identity of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    source_object_name: String,
}

impl JobDescriptor {
    /// Object names end up as local file names, so anything that could
    /// escape the staging directories is refused here.
    pub fn parse(name: Option<String>) -> Result<Self, InvalidJob> {
        let name = name.ok_or(InvalidJob::MissingName)?;

        if name.trim().is_empty() {
            return Err(InvalidJob::MissingName);
        }
        if name.contains(['/', '\\']) {
            return Err(InvalidJob::InvalidName("path separators are not allowed"));
        }
        if name == "." || name == ".." {
            return Err(InvalidJob::InvalidName("parent or current directory segment"));
        }
        if name.contains('\0') || name.chars().any(char::is_control) {
            return Err(InvalidJob::InvalidName("control characters are not allowed"));
        }
        if name.len() + PROCESSED_PREFIX.len() > MAX_NAME_BYTES {
            return Err(InvalidJob::InvalidName("name too long"));
        }

        Ok(Self {
            source_object_name: name,
        })
    }

    pub fn source_object_name(&self) -> &str {
        &self.source_object_name
    }

    /// Key used for per-job exclusion; every local path derives from it.
    pub fn key(&self) -> &str {
        &self.source_object_name
    }

    pub fn processed_object_name(&self) -> String {
        format!("{}{}", PROCESSED_PREFIX, self.source_object_name)
    }

    pub fn raw_local_path(&self, staging: &StagingArea) -> PathBuf {
        staging.raw_path(&self.source_object_name)
    }

    pub fn processed_local_path(&self, staging: &StagingArea) -> PathBuf {
        staging.processed_path(&self.processed_object_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    RejectedInput(InvalidJob),
    /// Another job with the same key is in flight and owns the local files.
    Duplicate,
    DownloadFailed(String),
    TranscodeFailed(String),
    UploadFailed(String),
    /// The processed object exists under its final name but is not public.
    PublishIncomplete { object_name: String, reason: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }

    /// Short reason safe to show to callers. Detailed reasons stay in logs.
    pub fn summary(&self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "processing finished successfully",
            JobOutcome::RejectedInput(_) => "invalid job",
            JobOutcome::Duplicate => "job already in progress",
            JobOutcome::DownloadFailed(_) => "download failed",
            JobOutcome::TranscodeFailed(_) => "transcode failed",
            JobOutcome::UploadFailed(_) => "upload failed",
            JobOutcome::PublishIncomplete { .. } => {
                "processed video uploaded but could not be made public"
            }
        }
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub job_id: Uuid,
    pub outcome: JobOutcome,
    /// Local files the cleanup failed to delete, queued for reclamation.
    pub stale_files: Vec<PathBuf>,
}

impl JobReport {
    pub fn new(job_id: Uuid, outcome: JobOutcome) -> Self {
        Self {
            job_id,
            outcome,
            stale_files: Vec::new(),
        }
    }
}
