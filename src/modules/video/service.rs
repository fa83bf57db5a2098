use super::dto;
use super::model::{InvalidJob, JobDescriptor, JobOutcome, JobReport};
use super::registry::{InFlightJobs, ReclaimLedger};
use crate::infrastructure::staging::StagingArea;
use crate::infrastructure::storage::{BlobStore, BlobStoreError};
use crate::infrastructure::transcoder::{TranscodeProfile, Transcoder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Drives one job through download, transcode, upload and cleanup.
///
/// Every path that gets past validation and the in-flight claim deletes both
/// local files before returning, whatever the stage outcome. Cleanup failures
/// never change the outcome; they are handed to the reclaim ledger instead.
pub struct JobProcessor {
    staging: StagingArea,
    store: Arc<dyn BlobStore>,
    transcoder: Arc<dyn Transcoder>,
    profile: TranscodeProfile,
    transcode_timeout: Duration,
    in_flight: InFlightJobs,
    reclaim: ReclaimLedger,
}

impl JobProcessor {
    pub fn new(
        staging: StagingArea,
        store: Arc<dyn BlobStore>,
        transcoder: Arc<dyn Transcoder>,
        transcode_timeout: Duration,
    ) -> Self {
        Self {
            staging,
            store,
            transcoder,
            profile: TranscodeProfile::default(),
            transcode_timeout,
            in_flight: InFlightJobs::default(),
            reclaim: ReclaimLedger::default(),
        }
    }

    /// Handles a push envelope as received by the ingress endpoint.
    pub async fn process(&self, envelope: &[u8]) -> JobReport {
        let job_id = Uuid::new_v4();
        match dto::decode_push_envelope(envelope) {
            Ok(notification) => self.submit(job_id, notification.name).await,
            Err(reason) => reject(job_id, reason),
        }
    }

    /// Handles a bare `{ "name": ... }` notification, as carried by the queue.
    pub async fn process_notification(&self, payload: &[u8]) -> JobReport {
        let job_id = Uuid::new_v4();
        match dto::decode_notification(payload) {
            Ok(notification) => self.submit(job_id, notification.name).await,
            Err(reason) => reject(job_id, reason),
        }
    }

    async fn submit(&self, job_id: Uuid, name: Option<String>) -> JobReport {
        let descriptor = match JobDescriptor::parse(name) {
            Ok(descriptor) => descriptor,
            Err(reason) => return reject(job_id, reason),
        };

        let span = info_span!("job", %job_id, object = %descriptor.source_object_name());
        self.run(job_id, descriptor).instrument(span).await
    }

    async fn run(&self, job_id: Uuid, descriptor: JobDescriptor) -> JobReport {
        let raw_path = descriptor.raw_local_path(&self.staging);
        let processed_path = descriptor.processed_local_path(&self.staging);

        // Claimed by path, not by name: two different objects can still
        // derive the same local file.
        let claim = self
            .in_flight
            .try_claim([raw_path.as_path(), processed_path.as_path()]);
        let Some(claim) = claim else {
            warn!("Local paths for this job are already in use, rejecting duplicate");
            return JobReport::new(job_id, JobOutcome::Duplicate);
        };

        let outcome = self.drive(&descriptor, &raw_path, &processed_path).await;
        let stale_files = self
            .clean_up(descriptor.key(), [raw_path, processed_path])
            .await;

        // Held until cleanup finishes so a redelivery cannot reuse the paths early.
        drop(claim);

        match &outcome {
            JobOutcome::Succeeded => info!("✅ Job completed successfully"),
            other => error!(outcome = ?other, "❌ Job failed: {}", other.summary()),
        }

        JobReport {
            job_id,
            outcome,
            stale_files,
        }
    }

    async fn drive(
        &self,
        descriptor: &JobDescriptor,
        raw_path: &Path,
        processed_path: &Path,
    ) -> JobOutcome {
        let object_name = descriptor.source_object_name();
        let processed_name = descriptor.processed_object_name();

        info!("⬇️ Downloading {}", object_name);
        if let Err(e) = self.store.download(object_name, raw_path).await {
            error!(error = %e, "Download failed");
            return JobOutcome::DownloadFailed(e.to_string());
        }

        let transcode = self.transcoder.transcode(raw_path, processed_path, &self.profile);
        match tokio::time::timeout(self.transcode_timeout, transcode).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "Transcode failed");
                return JobOutcome::TranscodeFailed(e.to_string());
            }
            Err(_) => {
                error!(timeout = ?self.transcode_timeout, "Transcode timed out");
                return JobOutcome::TranscodeFailed(format!(
                    "transcode exceeded {:?}",
                    self.transcode_timeout
                ));
            }
        }

        info!("⬆️ Uploading {}", processed_name);
        match self.store.upload(processed_path, &processed_name).await {
            Ok(()) => JobOutcome::Succeeded,
            Err(BlobStoreError::MakePublic { object, reason }) => {
                error!(
                    object = %object,
                    reason = %reason,
                    remediate = true,
                    "Uploaded object is not public"
                );
                JobOutcome::PublishIncomplete {
                    object_name: object,
                    reason,
                }
            }
            Err(e) => self.upload_failed(&processed_name, e).await,
        }
    }

    /// Any error other than the public-read grant means this job's bytes were
    /// not committed. An object already under the name is left over from an
    /// earlier delivery, so the outcome is always `UploadFailed`.
    async fn upload_failed(&self, processed_name: &str, err: BlobStoreError) -> JobOutcome {
        error!(error = %err, "Upload failed");
        match self.store.exists(processed_name).await {
            Ok(true) => warn!(
                object = %processed_name,
                "An earlier processed object is still served under this name"
            ),
            Ok(false) => {}
            Err(check) => warn!(error = %check, "Could not check for an earlier processed object"),
        }
        JobOutcome::UploadFailed(err.to_string())
    }

    async fn clean_up<const N: usize>(&self, key: &str, paths: [PathBuf; N]) -> Vec<PathBuf> {
        let mut stale = Vec::new();
        for path in paths {
            if let Err(e) = self.staging.delete_if_exists(&path).await {
                warn!(
                    path = %path.display(),
                    error = %e,
                    reclaim = true,
                    "Failed to delete staged file"
                );
                stale.push(path);
            }
        }

        if stale.is_empty() {
            self.reclaim.forget(key);
        } else {
            self.reclaim.record(key, stale.clone());
        }
        stale
    }

    /// Retries deletion of files earlier cleanups left behind. Paths owned by
    /// a running job are skipped. Returns how many keys were fully reclaimed.
    pub async fn reclaim_stale(&self) -> usize {
        let mut reclaimed = 0;

        for (key, paths) in self.reclaim.snapshot() {
            let claim = self.in_flight.try_claim(paths.iter().map(PathBuf::as_path));
            let Some(_claim) = claim else {
                continue;
            };

            let mut remaining = Vec::new();
            for path in paths {
                if let Err(e) = self.staging.delete_if_exists(&path).await {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Stale file still cannot be deleted"
                    );
                    remaining.push(path);
                }
            }

            if remaining.is_empty() {
                self.reclaim.forget(&key);
                reclaimed += 1;
            } else {
                self.reclaim.record(&key, remaining);
            }
        }

        reclaimed
    }

    pub fn pending_reclaim(&self) -> usize {
        self.reclaim.len()
    }
}

fn reject(job_id: Uuid, reason: InvalidJob) -> JobReport {
    warn!(%job_id, reason = %reason, "Rejected job notification");
    JobReport::new(job_id, JobOutcome::RejectedInput(reason))
}
