use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub raw_bucket: String,
    pub processed_bucket: String,
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub ffmpeg_bin: String,
    pub transcode_timeout_secs: u64,
    pub reclaim_interval_secs: u64,
    pub amqp_url: Option<String>,
    pub amqp_queue: String,
    pub max_envelope_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            raw_bucket: env::get_or(EnvKey::RawBucket, "raw-videos"),
            processed_bucket: env::get_or(EnvKey::ProcessedBucket, "processed-videos"),
            raw_dir: env::get_or(EnvKey::RawDir, "./raw-videos").into(),
            processed_dir: env::get_or(EnvKey::ProcessedDir, "./processed-videos").into(),
            s3_endpoint: env::get_opt(EnvKey::S3Endpoint),
            s3_region: env::get_or(EnvKey::S3Region, "us-east-1"),
            s3_access_key: env::get(EnvKey::S3AccessKey)?,
            s3_secret_key: env::get(EnvKey::S3SecretKey)?,
            ffmpeg_bin: env::get_or(EnvKey::FfmpegBin, "ffmpeg"),
            transcode_timeout_secs: env::get_parsed(EnvKey::TranscodeTimeoutSecs, 1800),
            reclaim_interval_secs: env::get_parsed(EnvKey::ReclaimIntervalSecs, 60),
            amqp_url: env::get_opt(EnvKey::AmqpUrl),
            amqp_queue: env::get_or(EnvKey::AmqpQueue, "video-uploads"),
            max_envelope_bytes: env::get_parsed(EnvKey::MaxEnvelopeBytes, 64 * 1024),
        })
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }

    /// Zero would make `tokio::time::interval` panic, so it is clamped to one second.
    pub fn reclaim_interval(&self) -> Duration {
        Duration::from_secs(self.reclaim_interval_secs.max(1))
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests(raw_dir: PathBuf, processed_dir: PathBuf) -> Self {
        Self {
            server_port: 0,
            raw_bucket: "raw-videos".to_string(),
            processed_bucket: "processed-videos".to_string(),
            raw_dir,
            processed_dir,
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            s3_access_key: "test".to_string(),
            s3_secret_key: "test".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            transcode_timeout_secs: 5,
            reclaim_interval_secs: 60,
            amqp_url: None,
            amqp_queue: "video-uploads".to_string(),
            max_envelope_bytes: 64 * 1024,
        }
    }
}
