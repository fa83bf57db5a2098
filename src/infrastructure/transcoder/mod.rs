pub mod ffmpeg;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Failed to launch transcoder: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Transcoder reported an error: {0}")]
    Engine(String),

    #[error("Transcoder finished without producing an output file")]
    MissingOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    PreserveAspectRatio,
}

/// Output parameters applied to every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeProfile {
    pub target_height: u32,
    pub scale_mode: ScaleMode,
}

impl TranscodeProfile {
    pub const P360: TranscodeProfile = TranscodeProfile {
        target_height: 360,
        scale_mode: ScaleMode::PreserveAspectRatio,
    };

    /// The `-vf` argument for this profile. `-2` keeps the aspect ratio while
    /// rounding the width to an even number, which yuv420p encoders require.
    pub fn video_filter(&self) -> String {
        match self.scale_mode {
            ScaleMode::PreserveAspectRatio => format!("scale=-2:{}", self.target_height),
        }
    }
}

impl Default for TranscodeProfile {
    fn default() -> Self {
        Self::P360
    }
}

/// Resolves exactly once per call. Dropping the future cancels the job.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        profile: &TranscodeProfile,
    ) -> Result<(), TranscodeError>;
}
