use super::{TranscodeError, TranscodeProfile, Transcoder};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

// Only the tail of ffmpeg's stderr carries the actual failure.
const STDERR_TAIL_LINES: usize = 5;

pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, input: &Path, output: &Path, profile: &TranscodeProfile) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-hide_banner", "-nostdin", "-y"])
            .arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(profile.video_filter())
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        profile: &TranscodeProfile,
    ) -> Result<(), TranscodeError> {
        info!("🎥 Transcoding {} -> {}", input.display(), output.display());

        let mut cmd = self.command(input, output, profile);
        debug!(command = ?cmd, "Spawning transcoder");

        let result = cmd.spawn()?.wait_with_output().await?;

        if !result.status.success() {
            let message = stderr_tail(&result.stderr);
            error!(status = %result.status, "An error occurred: {}", message);
            return Err(TranscodeError::Engine(message));
        }

        if tokio::fs::metadata(output).await.is_err() {
            return Err(TranscodeError::MissingOutput);
        }

        info!("Processing finished successfully");
        Ok(())
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return "ffmpeg exited without an error message".to_string();
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}
