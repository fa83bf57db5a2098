use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Staging path {0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("Raw and processed staging directories must differ, both resolve to {0}")]
    SharedDirectory(PathBuf),

    #[error("Failed to resolve staging directory {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Local scratch space for in-flight videos: one directory for downloaded
/// raw files and one for transcoder output.
#[derive(Clone, Debug)]
pub struct StagingArea {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl StagingArea {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Creates both directories (with parents). Safe to call repeatedly.
    ///
    /// The two directories must be distinct: a processed file named
    /// `processed-<name>` would otherwise share its path with the raw download
    /// of an object literally called `processed-<name>`.
    pub async fn ensure_ready(&self) -> Result<(), StagingError> {
        for dir in [&self.raw_dir, &self.processed_dir] {
            ensure_dir(dir).await?;
        }

        let raw = resolve(&self.raw_dir).await?;
        let processed = resolve(&self.processed_dir).await?;
        if raw == processed {
            return Err(StagingError::SharedDirectory(raw));
        }
        Ok(())
    }

    pub fn raw_path(&self, file_name: &str) -> PathBuf {
        self.raw_dir.join(file_name)
    }

    pub fn processed_path(&self, file_name: &str) -> PathBuf {
        self.processed_dir.join(file_name)
    }

    /// Removes `path` if present. A missing file is not an error, only a real
    /// filesystem failure is.
    pub async fn delete_if_exists(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted staged file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Staged file already absent, skipping delete");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

async fn ensure_dir(dir: &Path) -> Result<(), StagingError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => return Err(StagingError::NotADirectory(dir.to_path_buf())),
        Err(_) => {}
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StagingError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    info!("📁 Directory created at {}", dir.display());
    Ok(())
}

async fn resolve(dir: &Path) -> Result<PathBuf, StagingError> {
    tokio::fs::canonicalize(dir)
        .await
        .map_err(|source| StagingError::Resolve {
            path: dir.to_path_buf(),
            source,
        })
}
