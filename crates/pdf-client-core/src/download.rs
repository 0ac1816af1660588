use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};

/// Destination for translated documents
pub trait DownloadSink: Send + Sync {
    /// Store `bytes` under `file_name`, returning where it ended up
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Saves downloads into a directory.
///
/// Content is written to a temporary file first and renamed into place, so a
/// half-written document never appears under the final name.
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectoryDownloads {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        // Only the final component is honoured
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| Error::Download(format!("invalid file name '{file_name}'")))?;
        let target = self.dir.join(name);

        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&target)
            .map_err(|e| Error::Download(format!("{}: {}", target.display(), e.error)))?;

        info!("Saved {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }
}
