use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Largest accepted upload (50 MiB)
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Required file name suffix
pub const PDF_EXTENSION: &str = ".pdf";

/// A file chosen for translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    /// File name as shown to the user and sent to the server
    pub name: String,
    /// Size in bytes at selection time
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
        }
    }

    /// Describe a file on disk from its metadata
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(path, name, metadata.len()))
    }

    /// Name of the translated document
    pub fn download_name(&self) -> String {
        format!("translated_{}", self.name)
    }
}

/// Check a candidate against the type and size rules
pub fn validate(file: &SelectedFile) -> Result<()> {
    if !file.name.ends_with(PDF_EXTENSION) {
        return Err(Error::UnsupportedFileType {
            name: file.name.clone(),
        });
    }

    if file.size > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            size: file.size,
            limit: MAX_FILE_SIZE,
        });
    }

    Ok(())
}

/// Holds the single current file
#[derive(Debug, Default)]
pub struct FileIntake {
    current: Option<SelectedFile>,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current file if the candidate is valid.
    ///
    /// On error the current file is left untouched.
    pub fn select(&mut self, file: SelectedFile) -> Result<&SelectedFile> {
        validate(&file)?;
        Ok(self.current.insert(file))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub const fn current(&self) -> Option<&SelectedFile> {
        self.current.as_ref()
    }
}
