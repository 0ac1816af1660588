use sled::Db;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use super::Storage;
use crate::error::{Error, Result};

/// Credential slots kept in a sled database
pub struct DiskStorage {
    db: Db,
}

impl DiskStorage {
    /// Open the database at `path`, creating it and its parent directories
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StorageOpen(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let db = sled::open(path).map_err(|e| open_error(path, &e))?;
        debug!(
            "Credential store at {} ({} slots)",
            path.display(),
            db.len()
        );

        Ok(Self { db })
    }
}

/// sled holds an exclusive file lock for the lifetime of the database
fn open_error(path: &Path, err: &sled::Error) -> Error {
    match err {
        sled::Error::Io(io) if io.kind() == ErrorKind::WouldBlock => Error::StorageOpen(format!(
            "credential store {} is in use by another pdf-client process; \
             wait for it to finish or pass --ephemeral",
            path.display()
        )),
        _ => Error::StorageOpen(format!(
            "cannot open credential store {}: {err}",
            path.display()
        )),
    }
}

impl Storage for DiskStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(value) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| Error::StorageRead(e.to_string()))?
        else {
            return Ok(None);
        };

        String::from_utf8(value.to_vec())
            .map(Some)
            .map_err(|e| Error::StorageRead(format!("slot '{key}' is not UTF-8: {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| Error::StorageWrite(e.to_string()))?;

        // Credentials are written rarely; make each write durable
        self.db
            .flush()
            .map_err(|e| Error::StorageWrite(format!("flush failed: {e}")))?;

        Ok(())
    }
}
