mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::Result;

/// String key-value slots that outlive a client session.
///
/// Values are opaque strings; callers own their serialization format.
pub trait Storage: Send + Sync {
    /// Read a slot. A slot that was never written is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Open the storage backend described by the configuration
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    if !config.persistent {
        tracing::debug!("Using in-memory storage");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let path = config
        .path
        .clone()
        .unwrap_or_else(crate::util::default_storage_path);
    Ok(Arc::new(DiskStorage::new(path)?))
}
