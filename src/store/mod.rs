pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use anyhow::Result;
pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Opens the on-disk store under `{data_path}/store`.
pub fn open_disk_store(config: &AppConfig) -> Result<DiskStore> {
    let path = config.default_data_path()?.join("store");
    DiskStore::open(&path)
}
