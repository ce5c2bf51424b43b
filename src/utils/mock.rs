use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    storage::{
        config::StoreConfig, file_store::FilePageStore, memory_store::MemoryPageStore,
        paged_array::PagedArray,
    },
    types::error::Result,
};

/// A scratch directory holding one page store file; removed on drop.
pub struct TempStore {
    dir: TempDir,
    pub path: PathBuf,
}

impl TempStore {
    pub fn new() -> std::io::Result<Self> {
        Self::with_prefix("pagedarray_test")
    }

    pub fn with_prefix(prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join("store.db");
        Ok(Self { dir, path })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn create_store(&self, page_size: usize) -> Result<FilePageStore> {
        FilePageStore::create(&self.path, small_page_config(page_size))
    }

    pub fn open_store(&self, page_size: usize) -> Result<FilePageStore> {
        FilePageStore::open(&self.path, small_page_config(page_size))
    }
}

/// Store config for tests: no fsync, so small-page runs stay fast.
pub fn small_page_config(page_size: usize) -> StoreConfig {
    StoreConfig {
        page_size,
        max_cached_pages: None,
        sync_on_flush: false,
    }
}

/// An empty array over a fresh in-memory store.
pub fn memory_array(page_size: usize, data_size: usize) -> Result<PagedArray<MemoryPageStore>> {
    PagedArray::create(MemoryPageStore::new(page_size)?, data_size)
}
