use serde::{Deserialize, Serialize};

use crate::types::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
    error::{Result, StorageError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub page_size: usize,
    /// Upper bound on cached pages; only clean pages are evicted.
    pub max_cached_pages: Option<usize>,
    pub sync_on_flush: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_cached_pages: None,
            sync_on_flush: true,
        }
    }
}

impl StoreConfig {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(StorageError::config(format!(
                "page size {} outside [{}, {}]",
                self.page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
            )));
        }
        if self.max_cached_pages == Some(0) {
            return Err(StorageError::config("max_cached_pages must be at least 1"));
        }
        Ok(())
    }
}
