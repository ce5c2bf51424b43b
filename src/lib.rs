//! Fixed-size records addressed by dense 1-based row ids, stored across
//! catalog and data pages of a page store.

pub mod storage;
pub mod types;
pub mod utils;

pub use storage::{
    catalog_page::CatalogPage,
    config::StoreConfig,
    data_page::DataPage,
    file_store::FilePageStore,
    memory_store::MemoryPageStore,
    page_store::PageStore,
    paged_array::{CatalogPos, PagedArray, PagedArrayStats},
};
pub use types::error::{Result, StorageError};
