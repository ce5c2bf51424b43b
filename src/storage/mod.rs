pub mod catalog_page;
pub mod config;
pub mod data_page;
pub mod file_store;
pub mod header;
pub mod memory_store;
pub mod page_store;
pub mod paged_array;

const FILE_HEADER_SIZE: usize = 100;
const FILE_MAGIC: &[u8; 16] = b"PAGEDARRAY v0.1\0";
const FORMAT_VERSION: u8 = 1;
