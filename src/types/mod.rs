pub mod cursor;
pub mod error;
pub mod record;

// Common type aliases
pub type PageId = u32;
pub type RowId = i64;

// Page store defaults and limits
pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const MIN_PAGE_SIZE: usize = 64;
pub const MAX_PAGE_SIZE: usize = 65536;
pub const CHECKSUM_SIZE: usize = 4; // CRC32 trailer per page frame

// On-disk page id encoding: i32, anything <= 0 means "no page"
pub const PAGE_ID_SIZE: usize = 4;
pub const NO_PAGE: i32 = -1;

// Catalog page: next_page_id(4) | item_count(4) | entry_count(2) | entries...
pub const CATALOG_OVERHEAD: usize = 4 + 4 + 2;

// Data page: slot_count(2) | slots...
pub const DATA_OVERHEAD: usize = 2;

// A tombstone overwrites the first i32 field of a slot
pub const TOMBSTONE_SIZE: usize = 4;
pub const TOMBSTONE_MARKER: i32 = -1;

/// Encodes an optional page id the way catalog pages store it.
pub fn encode_page_id(page_id: Option<PageId>) -> i32 {
    match page_id {
        Some(id) => id as i32,
        None => NO_PAGE,
    }
}

/// Decodes a stored page id; non-positive values are the end-of-chain sentinel.
pub fn decode_page_id(raw: i32) -> Option<PageId> {
    if raw <= 0 { None } else { Some(raw as PageId) }
}
