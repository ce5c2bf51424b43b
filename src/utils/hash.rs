use crc32fast::Hasher;

use crate::types::PageId;

pub fn calculate_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Frame checksum for a page; the id is mixed in so a frame written to the
/// wrong offset does not verify.
pub fn calculate_page_checksum(page_id: PageId, data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&page_id.to_le_bytes());
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_page_checksum(page_id: PageId, data: &[u8], expected_checksum: u32) -> bool {
    calculate_page_checksum(page_id, data) == expected_checksum
}
