use crate::{
    storage::{FILE_HEADER_SIZE, FILE_MAGIC, FORMAT_VERSION},
    types::{PageId, error::StorageError},
    utils::hash::calculate_checksum,
};

/*
 * File Header (big-endian, FILE_HEADER_SIZE bytes)
 *   magic(16) | page_size(4) | write_version(1) | read_version(1) |
 *   page_count(4) | change_counter(4) | root_page_id(4) | checksum(4) | reserved
 *
 * checksum covers every byte before it.
 */
const CHECKSUM_OFFSET: usize = 16 + 4 + 1 + 1 + 4 + 4 + 4;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreHeader {
    pub magic: [u8; 16],
    pub page_size: u32,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub page_count: u32,
    pub file_change_counter: u32,
    /// Page the owner of this file treats as its entry point, 0 when unset.
    pub root_page_id: PageId,
}

impl StoreHeader {
    pub fn new(page_size: usize) -> Self {
        Self {
            magic: *FILE_MAGIC,
            page_size: page_size as u32,
            file_format_write_version: FORMAT_VERSION,
            file_format_read_version: FORMAT_VERSION,
            page_count: 0,
            file_change_counter: 1,
            root_page_id: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(FILE_HEADER_SIZE);

        buffer.extend_from_slice(&self.magic);
        buffer.extend_from_slice(&self.page_size.to_be_bytes());
        buffer.push(self.file_format_write_version);
        buffer.push(self.file_format_read_version);
        buffer.extend_from_slice(&self.page_count.to_be_bytes());
        buffer.extend_from_slice(&self.file_change_counter.to_be_bytes());
        buffer.extend_from_slice(&self.root_page_id.to_be_bytes());
        let checksum = calculate_checksum(&buffer);
        buffer.extend_from_slice(&checksum.to_be_bytes());

        buffer.resize(FILE_HEADER_SIZE, 0);
        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(StorageError::InvalidHeader {
                reason: "Header too short".to_string(),
            });
        }

        let mut offset = 0;

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[offset..offset + 16]);
        if &magic != FILE_MAGIC {
            return Err(StorageError::InvalidHeader {
                reason: "Invalid magic number".to_string(),
            });
        }
        offset += 16;

        let page_size = read_u32(bytes, offset);
        offset += 4;

        let file_format_write_version = bytes[offset];
        offset += 1;
        let file_format_read_version = bytes[offset];
        offset += 1;

        let page_count = read_u32(bytes, offset);
        offset += 4;

        let file_change_counter = read_u32(bytes, offset);
        offset += 4;

        let root_page_id = read_u32(bytes, offset);
        offset += 4;

        let stored = read_u32(bytes, offset);
        let computed = calculate_checksum(&bytes[..CHECKSUM_OFFSET]);
        if stored != computed {
            return Err(StorageError::InvalidHeader {
                reason: format!(
                    "checksum mismatch: stored {:#010x}, computed {:#010x}",
                    stored, computed
                ),
            });
        }

        Ok(Self {
            magic,
            page_size,
            file_format_write_version,
            file_format_read_version,
            page_count,
            file_change_counter,
            root_page_id,
        })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
