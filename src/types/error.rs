use thiserror::Error;

use crate::types::{PageId, RowId};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Row id {row_id} is not positive")]
    RowIdNotPositive { row_id: RowId },

    #[error("Row id {row_id} out of range (max: {max})")]
    RowIdOutOfRange { row_id: RowId, max: RowId },

    #[error("Catalog entry index {index} out of bounds (count: {count})")]
    InvalidEntryIndex { index: usize, count: usize },

    #[error("Invalid slot index {index} (max: {max})")]
    InvalidSlotIndex { index: usize, max: usize },

    #[error("Page {page_id} not found")]
    PageNotFound { page_id: PageId },

    #[error("Invalid page size: {expected} bytes, got {actual} bytes")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Corrupted page: page_id={page_id}, reason={reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("Invalid file header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Unsupported file format version {version}")]
    UnsupportedFileFormat { version: u8 },

    #[error("Checksum mismatch on page {page_id}: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        page_id: PageId,
        stored: u32,
        computed: u32,
    },

    #[error("Internal corruption: {reason}")]
    InternalCorruption { reason: String },
}

impl StorageError {
    /// Errors after which the structure can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StorageError::InternalCorruption { .. }
                | StorageError::CorruptedPage { .. }
                | StorageError::ChecksumMismatch { .. }
        )
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        StorageError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupted(page_id: PageId, reason: impl Into<String>) -> Self {
        StorageError::CorruptedPage {
            page_id,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
