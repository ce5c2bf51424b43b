use crate::types::{PageId, error::Result};

/// A page-sized object materialized from a page store buffer.
///
/// Mutators call [`Record::mark_dirty`]; the page store re-serializes dirty
/// records on [`crate::storage::page_store::PageStore::write_record`].
pub trait Record {
    fn page_id(&self) -> PageId;

    fn is_dirty(&self) -> bool;

    fn mark_dirty(&mut self);

    fn clear_dirty(&mut self);

    /// Encodes the record into a full page buffer. `buf` is zeroed beforehand.
    fn serialize(&self, buf: &mut [u8]) -> Result<()>;
}

/// Builds records of one kind, either fresh or from an existing buffer.
pub trait RecordFactory {
    type Record: Record;

    /// A record for a newly allocated, zero-filled page.
    fn create(&self, page_id: PageId) -> Self::Record;

    fn deserialize(&self, page_id: PageId, buf: &[u8]) -> Result<Self::Record>;
}
