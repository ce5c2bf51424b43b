use tracing::debug;

use crate::types::{
    PageId,
    error::Result,
    record::{Record, RecordFactory},
};

/// Fixed-size pages addressed by id, with write-back of dirty pages.
///
/// Ids start at 1 and are handed out densely by [`PageStore::allocate_page`].
/// Buffers returned by `page`/`page_mut` are short-lived borrows of the
/// store's cache; `page_mut` marks the page dirty for the next `flush`.
pub trait PageStore {
    fn page_size(&self) -> usize;

    fn page_count(&self) -> u32;

    /// Reserves a new zero-filled page.
    fn allocate_page(&mut self) -> Result<PageId>;

    fn page(&mut self, page_id: PageId) -> Result<&[u8]>;

    fn page_mut(&mut self, page_id: PageId) -> Result<&mut [u8]>;

    fn flush(&mut self) -> Result<()>;

    /// Materializes a record, allocating a fresh page when `page_id` is `None`.
    fn read_record<F: RecordFactory>(
        &mut self,
        page_id: Option<PageId>,
        factory: &F,
    ) -> Result<F::Record>
    where
        Self: Sized,
    {
        match page_id {
            Some(page_id) => {
                let buf = self.page(page_id)?;
                factory.deserialize(page_id, buf)
            }
            None => {
                let page_id = self.allocate_page()?;
                debug!(page_id, "allocated page for new record");
                Ok(factory.create(page_id))
            }
        }
    }

    /// Re-encodes a dirty record into its page buffer.
    fn write_record<R: Record>(&mut self, record: &mut R) -> Result<()>
    where
        Self: Sized,
    {
        if !record.is_dirty() {
            return Ok(());
        }
        let buf = self.page_mut(record.page_id())?;
        buf.fill(0);
        record.serialize(buf)?;
        record.clear_dirty();
        Ok(())
    }
}
