use crate::types::{
    CATALOG_OVERHEAD, PAGE_ID_SIZE, PageId,
    cursor::{DataCursor, DataCursorMut},
    decode_page_id, encode_page_id,
    error::{Result, StorageError},
    record::{Record, RecordFactory},
};

/*
 * Catalog Page Layout (little-endian)
 * ┌──────────────────────────────────────────────────────────────┐
 * │ next_page_id(4) | item_count(4) | entry_count(2)             │
 * ├──────────────────────────────────────────────────────────────┤
 * │ [data page id(4)] [data page id(4)] ... entry_count entries  │
 * ├──────────────────────────────────────────────────────────────┤
 * │                        unused                                │
 * └──────────────────────────────────────────────────────────────┘
 */

/// Directory of data page ids plus a forward link to the next catalog page.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    page_id: PageId,
    next_page_id: Option<PageId>,
    item_count: u32,
    entries: Vec<PageId>,
    capacity: usize,
    dirty: bool,
}

impl CatalogPage {
    pub fn new(page_id: PageId, capacity: usize) -> Self {
        Self {
            page_id,
            next_page_id: None,
            item_count: 0,
            entries: Vec::with_capacity(capacity),
            capacity,
            dirty: false,
        }
    }

    /// Number of entries that fit in a page of `page_size` bytes.
    pub fn capacity_for(page_size: usize) -> usize {
        page_size.saturating_sub(CATALOG_OVERHEAD) / PAGE_ID_SIZE
    }

    pub fn from_bytes(page_id: PageId, bytes: &[u8], capacity: usize) -> Result<Self> {
        let mut cursor = DataCursor::new(bytes);
        let next_page_id = decode_page_id(cursor.read_i32()?);
        let item_count = cursor.read_i32()?;
        let entry_count = cursor.read_i16()?;

        if item_count < 0 {
            return Err(StorageError::corrupted(
                page_id,
                format!("negative item count {}", item_count),
            ));
        }
        if entry_count < 0 || entry_count as usize > capacity {
            return Err(StorageError::corrupted(
                page_id,
                format!("entry count {} outside [0, {}]", entry_count, capacity),
            ));
        }

        let mut entries = Vec::with_capacity(capacity);
        for _ in 0..entry_count {
            let raw = cursor.read_i32()?;
            match decode_page_id(raw) {
                Some(id) => entries.push(id),
                None => {
                    return Err(StorageError::corrupted(
                        page_id,
                        format!("invalid data page id {} in catalog", raw),
                    ));
                }
            }
        }

        Ok(Self {
            page_id,
            next_page_id,
            item_count: item_count as u32,
            entries,
            capacity,
            dirty: false,
        })
    }

    pub fn next_page_id(&self) -> Option<PageId> {
        self.next_page_id
    }

    pub fn set_next_page_id(&mut self, page_id: Option<PageId>) {
        self.next_page_id = page_id;
        self.mark_dirty();
    }

    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    pub fn increase_item_count(&mut self) {
        self.item_count += 1;
        self.mark_dirty();
    }

    pub(crate) fn decrease_item_count(&mut self) {
        self.item_count -= 1;
        self.mark_dirty();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn entries(&self) -> &[PageId] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Result<PageId> {
        self.entries
            .get(index)
            .copied()
            .ok_or(StorageError::InvalidEntryIndex {
                index,
                count: self.entries.len(),
            })
    }

    pub fn last_page_id(&self) -> Option<PageId> {
        self.entries.last().copied()
    }

    /// Appends a data page id; returns false without modifying anything when full.
    pub fn try_add_data_page(&mut self, page_id: PageId) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(page_id);
        self.mark_dirty();
        true
    }
}

impl Record for CatalogPage {
    fn page_id(&self) -> PageId {
        self.page_id
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<()> {
        let mut cursor = DataCursorMut::new(buf);
        cursor.write_i32(encode_page_id(self.next_page_id))?;
        cursor.write_i32(self.item_count as i32)?;
        cursor.write_i16(self.entries.len() as i16)?;
        for &entry in &self.entries {
            cursor.write_i32(encode_page_id(Some(entry)))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogPageFactory {
    pub capacity: usize,
}

impl RecordFactory for CatalogPageFactory {
    type Record = CatalogPage;

    fn create(&self, page_id: PageId) -> CatalogPage {
        let mut page = CatalogPage::new(page_id, self.capacity);
        page.mark_dirty();
        page
    }

    fn deserialize(&self, page_id: PageId, buf: &[u8]) -> Result<CatalogPage> {
        CatalogPage::from_bytes(page_id, buf, self.capacity)
    }
}
