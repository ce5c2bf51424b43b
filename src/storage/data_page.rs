use crate::types::{
    DATA_OVERHEAD, PageId, TOMBSTONE_MARKER, TOMBSTONE_SIZE,
    cursor::{DataCursor, DataCursorMut},
    error::{Result, StorageError},
    record::{Record, RecordFactory},
};

/*
 * Data Page Layout (little-endian)
 * ┌──────────────────────────────────────────────────────────────┐
 * │ slot_count(2)                                                │
 * ├──────────────────────────────────────────────────────────────┤
 * │ [slot 0: data_size bytes] [slot 1] ... [slot capacity-1]     │
 * ├──────────────────────────────────────────────────────────────┤
 * │ tail padding (page_size - 2) % data_size                     │
 * └──────────────────────────────────────────────────────────────┘
 *
 * Slots [0, slot_count) are allocated, the rest are unused. A deleted
 * slot keeps its place and carries TOMBSTONE_MARKER in its first i32.
 */

#[derive(Debug, Clone, PartialEq)]
pub struct DataPage {
    page_id: PageId,
    count: usize,
    data_size: usize,
    capacity: usize,
    slots: Vec<u8>,
    dirty: bool,
}

impl DataPage {
    pub fn new(page_id: PageId, data_size: usize, capacity: usize) -> Self {
        Self {
            page_id,
            count: 0,
            data_size,
            capacity,
            slots: vec![0; data_size * capacity],
            dirty: false,
        }
    }

    /// Number of `data_size` slots that fit in a page of `page_size` bytes.
    pub fn capacity_for(page_size: usize, data_size: usize) -> usize {
        if data_size == 0 {
            return 0;
        }
        page_size.saturating_sub(DATA_OVERHEAD) / data_size
    }

    pub fn from_bytes(
        page_id: PageId,
        bytes: &[u8],
        data_size: usize,
        capacity: usize,
    ) -> Result<Self> {
        let mut cursor = DataCursor::new(bytes);
        let count = cursor.read_i16()?;
        if count < 0 || count as usize > capacity {
            return Err(StorageError::corrupted(
                page_id,
                format!("slot count {} outside [0, {}]", count, capacity),
            ));
        }
        let slots = cursor.read_bytes(data_size * capacity)?.to_vec();
        Ok(Self {
            page_id,
            count: count as usize,
            data_size,
            capacity,
            slots,
            dirty: false,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    /// Reserves the next free slot, or `None` when every slot is taken.
    pub fn try_allocate_new_pos(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let index = self.count;
        self.count += 1;
        self.mark_dirty();
        Some(index)
    }

    /// Gives back the most recently reserved slot, zeroing it. Returns its index.
    pub fn release_last_pos(&mut self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        let start = self.count * self.data_size;
        self.slots[start..start + self.data_size].fill(0);
        self.mark_dirty();
        Some(self.count)
    }

    /// Byte offset of a slot within the serialized page.
    pub fn slot_offset(&self, index: usize) -> usize {
        DATA_OVERHEAD + index * self.data_size
    }

    fn slot_range(&self, index: usize) -> Result<std::ops::Range<usize>> {
        if index >= self.count {
            return Err(StorageError::InvalidSlotIndex {
                index,
                max: self.count,
            });
        }
        let start = index * self.data_size;
        Ok(start..start + self.data_size)
    }

    pub fn slot(&self, index: usize) -> Result<&[u8]> {
        let range = self.slot_range(index)?;
        Ok(&self.slots[range])
    }

    pub fn slot_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        let range = self.slot_range(index)?;
        self.mark_dirty();
        Ok(&mut self.slots[range])
    }

    pub fn readable_data(&self, index: usize) -> Result<DataCursor<'_>> {
        Ok(DataCursor::new(self.slot(index)?))
    }

    pub fn writable_data(&mut self, index: usize) -> Result<DataCursorMut<'_>> {
        Ok(DataCursorMut::new(self.slot_mut(index)?))
    }

    pub fn zero_data(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.fill(0);
        Ok(())
    }

    pub fn is_deleted(&self, index: usize) -> Result<bool> {
        Ok(self.readable_data(index)?.read_i32()? == TOMBSTONE_MARKER)
    }

    /// Tombstones a slot in place; the slot is never handed out again.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        let mut cursor = self.writable_data(index)?;
        cursor.write_i32(TOMBSTONE_MARKER)
    }

    pub fn deleted_count(&self) -> usize {
        (0..self.count)
            .filter(|&i| matches!(self.is_deleted(i), Ok(true)))
            .count()
    }
}

impl Record for DataPage {
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
        cursor.write_i16(self.count as i16)?;
        cursor.write_bytes(&self.slots)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataPageFactory {
    pub data_size: usize,
    pub capacity: usize,
}

impl DataPageFactory {
    pub fn new(data_size: usize, capacity: usize) -> Result<Self> {
        if data_size < TOMBSTONE_SIZE {
            return Err(StorageError::config(format!(
                "record size {} is smaller than the {} byte tombstone field",
                data_size, TOMBSTONE_SIZE
            )));
        }
        if capacity == 0 {
            return Err(StorageError::config(format!(
                "record size {} leaves no room for a single slot per data page",
                data_size
            )));
        }
        if capacity > i16::MAX as usize {
            return Err(StorageError::config(format!(
                "{} slots per data page exceeds the slot counter range",
                capacity
            )));
        }
        Ok(Self {
            data_size,
            capacity,
        })
    }
}

impl RecordFactory for DataPageFactory {
    type Record = DataPage;

    fn create(&self, page_id: PageId) -> DataPage {
        let mut page = DataPage::new(page_id, self.data_size, self.capacity);
        page.mark_dirty();
        page
    }

    fn deserialize(&self, page_id: PageId, buf: &[u8]) -> Result<DataPage> {
        DataPage::from_bytes(page_id, buf, self.data_size, self.capacity)
    }
}
