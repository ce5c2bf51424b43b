use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    storage::{
        catalog_page::{CatalogPage, CatalogPageFactory},
        data_page::{DataPage, DataPageFactory},
        page_store::PageStore,
    },
    types::{
        DATA_OVERHEAD, PageId, RowId,
        cursor::{DataCursor, DataCursorMut},
        error::{Result, StorageError},
        record::Record,
    },
};

/// A resolved row: the data page holding it and the slot within that page.
///
/// Only the page id is kept; the page itself is re-fetched from the store on
/// every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogPos {
    pub row_id: RowId,
    pub data_page_id: PageId,
    pub slot: usize,
}

/// Mixed-radix digits of a row id: catalog page, entry in it, slot in the data page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAddress {
    pub catalog_ordinal: usize,
    pub entry_index: usize,
    pub slot_index: usize,
}

/// Splits a 1-based row id into its catalog/entry/slot digits.
///
/// Valid only because every catalog page but the last is completely full.
pub fn split_row_id(
    row_id: RowId,
    catalog_entries_per_page: usize,
    data_entries_per_page: usize,
) -> RowAddress {
    let zero_based = (row_id - 1) as u64;
    let data_page_ordinal = zero_based / data_entries_per_page as u64;
    RowAddress {
        catalog_ordinal: (data_page_ordinal / catalog_entries_per_page as u64) as usize,
        entry_index: (data_page_ordinal % catalog_entries_per_page as u64) as usize,
        slot_index: (zero_based % data_entries_per_page as u64) as usize,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedArrayStats {
    pub catalog_pages: usize,
    pub data_pages: u64,
    pub data_entries_per_page: usize,
    pub catalog_entries_per_page: usize,
    pub item_count: u64,
}

impl fmt::Display for PagedArrayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items in {} data pages ({} slots each) under {} catalog pages ({} entries each)",
            self.item_count,
            self.data_pages,
            self.data_entries_per_page,
            self.catalog_pages,
            self.catalog_entries_per_page
        )
    }
}

/// Append-only array of fixed-size records spread over store pages.
///
/// Row ids are 1-based and dense. A chain of catalog pages, pinned in memory
/// for the lifetime of the array, lists the data pages in order; each data
/// page holds `data_entries_per_page` slots of `data_size` bytes.
pub struct PagedArray<S: PageStore> {
    store: S,
    root_page_id: PageId,
    data_size: usize,
    catalog_factory: CatalogPageFactory,
    data_factory: DataPageFactory,
    catalog_chain: Vec<CatalogPage>,
    overall_item_count: u64,
    poisoned: Option<String>,
}

impl<S: PageStore> PagedArray<S> {
    /// Allocates a fresh root catalog page and opens an empty array on it.
    pub fn create(mut store: S, data_size: usize) -> Result<Self> {
        let (catalog_factory, data_factory) = Self::factories(store.page_size(), data_size)?;
        let mut root = store.read_record(None, &catalog_factory)?;
        store.write_record(&mut root)?;
        let root_page_id = root.page_id();
        info!(root_page_id, data_size, "created paged array");
        Ok(Self {
            store,
            root_page_id,
            data_size,
            catalog_factory,
            data_factory,
            catalog_chain: vec![root],
            overall_item_count: 0,
            poisoned: None,
        })
    }

    /// Opens the array whose catalog chain starts at `root_page_id`.
    ///
    /// The whole chain is loaded; a zero-filled root reads as an empty array.
    pub fn open(mut store: S, root_page_id: PageId, data_size: usize) -> Result<Self> {
        let (catalog_factory, data_factory) = Self::factories(store.page_size(), data_size)?;
        let catalog_chain = Self::load_chain(&mut store, root_page_id, &catalog_factory)?;
        let overall_item_count = catalog_chain
            .iter()
            .map(|page| page.item_count() as u64)
            .sum();
        let mut array = Self {
            store,
            root_page_id,
            data_size,
            catalog_factory,
            data_factory,
            catalog_chain,
            overall_item_count,
            poisoned: None,
        };
        array.validate_chain()?;
        info!(
            root_page_id,
            catalog_pages = array.catalog_chain.len(),
            items = overall_item_count,
            "opened paged array"
        );
        Ok(array)
    }

    fn factories(page_size: usize, data_size: usize) -> Result<(CatalogPageFactory, DataPageFactory)> {
        let catalog_capacity = CatalogPage::capacity_for(page_size);
        if catalog_capacity == 0 {
            return Err(StorageError::config(format!(
                "page size {} leaves no room for catalog entries",
                page_size
            )));
        }
        if catalog_capacity > i16::MAX as usize {
            return Err(StorageError::config(format!(
                "{} entries per catalog page exceeds the entry counter range",
                catalog_capacity
            )));
        }
        let data_factory = DataPageFactory::new(data_size, DataPage::capacity_for(page_size, data_size))?;
        let items_per_catalog = catalog_capacity.checked_mul(data_factory.capacity);
        if items_per_catalog.is_none_or(|items| items > i32::MAX as usize) {
            return Err(StorageError::config(format!(
                "{} entries of {} slots per catalog page exceeds the item counter range",
                catalog_capacity, data_factory.capacity
            )));
        }
        Ok((
            CatalogPageFactory {
                capacity: catalog_capacity,
            },
            data_factory,
        ))
    }

    fn load_chain(
        store: &mut S,
        root_page_id: PageId,
        factory: &CatalogPageFactory,
    ) -> Result<Vec<CatalogPage>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(root_page_id);
        while let Some(page_id) = next {
            if !visited.insert(page_id) {
                return Err(StorageError::corrupted(
                    page_id,
                    "catalog chain loops back to an earlier page",
                ));
            }
            let page = store.read_record(Some(page_id), factory)?;
            next = page.next_page_id();
            chain.push(page);
        }
        Ok(chain)
    }

    /// Every catalog page but the tail must be completely full, and the tail's
    /// item count must match its entries and the slot count of its last data page.
    fn validate_chain(&mut self) -> Result<()> {
        let per_catalog = self.items_per_catalog_page();
        let k = self.data_entries_per_page() as u64;
        let last = self.catalog_chain.len() - 1;
        for page in &self.catalog_chain[..last] {
            if !page.is_full() || page.item_count() as u64 != per_catalog {
                return Err(StorageError::corrupted(
                    page.page_id(),
                    format!(
                        "non-tail catalog page holds {} entries and {} items, expected {} and {}",
                        page.count(),
                        page.item_count(),
                        page.capacity(),
                        per_catalog
                    ),
                ));
            }
        }

        let tail = &self.catalog_chain[last];
        let items = tail.item_count() as u64;
        let Some(last_data_page_id) = tail.last_page_id() else {
            if items == 0 {
                return Ok(());
            }
            return Err(StorageError::corrupted(
                tail.page_id(),
                format!("tail catalog page holds {} items but no data pages", items),
            ));
        };
        // The last data page may be empty after an interrupted append.
        let before_last = (tail.count() as u64 - 1) * k;
        if items < before_last || items > before_last + k {
            return Err(StorageError::corrupted(
                tail.page_id(),
                format!("tail catalog page holds {} items for {} data pages", items, tail.count()),
            ));
        }
        let expected_slots = (items - before_last) as usize;
        let data_page = self.store.read_record(Some(last_data_page_id), &self.data_factory)?;
        if data_page.count() != expected_slots {
            return Err(StorageError::corrupted(
                last_data_page_id,
                format!(
                    "last data page holds {} slots, catalog accounts for {}",
                    data_page.count(),
                    expected_slots
                ),
            ));
        }
        Ok(())
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn catalog_entries_per_page(&self) -> usize {
        self.catalog_factory.capacity
    }

    pub fn data_entries_per_page(&self) -> usize {
        self.data_factory.capacity
    }

    pub fn item_count(&self) -> u64 {
        self.overall_item_count
    }

    pub fn catalog_pages(&self) -> &[CatalogPage] {
        &self.catalog_chain
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn flush(&mut self) -> Result<()> {
        self.ensure_usable()?;
        self.store.flush()
    }

    fn items_per_catalog_page(&self) -> u64 {
        self.catalog_entries_per_page() as u64 * self.data_entries_per_page() as u64
    }

    fn ensure_usable(&self) -> Result<()> {
        match &self.poisoned {
            Some(reason) => Err(StorageError::InternalCorruption {
                reason: format!("array unusable after earlier failure: {}", reason),
            }),
            None => Ok(()),
        }
    }

    fn corruption(&mut self, reason: String) -> StorageError {
        error!(root_page_id = self.root_page_id, %reason, "paged array corrupted");
        self.poisoned = Some(reason.clone());
        StorageError::InternalCorruption { reason }
    }

    fn check_invariant(&mut self) -> Result<()> {
        let full_pages = (self.catalog_chain.len() - 1) as u64;
        let tail_items = self
            .catalog_chain
            .last()
            .map(|page| page.item_count() as u64)
            .unwrap_or(0);
        let expected = full_pages * self.items_per_catalog_page() + tail_items;
        if self.overall_item_count != expected {
            let reason = format!(
                "item count {} disagrees with catalog chain ({} full pages, {} tail items)",
                self.overall_item_count, full_pages, tail_items
            );
            return Err(self.corruption(reason));
        }
        Ok(())
    }

    /// Appends one zero-filled record and returns its position.
    ///
    /// On error no row is added: counters are untouched and a reserved slot is
    /// given back, so the next append still lands where `resolve` expects it.
    pub fn allocate(&mut self) -> Result<CatalogPos> {
        self.ensure_usable()?;

        // Catalog pages left dirty by an earlier failed append go out first.
        let from = self.catalog_chain.len().saturating_sub(2);
        for catalog in &mut self.catalog_chain[from..] {
            self.store.write_record(catalog)?;
        }
        // Touch the tail; a dirty page stays cached until the next flush.
        let tail_page_id = self.catalog_chain[self.catalog_chain.len() - 1].page_id();
        self.store.page_mut(tail_page_id)?;

        let tail_last = self.catalog_chain.last().and_then(CatalogPage::last_page_id);
        let current = match tail_last {
            Some(page_id) => Some(self.store.read_record(Some(page_id), &self.data_factory)?),
            None => None,
        };
        let reserved = current.and_then(|mut page| page.try_allocate_new_pos().map(|slot| (page, slot)));
        let (mut data_page, slot) = match reserved {
            Some(reserved) => reserved,
            None => self.grow()?,
        };

        data_page.zero_data(slot)?;
        self.store.write_record(&mut data_page)?;

        let last = self.catalog_chain.len() - 1;
        let tail = &mut self.catalog_chain[last];
        tail.increase_item_count();
        if let Err(err) = self.store.write_record(tail) {
            tail.decrease_item_count();
            self.release_slot(data_page, slot)?;
            return Err(err);
        }
        self.overall_item_count += 1;
        self.check_invariant()?;

        Ok(CatalogPos {
            row_id: self.overall_item_count as RowId,
            data_page_id: data_page.page_id(),
            slot,
        })
    }

    fn release_slot(&mut self, mut data_page: DataPage, slot: usize) -> Result<()> {
        let page_id = data_page.page_id();
        if data_page.release_last_pos() != Some(slot) {
            let reason = format!("slot {} is not the last reserved slot of data page {}", slot, page_id);
            return Err(self.corruption(reason));
        }
        if let Err(err) = self.store.write_record(&mut data_page) {
            let reason = format!("could not release slot {} of data page {}: {}", slot, page_id, err);
            return Err(self.corruption(reason));
        }
        debug!(page_id, slot, "released slot after failed append");
        Ok(())
    }

    /// Creates a data page at the tail, chaining a new catalog page if the tail is full.
    ///
    /// The in-memory chain is updated before the catalog pages are written; a
    /// failed write leaves them dirty and the next append writes them again.
    /// The returned data page is not written yet.
    fn grow(&mut self) -> Result<(DataPage, usize)> {
        let mut data_page = self.store.read_record(None, &self.data_factory)?;
        let data_page_id = data_page.page_id();
        let Some(slot) = data_page.try_allocate_new_pos() else {
            let reason = format!("fresh data page {} reports full", data_page_id);
            return Err(self.corruption(reason));
        };

        let last = self.catalog_chain.len() - 1;
        if !self.catalog_chain[last].try_add_data_page(data_page_id) {
            let mut catalog = self.store.read_record(None, &self.catalog_factory)?;
            let catalog_page_id = catalog.page_id();
            if !catalog.try_add_data_page(data_page_id) {
                let reason = format!("fresh catalog page {} rejected its first entry", catalog_page_id);
                return Err(self.corruption(reason));
            }
            self.catalog_chain[last].set_next_page_id(Some(catalog_page_id));
            self.catalog_chain.push(catalog);
            debug!(catalog_page_id, ordinal = last + 1, "chained new catalog page");
        }
        for catalog in &mut self.catalog_chain[last..] {
            self.store.write_record(catalog)?;
        }
        debug!(data_page_id, "added data page");
        Ok((data_page, slot))
    }

    /// Translates a previously issued row id into its page and slot.
    pub fn resolve(&mut self, row_id: RowId) -> Result<CatalogPos> {
        self.ensure_usable()?;
        if row_id <= 0 {
            return Err(StorageError::RowIdNotPositive { row_id });
        }
        if row_id as u64 > self.overall_item_count {
            return Err(StorageError::RowIdOutOfRange {
                row_id,
                max: self.overall_item_count as RowId,
            });
        }

        let address = split_row_id(
            row_id,
            self.catalog_entries_per_page(),
            self.data_entries_per_page(),
        );
        let data_page_id = self
            .catalog_chain
            .get(address.catalog_ordinal)
            .and_then(|catalog| catalog.get(address.entry_index).ok());
        match data_page_id {
            Some(data_page_id) => Ok(CatalogPos {
                row_id,
                data_page_id,
                slot: address.slot_index,
            }),
            None => {
                let reason = format!(
                    "row {} maps to catalog page #{} entry {} which does not exist",
                    row_id, address.catalog_ordinal, address.entry_index
                );
                Err(self.corruption(reason))
            }
        }
    }

    fn slot_start(&mut self, page_id: PageId, slot: usize) -> Result<usize> {
        let capacity = self.data_entries_per_page();
        let data_size = self.data_size;
        let buf = self.store.page(page_id)?;
        let count = DataCursor::new(buf).read_i16()?;
        if count < 0 || count as usize > capacity {
            return Err(StorageError::corrupted(
                page_id,
                format!("slot count {} outside [0, {}]", count, capacity),
            ));
        }
        if slot >= count as usize {
            return Err(StorageError::InvalidSlotIndex {
                index: slot,
                max: count as usize,
            });
        }
        Ok(DATA_OVERHEAD + slot * data_size)
    }

    /// Cursor over one slot of a data page, straight out of the store's cache.
    pub fn readable_data(&mut self, page_id: PageId, slot: usize) -> Result<DataCursor<'_>> {
        self.ensure_usable()?;
        let start = self.slot_start(page_id, slot)?;
        let end = start + self.data_size;
        let buf = self.store.page(page_id)?;
        Ok(DataCursor::new(&buf[start..end]))
    }

    /// Like [`Self::readable_data`], and marks the page dirty in the store.
    pub fn writable_data(&mut self, page_id: PageId, slot: usize) -> Result<DataCursorMut<'_>> {
        self.ensure_usable()?;
        let start = self.slot_start(page_id, slot)?;
        let end = start + self.data_size;
        let buf = self.store.page_mut(page_id)?;
        Ok(DataCursorMut::new(&mut buf[start..end]))
    }

    pub fn read_record_bytes(&mut self, row_id: RowId) -> Result<Vec<u8>> {
        let pos = self.resolve(row_id)?;
        let cursor = self.readable_data(pos.data_page_id, pos.slot)?;
        Ok(cursor.as_bytes().to_vec())
    }

    /// Tombstones a row. Its id stays allocated and its space is not reused.
    pub fn delete(&mut self, row_id: RowId) -> Result<()> {
        let pos = self.resolve(row_id)?;
        let mut page = self.store.read_record(Some(pos.data_page_id), &self.data_factory)?;
        page.delete(pos.slot)?;
        self.store.write_record(&mut page)
    }

    pub fn is_deleted(&mut self, row_id: RowId) -> Result<bool> {
        let pos = self.resolve(row_id)?;
        let page = self.store.read_record(Some(pos.data_page_id), &self.data_factory)?;
        page.is_deleted(pos.slot)
    }

    pub fn stats(&self) -> PagedArrayStats {
        PagedArrayStats {
            catalog_pages: self.catalog_chain.len(),
            data_pages: self
                .overall_item_count
                .div_ceil(self.data_entries_per_page() as u64),
            data_entries_per_page: self.data_entries_per_page(),
            catalog_entries_per_page: self.catalog_entries_per_page(),
            item_count: self.overall_item_count,
        }
    }

    /// Writes every catalog page and the occupancy of every data page it lists.
    pub fn dump<W: fmt::Write>(&mut self, out: &mut W) -> Result<()> {
        self.ensure_usable()?;
        self.write_summary(out)?;
        for ordinal in 0..self.catalog_chain.len() {
            write_catalog_line(out, ordinal, &self.catalog_chain[ordinal])?;
            let entries = self.catalog_chain[ordinal].entries().to_vec();
            for data_page_id in entries {
                let page = self.store.read_record(Some(data_page_id), &self.data_factory)?;
                writeln!(
                    out,
                    "    data page {}: {}/{} slots used, {} deleted",
                    data_page_id,
                    page.count(),
                    page.capacity(),
                    page.deleted_count()
                )?;
            }
        }
        Ok(())
    }

    fn write_summary<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(
            out,
            "PagedArray(root={}, data_size={}, items={})",
            self.root_page_id, self.data_size, self.overall_item_count
        )
    }
}

fn write_catalog_line<W: fmt::Write>(out: &mut W, ordinal: usize, page: &CatalogPage) -> fmt::Result {
    write!(
        out,
        "  catalog #{} page {}: {}/{} entries, {} items",
        ordinal,
        page.page_id(),
        page.count(),
        page.capacity(),
        page.item_count()
    )?;
    match page.next_page_id() {
        Some(next) => writeln!(out, ", next {}", next),
        None => writeln!(out),
    }
}

impl<S: PageStore> fmt::Display for PagedArray<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_summary(f)?;
        for (ordinal, page) in self.catalog_chain.iter().enumerate() {
            write_catalog_line(f, ordinal, page)?;
        }
        Ok(())
    }
}
