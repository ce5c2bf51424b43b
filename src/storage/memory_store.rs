use crate::{
    storage::{config::StoreConfig, page_store::PageStore},
    types::{
        PageId,
        error::{Result, StorageError},
    },
};

#[derive(Debug)]
struct MemoryPage {
    data: Vec<u8>,
    dirty: bool,
}

/// In-memory implementation for [`PageStore`]
///
/// Each page is a byte vector with a dirty flag. `flush` only clears the
/// flags, which lets tests observe the write-back contract.
#[derive(Debug)]
pub struct MemoryPageStore {
    page_size: usize,
    pages: Vec<MemoryPage>,
    flush_count: usize,
}

impl MemoryPageStore {
    pub fn new(page_size: usize) -> Result<Self> {
        StoreConfig::with_page_size(page_size).validate()?;
        Ok(Self {
            page_size,
            pages: Vec::new(),
            flush_count: 0,
        })
    }

    pub fn is_dirty(&self, page_id: PageId) -> bool {
        self.slot(page_id).map(|p| p.dirty).unwrap_or(false)
    }

    pub fn dirty_pages(&self) -> Vec<PageId> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.dirty)
            .map(|(i, _)| i as PageId + 1)
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    fn slot(&self, page_id: PageId) -> Option<&MemoryPage> {
        let index = (page_id as usize).checked_sub(1)?;
        self.pages.get(index)
    }

    fn slot_mut(&mut self, page_id: PageId) -> Result<&mut MemoryPage> {
        (page_id as usize)
            .checked_sub(1)
            .and_then(|index| self.pages.get_mut(index))
            .ok_or(StorageError::PageNotFound { page_id })
    }
}

impl PageStore for MemoryPageStore {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        if self.pages.len() >= i32::MAX as usize {
            return Err(StorageError::config("page id space exhausted"));
        }
        self.pages.push(MemoryPage {
            data: vec![0; self.page_size],
            dirty: true,
        });
        Ok(self.pages.len() as PageId)
    }

    fn page(&mut self, page_id: PageId) -> Result<&[u8]> {
        Ok(&self.slot_mut(page_id)?.data)
    }

    fn page_mut(&mut self, page_id: PageId) -> Result<&mut [u8]> {
        let page = self.slot_mut(page_id)?;
        page.dirty = true;
        Ok(&mut page.data)
    }

    fn flush(&mut self) -> Result<()> {
        for page in &mut self.pages {
            page.dirty = false;
        }
        self.flush_count += 1;
        Ok(())
    }
}
