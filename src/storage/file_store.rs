use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    storage::{
        FILE_HEADER_SIZE, FORMAT_VERSION, config::StoreConfig, header::StoreHeader,
        page_store::PageStore,
    },
    types::{
        CHECKSUM_SIZE, PageId,
        error::{Result, StorageError},
    },
    utils::hash::{calculate_page_checksum, verify_page_checksum},
};

#[derive(Debug)]
struct CachedPage {
    data: Vec<u8>,
    dirty: bool,
}

/// File-backed [`PageStore`].
///
/// Layout: a `FILE_HEADER_SIZE` header followed by one frame per page, each
/// frame being the page bytes plus a CRC32 trailer. Pages live in an
/// in-memory cache until `flush` writes the dirty ones back.
#[derive(Debug)]
pub struct FilePageStore {
    path: PathBuf,
    file: File,
    header: StoreHeader,
    config: StoreConfig,
    cache: HashMap<PageId, CachedPage>,
}

impl FilePageStore {
    pub fn open_or_create<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path, config)
        } else {
            Self::create(path, config)
        }
    }

    pub fn create<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        info!(path = %path.display(), page_size = config.page_size, "creating page store");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(path)?;
        let header = StoreHeader::new(config.page_size);
        file.write_all(&header.to_bytes())?;
        file.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            config,
            cache: HashMap::new(),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        info!(path = %path.display(), "opening page store");
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut header_buffer = vec![0u8; FILE_HEADER_SIZE];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header_buffer)?;
        let header = StoreHeader::from_bytes(&header_buffer)?;
        if header.file_format_read_version > FORMAT_VERSION {
            return Err(StorageError::UnsupportedFileFormat {
                version: header.file_format_read_version,
            });
        }
        if header.page_size as usize != config.page_size {
            return Err(StorageError::InvalidPageSize {
                expected: config.page_size,
                actual: header.page_size as usize,
            });
        }
        let file_size = file.metadata()?.len();
        let frame_size = (config.page_size + CHECKSUM_SIZE) as u64;
        let expected_size = FILE_HEADER_SIZE as u64 + header.page_count as u64 * frame_size;
        if file_size != expected_size {
            return Err(StorageError::InvalidHeader {
                reason: format!(
                    "file size {} doesn't match {} pages in header",
                    file_size, header.page_count
                ),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            config,
            cache: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    pub fn root_page_id(&self) -> Option<PageId> {
        (self.header.root_page_id != 0).then_some(self.header.root_page_id)
    }

    /// Records the owner's entry page in the header; persisted on the next flush.
    pub fn set_root_page_id(&mut self, page_id: PageId) {
        self.header.root_page_id = page_id;
    }

    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    pub fn dirty_pages(&self) -> usize {
        self.cache.values().filter(|p| p.dirty).count()
    }

    fn frame_size(&self) -> usize {
        self.config.page_size + CHECKSUM_SIZE
    }

    fn page_offset(&self, page_id: PageId) -> u64 {
        FILE_HEADER_SIZE as u64 + (page_id as u64 - 1) * self.frame_size() as u64
    }

    fn check_page_id(&self, page_id: PageId) -> Result<()> {
        if page_id == 0 || page_id > self.header.page_count {
            return Err(StorageError::PageNotFound { page_id });
        }
        Ok(())
    }

    fn read_frame(&mut self, page_id: PageId) -> Result<Vec<u8>> {
        let mut frame = vec![0u8; self.frame_size()];
        self.file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        self.file.read_exact(&mut frame)?;
        let page_size = self.config.page_size;
        let stored = u32::from_le_bytes([
            frame[page_size],
            frame[page_size + 1],
            frame[page_size + 2],
            frame[page_size + 3],
        ]);
        frame.truncate(page_size);
        if !verify_page_checksum(page_id, &frame, stored) {
            return Err(StorageError::ChecksumMismatch {
                page_id,
                stored,
                computed: calculate_page_checksum(page_id, &frame),
            });
        }
        Ok(frame)
    }

    fn write_frame(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        let checksum = calculate_page_checksum(page_id, data);
        self.file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        self.file.write_all(data)?;
        self.file.write_all(&checksum.to_le_bytes())?;
        Ok(())
    }

    fn evict_if_needed(&mut self) {
        let Some(limit) = self.config.max_cached_pages else {
            return;
        };
        if self.cache.len() < limit {
            return;
        }
        let clean: Vec<PageId> = self
            .cache
            .iter()
            .filter(|(_, p)| !p.dirty)
            .map(|(&id, _)| id)
            .take(self.cache.len() + 1 - limit)
            .collect();
        if clean.is_empty() {
            warn!(cached = self.cache.len(), limit, "page cache full of dirty pages");
        }
        for page_id in clean {
            self.cache.remove(&page_id);
        }
    }

    fn load(&mut self, page_id: PageId) -> Result<&mut CachedPage> {
        self.check_page_id(page_id)?;
        if !self.cache.contains_key(&page_id) {
            let data = self.read_frame(page_id)?;
            self.evict_if_needed();
            self.cache.insert(page_id, CachedPage { data, dirty: false });
        }
        self.cache
            .get_mut(&page_id)
            .ok_or(StorageError::PageNotFound { page_id })
    }
}

impl PageStore for FilePageStore {
    fn page_size(&self) -> usize {
        self.config.page_size
    }

    fn page_count(&self) -> u32 {
        self.header.page_count
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        if self.header.page_count >= i32::MAX as u32 {
            return Err(StorageError::config("page id space exhausted"));
        }
        self.evict_if_needed();
        let new_page_id = self.header.page_count + 1;
        self.header.page_count = new_page_id;
        self.cache.insert(
            new_page_id,
            CachedPage {
                data: vec![0; self.config.page_size],
                dirty: true,
            },
        );
        debug!(page_id = new_page_id, "allocated page");
        Ok(new_page_id)
    }

    fn page(&mut self, page_id: PageId) -> Result<&[u8]> {
        Ok(&self.load(page_id)?.data)
    }

    fn page_mut(&mut self, page_id: PageId) -> Result<&mut [u8]> {
        let page = self.load(page_id)?;
        page.dirty = true;
        Ok(&mut page.data)
    }

    fn flush(&mut self) -> Result<()> {
        let mut dirty: Vec<PageId> = self
            .cache
            .iter()
            .filter(|(_, p)| p.dirty)
            .map(|(&id, _)| id)
            .collect();
        // Ascending order keeps the file growing without holes.
        dirty.sort_unstable();
        for page_id in &dirty {
            let data = match self.cache.get(page_id) {
                Some(page) => page.data.clone(),
                None => continue,
            };
            self.write_frame(*page_id, &data)?;
            if let Some(page) = self.cache.get_mut(page_id) {
                page.dirty = false;
            }
        }
        self.header.file_change_counter = self.header.file_change_counter.wrapping_add(1);
        let header_bytes = self.header.to_bytes();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header_bytes)?;
        self.file.flush()?;
        if self.config.sync_on_flush {
            self.file.sync_all()?;
        }
        debug!(pages = dirty.len(), "flushed page store");
        Ok(())
    }
}
