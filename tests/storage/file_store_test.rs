use std::{
    fs::{self, OpenOptions},
    io::{Seek, SeekFrom, Write},
};

use pagedarray::{
    FilePageStore, PageStore, PagedArray, StorageError, StoreConfig,
    utils::mock::{TempStore, small_page_config},
};

use crate::init_tracing_for_tests;

const PAGE_SIZE: usize = 128;
const DATA_SIZE: usize = 12;
const FILE_HEADER_SIZE: u64 = 100;

#[test]
fn test_create_new_store() {
    init_tracing_for_tests();
    let temp = TempStore::with_prefix("create_store").unwrap();
    let store = temp.create_store(PAGE_SIZE).unwrap();
    assert_eq!(store.page_size(), PAGE_SIZE);
    assert_eq!(store.page_count(), 0);
    assert_eq!(store.root_page_id(), None);
    assert!(temp.path.exists());
    assert!(temp.path.starts_with(temp.dir()));
    assert_eq!(fs::metadata(&temp.path).unwrap().len(), FILE_HEADER_SIZE);
}

#[test]
fn test_allocate_and_flush_grows_file() {
    let temp = TempStore::new().unwrap();
    let mut store = temp.create_store(PAGE_SIZE).unwrap();
    assert_eq!(store.allocate_page().unwrap(), 1);
    assert_eq!(store.allocate_page().unwrap(), 2);
    assert_eq!(store.dirty_pages(), 2);

    store.flush().unwrap();
    assert_eq!(store.dirty_pages(), 0);
    let frame = (PAGE_SIZE + 4) as u64;
    assert_eq!(fs::metadata(&temp.path).unwrap().len(), FILE_HEADER_SIZE + 2 * frame);
}

#[test]
fn test_page_contents_persist() {
    let temp = TempStore::new().unwrap();
    {
        let mut store = temp.create_store(PAGE_SIZE).unwrap();
        let id = store.allocate_page().unwrap();
        store.page_mut(id).unwrap()[..5].copy_from_slice(b"hello");
        store.set_root_page_id(id);
        store.flush().unwrap();
    }
    let mut store = temp.open_store(PAGE_SIZE).unwrap();
    assert_eq!(store.page_count(), 1);
    assert_eq!(store.root_page_id(), Some(1));
    assert_eq!(&store.page(1).unwrap()[..5], b"hello");
    assert!(store.header().file_change_counter > 1);
}

#[test]
fn test_unknown_page_is_not_found() {
    let temp = TempStore::new().unwrap();
    let mut store = temp.create_store(PAGE_SIZE).unwrap();
    store.allocate_page().unwrap();
    assert!(matches!(store.page(0), Err(StorageError::PageNotFound { page_id: 0 })));
    assert!(matches!(store.page(2), Err(StorageError::PageNotFound { page_id: 2 })));
}

#[test]
fn test_page_size_mismatch_rejected() {
    let temp = TempStore::new().unwrap();
    temp.create_store(PAGE_SIZE).unwrap();
    assert!(matches!(
        temp.open_store(PAGE_SIZE * 2),
        Err(StorageError::InvalidPageSize { expected: 256, actual: 128 })
    ));
}

#[test]
fn test_invalid_page_size_config() {
    let temp = TempStore::new().unwrap();
    assert!(matches!(
        FilePageStore::create(&temp.path, StoreConfig::with_page_size(16)),
        Err(StorageError::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        FilePageStore::create(&temp.path, StoreConfig::with_page_size(1 << 20)),
        Err(StorageError::InvalidConfiguration { .. })
    ));
}

#[test]
fn test_bad_magic_rejected() {
    let temp = TempStore::new().unwrap();
    fs::write(&temp.path, vec![0u8; FILE_HEADER_SIZE as usize]).unwrap();
    assert!(matches!(
        temp.open_store(PAGE_SIZE),
        Err(StorageError::InvalidHeader { .. })
    ));
}

#[test]
fn test_truncated_file_rejected() {
    let temp = TempStore::new().unwrap();
    {
        let mut store = temp.create_store(PAGE_SIZE).unwrap();
        store.allocate_page().unwrap();
        store.allocate_page().unwrap();
        store.flush().unwrap();
    }
    let len = fs::metadata(&temp.path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&temp.path).unwrap();
    file.set_len(len - 10).unwrap();
    drop(file);

    assert!(matches!(
        temp.open_store(PAGE_SIZE),
        Err(StorageError::InvalidHeader { .. })
    ));
}

#[test]
fn test_corrupted_frame_detected_by_checksum() {
    let temp = TempStore::new().unwrap();
    {
        let mut store = temp.create_store(PAGE_SIZE).unwrap();
        let id = store.allocate_page().unwrap();
        store.page_mut(id).unwrap().fill(7);
        store.flush().unwrap();
    }
    {
        let mut file = OpenOptions::new().write(true).open(&temp.path).unwrap();
        file.seek(SeekFrom::Start(FILE_HEADER_SIZE + 3)).unwrap();
        file.write_all(&[0xFF]).unwrap();
    }
    let mut store = temp.open_store(PAGE_SIZE).unwrap();
    let err = store.page(1).err().unwrap();
    assert!(err.is_fatal());
    assert!(matches!(err, StorageError::ChecksumMismatch { page_id: 1, .. }));
}

#[test]
fn test_cache_bound_evicts_clean_pages_only() {
    let temp = TempStore::new().unwrap();
    let config = StoreConfig {
        max_cached_pages: Some(2),
        ..small_page_config(PAGE_SIZE)
    };
    let mut store = FilePageStore::create(&temp.path, config).unwrap();
    for _ in 0..4 {
        store.allocate_page().unwrap();
    }
    // Dirty pages stay cached past the bound.
    assert_eq!(store.cached_pages(), 4);
    store.flush().unwrap();

    let fifth = store.allocate_page().unwrap();
    assert!(store.cached_pages() <= 2);
    for id in 1..=4 {
        assert_eq!(store.page(id).unwrap().len(), PAGE_SIZE);
        assert!(store.cached_pages() <= 2);
    }
    // The unflushed page was never evicted.
    store.page_mut(fifth).unwrap()[0] = 1;
    store.flush().unwrap();
}

#[test]
fn test_paged_array_persists_across_reopen() {
    init_tracing_for_tests();
    let temp = TempStore::with_prefix("array_reopen").unwrap();
    let items = 400;
    let root = {
        let store = temp.create_store(PAGE_SIZE).unwrap();
        let mut array = PagedArray::create(store, DATA_SIZE).unwrap();
        for i in 1..=items {
            let pos = array.allocate().unwrap();
            let mut cursor = array.writable_data(pos.data_page_id, pos.slot).unwrap();
            cursor.write_i32(i * 3).unwrap();
            cursor.write_i64(-(i as i64)).unwrap();
        }
        array.delete(17).unwrap();
        let root = array.root_page_id();
        array.store_mut().set_root_page_id(root);
        array.flush().unwrap();
        root
    };

    let store = temp.open_store(PAGE_SIZE).unwrap();
    assert_eq!(store.root_page_id(), Some(root));
    let mut array = PagedArray::open(store, root, DATA_SIZE).unwrap();
    assert_eq!(array.item_count(), items as u64);
    // 128-byte pages: 29 catalog entries, 10 slots of 12 bytes.
    assert_eq!(array.catalog_entries_per_page(), 29);
    assert_eq!(array.data_entries_per_page(), 10);
    assert_eq!(array.stats().catalog_pages, 2);

    for i in 1..=items {
        if i == 17 {
            assert!(array.is_deleted(17).unwrap());
            continue;
        }
        let pos = array.resolve(i as i64).unwrap();
        let mut cursor = array.readable_data(pos.data_page_id, pos.slot).unwrap();
        assert_eq!(cursor.read_i32().unwrap(), i * 3);
        assert_eq!(cursor.read_i64().unwrap(), -(i as i64));
    }
    assert_eq!(array.allocate().unwrap().row_id, items as i64 + 1);
}

#[test]
fn test_open_or_create() {
    let temp = TempStore::new().unwrap();
    {
        let mut store = FilePageStore::open_or_create(&temp.path, small_page_config(PAGE_SIZE)).unwrap();
        store.allocate_page().unwrap();
        store.flush().unwrap();
    }
    let store = FilePageStore::open_or_create(&temp.path, small_page_config(PAGE_SIZE)).unwrap();
    assert_eq!(store.page_count(), 1);
}
