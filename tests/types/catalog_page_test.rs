use pagedarray::{
    CatalogPage, StorageError,
    types::{CATALOG_OVERHEAD, record::Record},
};

fn serialize(page: &CatalogPage, page_size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; page_size];
    page.serialize(&mut buf).unwrap();
    buf
}

#[test]
fn test_capacity_for_page_size() {
    assert_eq!(CatalogPage::capacity_for(64), 13);
    assert_eq!(CatalogPage::capacity_for(4096), 1021);
    assert_eq!(CatalogPage::capacity_for(CATALOG_OVERHEAD + 3), 0);
    assert_eq!(CatalogPage::capacity_for(4), 0);
}

#[test]
fn test_new_page_is_empty() {
    let page = CatalogPage::new(3, 4);
    assert_eq!(page.page_id(), 3);
    assert_eq!(page.count(), 0);
    assert_eq!(page.item_count(), 0);
    assert_eq!(page.next_page_id(), None);
    assert_eq!(page.last_page_id(), None);
    assert!(!page.is_full());
    assert!(!page.is_dirty());
}

#[test]
fn test_try_add_until_full() {
    let mut page = CatalogPage::new(1, 3);
    assert!(page.try_add_data_page(10));
    assert!(page.try_add_data_page(11));
    assert!(page.try_add_data_page(12));
    assert!(page.is_full());
    assert!(!page.try_add_data_page(13));
    assert_eq!(page.entries(), &[10, 11, 12]);
    assert_eq!(page.last_page_id(), Some(12));
}

#[test]
fn test_get_is_bounds_checked() {
    let mut page = CatalogPage::new(1, 3);
    page.try_add_data_page(42);
    assert_eq!(page.get(0).unwrap(), 42);
    assert!(matches!(
        page.get(1),
        Err(StorageError::InvalidEntryIndex { index: 1, count: 1 })
    ));
}

#[test]
fn test_mutators_mark_dirty() {
    let mut page = CatalogPage::new(1, 3);
    page.try_add_data_page(2);
    assert!(page.is_dirty());

    page.clear_dirty();
    page.increase_item_count();
    assert!(page.is_dirty());
    assert_eq!(page.item_count(), 1);

    page.clear_dirty();
    page.set_next_page_id(Some(9));
    assert!(page.is_dirty());

    page.clear_dirty();
    let mut full = CatalogPage::new(2, 0);
    assert!(!full.try_add_data_page(5));
    assert!(!full.is_dirty());
}

#[test]
fn test_layout_on_disk() {
    let mut page = CatalogPage::new(1, 13);
    page.set_next_page_id(Some(7));
    page.try_add_data_page(2);
    page.try_add_data_page(3);
    page.increase_item_count();
    page.increase_item_count();

    let buf = serialize(&page, 64);
    assert_eq!(&buf[0..4], &7i32.to_le_bytes());
    assert_eq!(&buf[4..8], &2i32.to_le_bytes());
    assert_eq!(&buf[8..10], &2i16.to_le_bytes());
    assert_eq!(&buf[10..14], &2i32.to_le_bytes());
    assert_eq!(&buf[14..18], &3i32.to_le_bytes());
    assert!(buf[18..].iter().all(|&b| b == 0));

    let decoded = CatalogPage::from_bytes(1, &buf, 13).unwrap();
    assert_eq!(decoded.next_page_id(), Some(7));
    assert_eq!(decoded.item_count(), 2);
    assert_eq!(decoded.entries(), &[2, 3]);
    assert!(!decoded.is_dirty());
}

#[test]
fn test_end_of_chain_sentinel() {
    let page = CatalogPage::new(1, 13);
    let buf = serialize(&page, 64);
    assert_eq!(&buf[0..4], &(-1i32).to_le_bytes());

    // Zero also reads as end of chain.
    let zeroed = vec![0u8; 64];
    let decoded = CatalogPage::from_bytes(1, &zeroed, 13).unwrap();
    assert_eq!(decoded.next_page_id(), None);
    assert_eq!(decoded.count(), 0);
}

#[test]
fn test_corrupt_entry_count_rejected() {
    let mut buf = vec![0u8; 64];
    buf[8..10].copy_from_slice(&14i16.to_le_bytes());
    assert!(matches!(
        CatalogPage::from_bytes(5, &buf, 13),
        Err(StorageError::CorruptedPage { page_id: 5, .. })
    ));

    buf[8..10].copy_from_slice(&(-1i16).to_le_bytes());
    assert!(matches!(
        CatalogPage::from_bytes(5, &buf, 13),
        Err(StorageError::CorruptedPage { page_id: 5, .. })
    ));
}

#[test]
fn test_corrupt_item_count_and_entry_rejected() {
    let mut buf = vec![0u8; 64];
    buf[4..8].copy_from_slice(&(-3i32).to_le_bytes());
    assert!(CatalogPage::from_bytes(1, &buf, 13).is_err());

    let mut buf = vec![0u8; 64];
    buf[8..10].copy_from_slice(&1i16.to_le_bytes());
    buf[10..14].copy_from_slice(&0i32.to_le_bytes());
    assert!(matches!(
        CatalogPage::from_bytes(1, &buf, 13),
        Err(StorageError::CorruptedPage { .. })
    ));
}
