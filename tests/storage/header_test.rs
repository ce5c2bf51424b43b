use pagedarray::{
    StorageError, StoreConfig,
    storage::header::StoreHeader,
};

#[test]
fn test_header_round_trip() {
    let mut header = StoreHeader::new(4096);
    header.page_count = 12;
    header.root_page_id = 3;
    header.file_change_counter = 9;

    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), 100);
    assert_eq!(&bytes[..16], b"PAGEDARRAY v0.1\0");
    assert_eq!(&bytes[16..20], &4096u32.to_be_bytes());

    assert_eq!(StoreHeader::from_bytes(&bytes).unwrap(), header);
}

#[test]
fn test_header_checksum_detects_tampering() {
    let mut bytes = StoreHeader::new(4096).to_bytes();
    bytes[25] ^= 0x01;
    assert!(matches!(
        StoreHeader::from_bytes(&bytes),
        Err(StorageError::InvalidHeader { .. })
    ));
}

#[test]
fn test_short_header_rejected() {
    let bytes = StoreHeader::new(4096).to_bytes();
    assert!(matches!(
        StoreHeader::from_bytes(&bytes[..50]),
        Err(StorageError::InvalidHeader { .. })
    ));
}

#[test]
fn test_config_defaults_and_overrides() {
    let config = StoreConfig::default();
    assert_eq!(config.page_size, 4096);
    assert!(config.sync_on_flush);
    assert!(config.validate().is_ok());

    let parsed: StoreConfig = serde_json::from_str(r#"{ "page_size": 1024 }"#).unwrap();
    assert_eq!(parsed.page_size, 1024);
    assert_eq!(parsed.max_cached_pages, None);
    assert!(parsed.sync_on_flush);

    let zero_cache = StoreConfig {
        max_cached_pages: Some(0),
        ..StoreConfig::default()
    };
    assert!(zero_cache.validate().is_err());
}
