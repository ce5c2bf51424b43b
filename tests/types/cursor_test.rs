use pagedarray::{
    StorageError,
    types::cursor::{DataCursor, DataCursorMut},
};

#[test]
fn test_write_then_read_fields() {
    let mut buf = [0u8; 16];
    let mut writer = DataCursorMut::new(&mut buf);
    writer.write_i32(-7).unwrap();
    writer.write_i16(300).unwrap();
    writer.write_u8(0xFE).unwrap();
    writer.write_i64(i64::MIN + 1).unwrap();
    assert_eq!(writer.position(), 15);
    assert_eq!(writer.remaining(), 1);

    let mut reader = DataCursor::new(&buf);
    assert_eq!(reader.read_i32().unwrap(), -7);
    assert_eq!(reader.read_i16().unwrap(), 300);
    assert_eq!(reader.read_u8().unwrap(), 0xFE);
    assert_eq!(reader.read_i64().unwrap(), i64::MIN + 1);
}

#[test]
fn test_values_are_little_endian() {
    let mut buf = [0u8; 4];
    DataCursorMut::new(&mut buf).write_u32(0x0A0B0C0D).unwrap();
    assert_eq!(buf, [0x0D, 0x0C, 0x0B, 0x0A]);
}

#[test]
fn test_reads_past_end_fail_without_moving() {
    let buf = [1u8, 2, 3];
    let mut reader = DataCursor::new(&buf);
    assert!(matches!(
        reader.read_i32(),
        Err(StorageError::InvalidSlotIndex { index: 4, max: 3 })
    ));
    assert_eq!(reader.position(), 0);
    assert_eq!(reader.read_bytes(3).unwrap(), &[1, 2, 3]);
    assert!(reader.read_u8().is_err());
}

#[test]
fn test_writes_past_end_fail() {
    let mut buf = [0u8; 6];
    let mut writer = DataCursorMut::new(&mut buf);
    writer.write_i32(1).unwrap();
    assert!(writer.write_i32(2).is_err());
    assert_eq!(writer.position(), 4);
    writer.write_i16(3).unwrap();
    assert!(writer.write_u8(4).is_err());
}

#[test]
fn test_seek_and_fill_zero() {
    let mut buf = [0xFFu8; 8];
    let mut writer = DataCursorMut::new(&mut buf);
    writer.seek(2).unwrap();
    writer.fill_zero(4).unwrap();
    assert!(writer.seek(9).is_err());
    writer.seek(0).unwrap();
    assert_eq!(writer.read_u16().unwrap(), 0xFFFF);
    assert_eq!(writer.read_i32().unwrap(), 0);
    assert_eq!(writer.as_bytes(), &[0xFF, 0xFF, 0, 0, 0, 0, 0xFF, 0xFF]);
}

#[test]
fn test_as_bytes_mut_edits_whole_range() {
    let mut buf = [0u8; 4];
    let mut writer = DataCursorMut::new(&mut buf);
    writer.write_u8(1).unwrap();
    writer.as_bytes_mut()[3] = 9;
    assert_eq!(writer.position(), 1);
    assert_eq!(writer.as_bytes(), &[1, 0, 0, 9]);
}
