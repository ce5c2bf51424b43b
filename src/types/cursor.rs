//! Positioned little-endian readers and writers over a byte range.
//!
//! Slot accessors hand these out bounded to exactly one record, so a
//! higher layer can lay out its own fields without seeing the rest of the page.
//! Page serializers use them over the whole page buffer.

use crate::types::error::{Result, StorageError};

macro_rules! read_int {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty> {
            const N: usize = std::mem::size_of::<$ty>();
            let bytes = self.take(N)?;
            let mut raw = [0u8; N];
            raw.copy_from_slice(bytes);
            Ok(<$ty>::from_le_bytes(raw))
        }
    };
}

macro_rules! write_int {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            self.write_bytes(&value.to_le_bytes())
        }
    };
}

#[derive(Debug)]
pub struct DataCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DataCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(StorageError::InvalidSlotIndex {
                index: pos,
                max: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// The whole range this cursor covers, independent of position.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        if end > self.buf.len() {
            return Err(StorageError::InvalidSlotIndex {
                index: end,
                max: self.buf.len(),
            });
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    read_int!(read_i8, i8);
    read_int!(read_u8, u8);
    read_int!(read_i16, i16);
    read_int!(read_u16, u16);
    read_int!(read_i32, i32);
    read_int!(read_u32, u32);
    read_int!(read_i64, i64);
}

#[derive(Debug)]
pub struct DataCursorMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> DataCursorMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(StorageError::InvalidSlotIndex {
                index: pos,
                max: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.buf
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        let range = self.advance(len)?;
        Ok(&self.buf[range])
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let range = self.advance(bytes.len())?;
        self.buf[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Zeroes `len` bytes from the current position.
    pub fn fill_zero(&mut self, len: usize) -> Result<()> {
        let range = self.advance(len)?;
        self.buf[range].fill(0);
        Ok(())
    }

    fn advance(&mut self, len: usize) -> Result<std::ops::Range<usize>> {
        let end = self.pos + len;
        if end > self.buf.len() {
            return Err(StorageError::InvalidSlotIndex {
                index: end,
                max: self.buf.len(),
            });
        }
        let range = self.pos..end;
        self.pos = end;
        Ok(range)
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        self.read_bytes(len)
    }

    read_int!(read_i8, i8);
    read_int!(read_u8, u8);
    read_int!(read_i16, i16);
    read_int!(read_u16, u16);
    read_int!(read_i32, i32);
    read_int!(read_u32, u32);
    read_int!(read_i64, i64);

    write_int!(write_i8, i8);
    write_int!(write_u8, u8);
    write_int!(write_i16, i16);
    write_int!(write_u16, u16);
    write_int!(write_i32, i32);
    write_int!(write_u32, u32);
    write_int!(write_i64, i64);
}
