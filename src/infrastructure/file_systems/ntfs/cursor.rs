//! Bounds-checked little-endian reader over a borrowed byte buffer.
//!
//! Every NTFS structure decoder reads through one of these rather than
//! indexing slices directly, so a truncated or corrupt buffer produces
//! a typed error instead of a panic. Mirrors the `byteorder` +
//! `std::io::Cursor` style the teacher uses in its own boot-sector
//! parser, but bounds-checks up front instead of relying on
//! `std::io::Error` from a short read.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unexpected end of buffer: need {need} bytes at offset {offset}, have {have}")]
pub struct CursorError {
    pub offset: usize,
    pub need: usize,
    pub have: usize,
}

pub struct BinaryCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn advance(&mut self, by: usize) {
        self.pos += by;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Exposes the full backing buffer for callers (attribute decoding)
    /// that need to jump to header-relative offsets outside the
    /// cursor's own sequential read order.
    pub fn full_buffer(&self) -> &'a [u8] {
        self.data
    }

    fn require(&self, n: usize) -> Result<(), CursorError> {
        if self.pos + n > self.data.len() {
            Err(CursorError {
                offset: self.pos,
                need: n,
                have: self.data.len().saturating_sub(self.pos),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.require(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        Ok(self.read_bytes(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Reads a FILETIME (100ns ticks since 1601-01-01) as a raw u64;
    /// this crate never needs calendar conversion, only byte-identical
    /// round-tripping is relevant to its scope.
    pub fn read_filetime(&mut self) -> Result<u64, CursorError> {
        self.read_u64()
    }

    /// Reads `char_count` UTF-16LE code units and lossily converts
    /// them to a `String`. NTFS names may contain unpaired surrogates;
    /// `char::REPLACEMENT_CHARACTER` substitution is acceptable here
    /// since this tool only uses names for matching and display.
    pub fn read_utf16(&mut self, char_count: usize) -> Result<String, CursorError> {
        let bytes = self.read_bytes(char_count * 2)?;
        Ok(utf16le_to_string(bytes))
    }
}

pub fn utf16le_to_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_in_order() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a];
        let mut cursor = BinaryCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_u16().unwrap(), 0x0302);
        assert_eq!(cursor.read_u32().unwrap(), 0x09080706);
    }

    #[test]
    fn errors_on_truncated_read() {
        let data = [0x01];
        let mut cursor = BinaryCursor::new(&data);
        assert!(cursor.read_u32().is_err());
    }

    #[test]
    fn decodes_utf16le_name() {
        // "hi" as UTF-16LE
        let data = [b'h', 0x00, b'i', 0x00];
        let mut cursor = BinaryCursor::new(&data);
        assert_eq!(cursor.read_utf16(2).unwrap(), "hi");
    }
}
