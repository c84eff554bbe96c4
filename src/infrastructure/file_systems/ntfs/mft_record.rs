//! MFT record (FILE record) header decoding and attribute iteration.

use super::attribute::{parse_attribute, Attribute};
use super::cursor::BinaryCursor;
use super::fixup::apply_fixups;
use crate::domain::entities::MftReference;
use crate::domain::error::{NtfsError, NtfsResult};

const FILE_MAGIC: &[u8; 4] = b"FILE";
const BAAD_MAGIC: &[u8; 4] = b"BAAD";

pub const FLAG_IN_USE: u16 = 0x0001;
pub const FLAG_DIRECTORY: u16 = 0x0002;

#[derive(Debug, Clone)]
pub struct MftRecord {
    pub reference: MftReference,
    pub flags: u16,
    pub base_record: MftReference,
    buffer: Vec<u8>,
    first_attribute_offset: u16,
}

impl MftRecord {
    /// Applies fixups and validates the header of a raw record buffer
    /// (exactly one MFT-record-size slice, already extracted from the
    /// volume via the MFT locator).
    pub fn parse(mut buffer: Vec<u8>, record_number: u64) -> NtfsResult<Self> {
        if buffer.len() < 4 {
            return Err(NtfsError::RecordOutOfRange(record_number));
        }
        let magic = &buffer[0..4];
        if magic == BAAD_MAGIC {
            return Err(NtfsError::CorruptAttribute {
                record: record_number,
                reason: "record marked BAAD (multi-sector transfer failure)".to_string(),
            });
        }
        if magic != FILE_MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(&buffer[0..4]);
            return Err(NtfsError::BadMagic {
                what: "MFT record",
                offset: record_number * buffer.len() as u64,
                expected: *FILE_MAGIC,
                found,
            });
        }

        let usa_offset = u16::from_le_bytes([buffer[4], buffer[5]]);
        let usa_count = u16::from_le_bytes([buffer[6], buffer[7]]);
        apply_fixups(&mut buffer, usa_offset, usa_count)?;

        let sequence_number = u16::from_le_bytes([buffer[0x10], buffer[0x11]]);
        let flags = u16::from_le_bytes([buffer[0x16], buffer[0x17]]);
        let base_raw = u64::from_le_bytes(buffer[0x20..0x28].try_into().unwrap());
        let first_attribute_offset = u16::from_le_bytes([buffer[0x14], buffer[0x15]]);

        Ok(Self {
            reference: MftReference::new(record_number, sequence_number),
            flags,
            base_record: MftReference::from_raw(base_raw),
            buffer,
            first_attribute_offset,
        })
    }

    pub fn is_in_use(&self) -> bool {
        self.flags & FLAG_IN_USE != 0
    }

    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    pub fn is_base_record(&self) -> bool {
        self.base_record.record_number() == 0
    }

    /// Iterates the record's attributes in on-disk order, stopping at
    /// the 0xFFFFFFFF end marker.
    pub fn attributes(&self) -> NtfsResult<Vec<Attribute>> {
        let mut cursor = BinaryCursor::at(&self.buffer, self.first_attribute_offset as usize);
        let mut attrs = Vec::new();
        while cursor.remaining() >= 4 {
            match parse_attribute(&mut cursor, self.reference.record_number())? {
                Some(attr) => attrs.push(attr),
                None => break,
            }
        }
        Ok(attrs)
    }
}
