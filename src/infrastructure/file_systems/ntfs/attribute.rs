//! MFT attribute header/body decoding.
//!
//! Every attribute (resident or non-resident) shares a common header;
//! the body layout then branches depending on the `non_resident` flag.
//! This module only decodes structure — interpreting particular
//! attribute types ($FILE_NAME, $DATA, ...) is left to callers
//! (`mft_record`, `index`, `volume`) since most attributes are opaque
//! payload as far as this layer is concerned.

use super::cursor::BinaryCursor;
use super::runlist::{decode_runlist, Run};
use crate::domain::error::{NtfsError, NtfsResult};

pub const ATTR_STANDARD_INFORMATION: u32 = 0x10;
pub const ATTR_ATTRIBUTE_LIST: u32 = 0x20;
pub const ATTR_FILE_NAME: u32 = 0x30;
pub const ATTR_DATA: u32 = 0x80;
pub const ATTR_INDEX_ROOT: u32 = 0x90;
pub const ATTR_INDEX_ALLOCATION: u32 = 0xA0;
pub const ATTR_END: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone)]
pub struct Attribute {
    pub attr_type: u32,
    pub non_resident: bool,
    pub name: Option<String>,
    pub body: AttributeBody,
}

#[derive(Debug, Clone)]
pub enum AttributeBody {
    Resident { data: Vec<u8> },
    NonResident {
        starting_vcn: u64,
        runs: Vec<Run>,
        data_size: u64,
        initialized_size: u64,
        allocated_size: u64,
    },
}

impl Attribute {
    pub fn resident_data(&self) -> Option<&[u8]> {
        match &self.body {
            AttributeBody::Resident { data } => Some(data),
            AttributeBody::NonResident { .. } => None,
        }
    }
}

/// Parses one attribute starting at `cursor`'s current position, which
/// must point at the attribute's type code (the very first field of
/// its header). Returns `None` when the type code is the 0xFFFFFFFF
/// end-of-attributes marker.
pub fn parse_attribute(cursor: &mut BinaryCursor<'_>, record: u64) -> NtfsResult<Option<Attribute>> {
    let start = cursor.position();
    let attr_type = cursor
        .read_u32()
        .map_err(|e| cursor_err(record, "attribute type", e))?;

    if attr_type == ATTR_END {
        return Ok(None);
    }

    let length = cursor
        .read_u32()
        .map_err(|e| cursor_err(record, "attribute length", e))?;
    let non_resident = cursor
        .read_u8()
        .map_err(|e| cursor_err(record, "non_resident flag", e))?
        != 0;
    let name_length = cursor
        .read_u8()
        .map_err(|e| cursor_err(record, "name length", e))?;
    let name_offset = cursor
        .read_u16()
        .map_err(|e| cursor_err(record, "name offset", e))?;
    let _flags = cursor
        .read_u16()
        .map_err(|e| cursor_err(record, "flags", e))?;
    let _attribute_id = cursor
        .read_u16()
        .map_err(|e| cursor_err(record, "attribute id", e))?;

    let name = if name_length > 0 {
        let mut name_cursor = BinaryCursor::at(buffer_of(cursor), start + name_offset as usize);
        Some(
            name_cursor
                .read_utf16(name_length as usize)
                .map_err(|e| cursor_err(record, "attribute name", e))?,
        )
    } else {
        None
    };

    let body = if non_resident {
        cursor.seek(start + 0x10);
        let starting_vcn = cursor.read_u64().map_err(|e| cursor_err(record, "starting vcn", e))?;
        let _last_vcn = cursor.read_u64().map_err(|e| cursor_err(record, "last vcn", e))?;
        let runlist_offset = cursor.read_u16().map_err(|e| cursor_err(record, "runlist offset", e))?;
        let _compression_unit = cursor.read_u16().map_err(|e| cursor_err(record, "compression unit", e))?;
        cursor.advance(4);
        let allocated_size = cursor.read_u64().map_err(|e| cursor_err(record, "allocated size", e))?;
        let data_size = cursor.read_u64().map_err(|e| cursor_err(record, "data size", e))?;
        let initialized_size = cursor.read_u64().map_err(|e| cursor_err(record, "initialized size", e))?;

        let runlist_start = start + runlist_offset as usize;
        let attr_end = start + length as usize;
        let buffer = buffer_of(cursor);
        if attr_end > buffer.len() || runlist_start > attr_end {
            return Err(NtfsError::CorruptAttribute {
                record,
                reason: "run list bounds exceed attribute length".to_string(),
            });
        }
        let runs = decode_runlist(&buffer[runlist_start..attr_end], record)?;

        AttributeBody::NonResident {
            starting_vcn,
            runs,
            data_size,
            initialized_size,
            allocated_size,
        }
    } else {
        cursor.seek(start + 0x10);
        let value_length = cursor.read_u32().map_err(|e| cursor_err(record, "value length", e))?;
        let value_offset = cursor.read_u16().map_err(|e| cursor_err(record, "value offset", e))?;
        let value_start = start + value_offset as usize;
        let value_end = value_start + value_length as usize;
        let buffer = buffer_of(cursor);
        if value_end > buffer.len() {
            return Err(NtfsError::CorruptAttribute {
                record,
                reason: "resident value bounds exceed attribute length".to_string(),
            });
        }
        AttributeBody::Resident {
            data: buffer[value_start..value_end].to_vec(),
        }
    };

    cursor.seek(start + length as usize);

    Ok(Some(Attribute {
        attr_type,
        non_resident,
        name,
        body,
    }))
}

fn cursor_err(record: u64, field: &str, e: super::cursor::CursorError) -> NtfsError {
    NtfsError::CorruptAttribute {
        record,
        reason: format!("truncated while reading {field}: {e}"),
    }
}

/// `BinaryCursor` doesn't expose its backing slice directly; attribute
/// decoding needs random access into the same buffer for names and
/// resident values, so this recovers it via a zero-cost re-slice.
fn buffer_of<'a>(cursor: &BinaryCursor<'a>) -> &'a [u8] {
    cursor.full_buffer()
}
