//! $INDEX_ROOT / $INDEX_ALLOCATION (INDX block) directory index parsing.
//!
//! Directory enumeration here is deliberately FLAT rather than a true
//! B+-tree descent: every entry in `$INDEX_ROOT` plus every entry in
//! every `$INDEX_ALLOCATION` block (located via that attribute's own
//! run list) is scanned linearly, and the per-entry "has sub-node"
//! VCN pointers are never followed. This mirrors how the tool this
//! resolver is modeled on actually walks directories in practice — it
//! never descends by child VCN, it just enumerates every block the
//! index allocation run list exposes.

use super::cursor::BinaryCursor;
use super::fixup::apply_fixups;
use crate::domain::entities::{DirectoryEntry, MftReference};
use crate::domain::error::{NtfsError, NtfsResult};

const INDX_MAGIC: &[u8; 4] = b"INDX";

// Sub-node VCN pointers (ENTRY_FLAG_HAS_SUB_NODE, 0x0001) exist for
// true B+-tree descent; this resolver enumerates flat instead, so
// that flag is never inspected here.
const ENTRY_FLAG_LAST_ENTRY: u16 = 0x0002;
const FILE_NAME_FLAG_DIRECTORY: u32 = 0x1000_0000;

/// Parses the entries embedded directly in a resident `$INDEX_ROOT`
/// attribute value. `data` is the full attribute value, starting at
/// the `INDEX_ROOT` type/collation/block-size header.
pub fn parse_index_root(data: &[u8], record: u64) -> NtfsResult<Vec<DirectoryEntry>> {
    if data.len() < 0x20 {
        return Err(NtfsError::CorruptAttribute {
            record,
            reason: "index root shorter than its fixed header".to_string(),
        });
    }
    let header_base = 0x10;
    let entries_offset = u32::from_le_bytes(data[0x10..0x14].try_into().unwrap()) as usize;
    let index_length = u32::from_le_bytes(data[0x14..0x18].try_into().unwrap()) as usize;

    let start = header_base + entries_offset;
    let end = (header_base + index_length).min(data.len());
    if start > end {
        return Err(NtfsError::CorruptAttribute {
            record,
            reason: "index root entries region is out of bounds".to_string(),
        });
    }

    parse_entries(&data[start..end], record)
}

/// Parses one `INDX` block (one element of `$INDEX_ALLOCATION`'s data
/// stream, `index_record_size` bytes). Applies fixups in place first.
pub fn parse_index_block(mut buffer: Vec<u8>, record: u64) -> NtfsResult<Vec<DirectoryEntry>> {
    if buffer.len() < 0x28 || &buffer[0..4] != INDX_MAGIC {
        // Unused slack at the tail of the index allocation stream is
        // common; treat a missing magic as an empty block rather than
        // a hard error.
        return Ok(Vec::new());
    }

    let usa_offset = u16::from_le_bytes([buffer[4], buffer[5]]);
    let usa_count = u16::from_le_bytes([buffer[6], buffer[7]]);
    apply_fixups(&mut buffer, usa_offset, usa_count)?;

    let header_base = 0x18;
    let entries_offset = u32::from_le_bytes(buffer[0x18..0x1C].try_into().unwrap()) as usize;
    let index_length = u32::from_le_bytes(buffer[0x1C..0x20].try_into().unwrap()) as usize;

    let start = header_base + entries_offset;
    let end = (header_base + index_length).min(buffer.len());
    if start > end {
        return Err(NtfsError::CorruptAttribute {
            record,
            reason: "index block entries region is out of bounds".to_string(),
        });
    }

    parse_entries(&buffer[start..end], record)
}

fn parse_entries(data: &[u8], record: u64) -> NtfsResult<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    let mut cursor = BinaryCursor::new(data);

    loop {
        let entry_start = cursor.position();
        if cursor.remaining() < 0x10 {
            break;
        }

        let file_reference_raw = cursor
            .read_u64()
            .map_err(|e| index_err(record, "entry file reference", e))?;
        let entry_length = cursor
            .read_u16()
            .map_err(|e| index_err(record, "entry length", e))?;
        let key_length = cursor
            .read_u16()
            .map_err(|e| index_err(record, "entry key length", e))?;
        let flags = cursor
            .read_u16()
            .map_err(|e| index_err(record, "entry flags", e))?;
        cursor.advance(2); // reserved

        // An entry shorter than its own fixed header, or one that does
        // not advance the cursor, means the region is corrupt or we
        // have walked into padding; stop rather than loop forever.
        if (entry_length as usize) < 0x10 || entry_start + entry_length as usize > data.len() {
            break;
        }

        let is_last = flags & ENTRY_FLAG_LAST_ENTRY != 0;
        if !is_last && key_length >= 0x42 {
            let mut key_cursor = BinaryCursor::at(data, entry_start + 0x10);
            key_cursor.advance(0x40); // skip to name_length/namespace
            let name_length_chars = key_cursor
                .read_u8()
                .map_err(|e| index_err(record, "file name length", e))?;
            let _namespace = key_cursor
                .read_u8()
                .map_err(|e| index_err(record, "file name namespace", e))?;
            let name = key_cursor
                .read_utf16(name_length_chars as usize)
                .map_err(|e| index_err(record, "file name", e))?;

            let fn_flags_offset = entry_start + 0x10 + 0x38;
            let fn_flags = u32::from_le_bytes(
                data[fn_flags_offset..fn_flags_offset + 4]
                    .try_into()
                    .unwrap(),
            );
            let is_directory = fn_flags & FILE_NAME_FLAG_DIRECTORY != 0;

            entries.push(DirectoryEntry::new(
                name,
                MftReference::from_raw(file_reference_raw),
                is_directory,
            ));
        }

        if is_last {
            break;
        }

        cursor.seek(entry_start + entry_length as usize);
        if cursor.position() <= entry_start {
            break;
        }
    }

    Ok(entries)
}

fn index_err(record: u64, field: &str, e: super::cursor::CursorError) -> NtfsError {
    NtfsError::CorruptAttribute {
        record,
        reason: format!("truncated while reading {field}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index_root_with_one_entry(name: &str, child_record: u64, is_dir: bool) -> Vec<u8> {
        let name_utf16: Vec<u8> = name
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let key_length = 0x42 + name_utf16.len();
        let entry_length = 0x10 + key_length;

        let mut entry = vec![0u8; entry_length];
        entry[0..8].copy_from_slice(&MftReference::new(child_record, 1).to_raw().to_le_bytes());
        entry[8..10].copy_from_slice(&(entry_length as u16).to_le_bytes());
        entry[10..12].copy_from_slice(&(key_length as u16).to_le_bytes());
        // flags left at 0: a real (non-terminal) entry.
        if is_dir {
            entry[0x10 + 0x38..0x10 + 0x3C].copy_from_slice(&FILE_NAME_FLAG_DIRECTORY.to_le_bytes());
        }
        entry[0x10 + 0x40] = name.encode_utf16().count() as u8;
        entry[0x10 + 0x41] = 0x01; // namespace: WIN32
        entry[0x10 + 0x42..0x10 + 0x42 + name_utf16.len()].copy_from_slice(&name_utf16);

        // Terminating sentinel entry: no key data, LAST_ENTRY flag set.
        let mut terminator = vec![0u8; 0x10];
        terminator[8..10].copy_from_slice(&0x10u16.to_le_bytes());
        terminator[12..14].copy_from_slice(&ENTRY_FLAG_LAST_ENTRY.to_le_bytes());

        let entries_offset = 0x10u32;
        let index_length = entries_offset + entry.len() as u32 + terminator.len() as u32;

        let mut root = vec![0u8; 0x10 + index_length as usize];
        root[0x10..0x14].copy_from_slice(&entries_offset.to_le_bytes());
        root[0x14..0x18].copy_from_slice(&index_length.to_le_bytes());
        let entry_start = 0x10 + entries_offset as usize;
        root[entry_start..entry_start + entry.len()].copy_from_slice(&entry);
        root[entry_start + entry.len()..entry_start + entry.len() + terminator.len()]
            .copy_from_slice(&terminator);
        root
    }

    #[test]
    fn parses_a_single_file_entry() {
        let root = build_index_root_with_one_entry("hello.txt", 42, false);
        let entries = parse_index_root(&root, 5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "hello.txt");
        assert_eq!(entries[0].reference.record_number(), 42);
        assert!(!entries[0].is_directory);
    }

    #[test]
    fn parses_a_single_directory_entry() {
        let root = build_index_root_with_one_entry("Sub", 43, true);
        let entries = parse_index_root(&root, 5).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_directory);
    }

    #[test]
    fn malformed_indx_block_yields_empty_rather_than_error() {
        let buffer = vec![0u8; 64];
        let entries = parse_index_block(buffer, 5).unwrap();
        assert!(entries.is_empty());
    }
}
