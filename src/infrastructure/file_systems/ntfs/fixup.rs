//! Update Sequence Array (fixup) handling for multi-sector NTFS
//! structures (MFT records and INDX blocks).
//!
//! Every such structure embeds, near its start, an update sequence
//! number plus one saved word per 512-byte sector. The last two bytes
//! of each sector are overwritten with the sequence number on disk and
//! must be restored from the saved words before the structure is
//! trusted. A mismatch means the sector was torn (partially written)
//! or the buffer is simply garbage; this resolver is read-only and
//! forensic in nature, so it logs and continues with the USN bytes
//! left in place rather than failing the whole record.

use crate::domain::error::{NtfsError, NtfsResult};
use byteorder::{ByteOrder, LittleEndian};

const SECTOR_SIZE: usize = 512;

/// Applies fixups in place over `buffer`, which must already contain
/// the full on-disk structure (record or index block) starting at
/// offset 0. `usa_offset`/`usa_count` come from the structure's own
/// header (`usa_ofs`/`usa_count` fields).
pub fn apply_fixups(buffer: &mut [u8], usa_offset: u16, usa_count: u16) -> NtfsResult<()> {
    let usa_offset = usa_offset as usize;
    let usa_count = usa_count as usize;

    if usa_count == 0 {
        return Ok(());
    }

    let usa_len = usa_count * 2;
    if usa_offset + usa_len > buffer.len() {
        return Err(NtfsError::CorruptFixup {
            offset: usa_offset as u64,
            stride: usa_len,
        });
    }

    let sequence_number = LittleEndian::read_u16(&buffer[usa_offset..usa_offset + 2]);
    let saved_words: Vec<u16> = (1..usa_count)
        .map(|i| {
            let at = usa_offset + i * 2;
            LittleEndian::read_u16(&buffer[at..at + 2])
        })
        .collect();

    for (sector_index, saved_word) in saved_words.into_iter().enumerate() {
        let sector_end = (sector_index + 1) * SECTOR_SIZE;
        if sector_end > buffer.len() {
            break;
        }
        let check_at = sector_end - 2;
        let on_disk = LittleEndian::read_u16(&buffer[check_at..check_at + 2]);
        if on_disk != sequence_number {
            tracing::warn!(
                sector_index,
                on_disk,
                expected = sequence_number,
                "fixup sequence number mismatch, structure may be torn"
            );
        }
        buffer[check_at..check_at + 2].copy_from_slice(&saved_word.to_le_bytes());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_buffer(sectors: usize, sequence_number: u16, saved: &[u16]) -> Vec<u8> {
        let mut buffer = vec![0u8; sectors * SECTOR_SIZE];
        let usa_offset = 0x30;
        let usa_count = saved.len() + 1;
        LittleEndian::write_u16(&mut buffer[usa_offset..usa_offset + 2], sequence_number);
        for (i, word) in saved.iter().enumerate() {
            let at = usa_offset + 2 + i * 2;
            LittleEndian::write_u16(&mut buffer[at..at + 2], *word);
        }
        for s in 0..sectors {
            let at = (s + 1) * SECTOR_SIZE - 2;
            LittleEndian::write_u16(&mut buffer[at..at + 2], sequence_number);
        }
        buffer
    }

    #[test]
    fn restores_saved_words_into_sector_trailers() {
        let mut buffer = make_buffer(2, 7, &[0xAAAA, 0xBBBB]);
        apply_fixups(&mut buffer, 0x30, 3).unwrap();

        assert_eq!(LittleEndian::read_u16(&buffer[510..512]), 0xAAAA);
        assert_eq!(LittleEndian::read_u16(&buffer[1022..1024]), 0xBBBB);
    }

    #[test]
    fn zero_usa_count_is_a_no_op() {
        let mut buffer = vec![0u8; SECTOR_SIZE];
        apply_fixups(&mut buffer, 0x30, 0).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn mismatched_sequence_number_still_patches_and_does_not_error() {
        let mut buffer = make_buffer(1, 7, &[0xAAAA]);
        LittleEndian::write_u16(&mut buffer[510..512], 0xFFFF);
        apply_fixups(&mut buffer, 0x30, 2).unwrap();
        assert_eq!(LittleEndian::read_u16(&buffer[510..512]), 0xAAAA);
    }

    #[test]
    fn usa_past_buffer_end_is_an_error() {
        let mut buffer = vec![0u8; 64];
        assert!(apply_fixups(&mut buffer, 0x30, 10).is_err());
    }
}
