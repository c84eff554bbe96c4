//! NTFS boot sector ($Boot, first 512 bytes of the volume) decoding.

use super::cursor::BinaryCursor;
use crate::domain::entities::VolumeGeometry;
use crate::domain::error::{NtfsError, NtfsResult};

const OEM_ID: &[u8; 8] = b"NTFS    ";
const BOOT_SIGNATURE_OFFSET: usize = 510;
const BOOT_SIGNATURE: u16 = 0xAA55;

/// Parses the 512-byte boot sector read from LBA 0 into a [`VolumeGeometry`].
pub fn parse_boot_sector(sector: &[u8]) -> NtfsResult<VolumeGeometry> {
    if sector.len() < 512 {
        return Err(NtfsError::BadMagic {
            what: "boot sector",
            offset: 0,
            expected: *b"NTFS",
            found: [0, 0, 0, 0],
        });
    }

    let oem_id = &sector[3..11];
    if oem_id != OEM_ID {
        let mut found = [0u8; 4];
        found.copy_from_slice(&oem_id[..4]);
        return Err(NtfsError::BadMagic {
            what: "boot sector OEM id",
            offset: 3,
            expected: *b"NTFS",
            found,
        });
    }

    let signature = u16::from_le_bytes([
        sector[BOOT_SIGNATURE_OFFSET],
        sector[BOOT_SIGNATURE_OFFSET + 1],
    ]);
    if signature != BOOT_SIGNATURE {
        tracing::warn!(signature, "boot sector missing 0xAA55 signature");
    }

    let mut cursor = BinaryCursor::at(sector, 0x0B);
    let bytes_per_sector = cursor
        .read_u16()
        .map_err(|e| NtfsError::BadMagic {
            what: "bytes_per_sector",
            offset: e.offset as u64,
            expected: *b"NTFS",
            found: [0, 0, 0, 0],
        })?;
    let sectors_per_cluster = cursor.read_u8().unwrap_or(8);

    cursor.seek(0x28);
    let total_sectors = cursor.read_u64().unwrap_or(0);
    let mft_lcn = cursor.read_u64().unwrap_or(0);
    let mft_mirror_lcn = cursor.read_u64().unwrap_or(0);
    let raw_clusters_per_mft_record = cursor.read_i8().unwrap_or(-10);

    cursor.seek(0x44);
    let raw_clusters_per_index_record = cursor.read_i8().unwrap_or(-12);

    Ok(VolumeGeometry::new(
        bytes_per_sector,
        sectors_per_cluster,
        total_sectors,
        mft_lcn,
        mft_mirror_lcn,
        raw_clusters_per_mft_record,
        raw_clusters_per_index_record,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_boot_sector() -> Vec<u8> {
        let mut sector = vec![0u8; 512];
        sector[3..11].copy_from_slice(b"NTFS    ");
        sector[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
        sector[0x0D] = 8;
        sector[0x28..0x30].copy_from_slice(&1_000_000u64.to_le_bytes());
        sector[0x30..0x38].copy_from_slice(&786_432u64.to_le_bytes());
        sector[0x38..0x40].copy_from_slice(&2u64.to_le_bytes());
        sector[0x40] = (-10i8) as u8;
        sector[0x44] = (-12i8) as u8;
        sector[510] = 0x55;
        sector[511] = 0xAA;
        sector
    }

    #[test]
    fn parses_a_well_formed_boot_sector() {
        let geometry = parse_boot_sector(&sample_boot_sector()).unwrap();
        assert_eq!(geometry.bytes_per_sector, 512);
        assert_eq!(geometry.sectors_per_cluster, 8);
        assert_eq!(geometry.bytes_per_cluster(), 4096);
        assert_eq!(geometry.mft_record_size(), 1024);
        assert_eq!(geometry.index_record_size(), 4096);
    }

    #[test]
    fn rejects_wrong_oem_id() {
        let mut sector = sample_boot_sector();
        sector[3..11].copy_from_slice(b"FAT32   ");
        assert!(parse_boot_sector(&sector).is_err());
    }
}
