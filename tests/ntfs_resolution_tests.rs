//! End-to-end resolution/extraction tests against a synthetic NTFS
//! image written to a real temp file and opened through
//! `LinuxBlockDevice`, the same way the teacher's own
//! `integration_tests.rs` drives a real device implementation against
//! a synthetic disk image rather than mocking it.

use ntfs_resolver::domain::repositories::BlockDeviceReader;
use ntfs_resolver::infrastructure::block_device::LinuxBlockDevice;
use ntfs_resolver::infrastructure::file_systems::NtfsVolume;
use std::io::Write;
use tempfile::NamedTempFile;

const ATTR_DATA: u32 = 0x80;
const ATTR_INDEX_ROOT: u32 = 0x90;
const FLAG_IN_USE: u16 = 0x0001;
const FLAG_DIRECTORY: u16 = 0x0002;
const ENTRY_FLAG_LAST_ENTRY: u16 = 0x0002;

const BYTES_PER_CLUSTER: u64 = 4096;
const MFT_RECORD_SIZE: u64 = 1024;
const MFT_LCN: u64 = 1;

fn round_up_8(n: usize) -> usize {
    (n + 7) & !7
}

fn build_resident_attribute(attr_type: u32, value: &[u8]) -> Vec<u8> {
    let value_offset = 0x18u16;
    let length = round_up_8(value_offset as usize + value.len()) as u32;
    let mut buf = vec![0u8; length as usize];
    buf[0..4].copy_from_slice(&attr_type.to_le_bytes());
    buf[4..8].copy_from_slice(&length.to_le_bytes());
    buf[8] = 0; // resident
    buf[9] = 0; // name length
    buf[0x10..0x14].copy_from_slice(&(value.len() as u32).to_le_bytes());
    buf[0x14..0x16].copy_from_slice(&value_offset.to_le_bytes());
    buf[value_offset as usize..value_offset as usize + value.len()].copy_from_slice(value);
    buf
}

/// `runs` is (lcn, length_in_clusters); `lcn = None` encodes a sparse run.
fn build_non_resident_attribute(
    attr_type: u32,
    runs: &[(Option<u64>, u64)],
    data_size: u64,
    initialized_size: u64,
    allocated_size: u64,
) -> Vec<u8> {
    let mut runlist = Vec::new();
    let mut prev_lcn: i64 = 0;
    for (lcn, length) in runs {
        match lcn {
            None => {
                runlist.push(0x04); // length field 4 bytes, offset field 0 (sparse)
                runlist.extend_from_slice(&(*length as u32).to_le_bytes());
            }
            Some(lcn) => {
                let delta = *lcn as i64 - prev_lcn;
                prev_lcn = *lcn as i64;
                runlist.push(0x44); // length field 4 bytes, offset field 4 bytes
                runlist.extend_from_slice(&(*length as u32).to_le_bytes());
                runlist.extend_from_slice(&(delta as i32).to_le_bytes());
            }
        }
    }
    runlist.push(0x00); // terminator

    let runlist_offset = 0x40u16;
    let length = round_up_8(runlist_offset as usize + runlist.len()) as u32;
    let mut buf = vec![0u8; length as usize];
    buf[0..4].copy_from_slice(&attr_type.to_le_bytes());
    buf[4..8].copy_from_slice(&length.to_le_bytes());
    buf[8] = 1; // non-resident
    buf[9] = 0; // name length
    buf[0x20..0x22].copy_from_slice(&runlist_offset.to_le_bytes());
    buf[0x28..0x30].copy_from_slice(&allocated_size.to_le_bytes());
    buf[0x30..0x38].copy_from_slice(&data_size.to_le_bytes());
    buf[0x38..0x40].copy_from_slice(&initialized_size.to_le_bytes());
    buf[runlist_offset as usize..runlist_offset as usize + runlist.len()].copy_from_slice(&runlist);
    buf
}

fn build_index_root(entries: &[(&str, u64, bool)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, record_number, is_dir) in entries {
        let name_utf16: Vec<u8> = name.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let key_length = 0x42 + name_utf16.len();
        let entry_length = 0x10 + key_length;

        let mut entry = vec![0u8; entry_length];
        let file_reference = ((1u64) << 48) | record_number; // sequence number 1
        entry[0..8].copy_from_slice(&file_reference.to_le_bytes());
        entry[8..10].copy_from_slice(&(entry_length as u16).to_le_bytes());
        entry[10..12].copy_from_slice(&(key_length as u16).to_le_bytes());
        if *is_dir {
            const FILE_NAME_FLAG_DIRECTORY: u32 = 0x1000_0000;
            entry[0x10 + 0x38..0x10 + 0x3C].copy_from_slice(&FILE_NAME_FLAG_DIRECTORY.to_le_bytes());
        }
        entry[0x10 + 0x40] = name.encode_utf16().count() as u8;
        entry[0x10 + 0x41] = 0x01; // namespace: WIN32
        entry[0x10 + 0x42..0x10 + 0x42 + name_utf16.len()].copy_from_slice(&name_utf16);
        body.extend_from_slice(&entry);
    }

    // Terminating sentinel: zero key, LAST_ENTRY flag.
    let mut terminator = vec![0u8; 0x10];
    terminator[8..10].copy_from_slice(&0x10u16.to_le_bytes());
    terminator[12..14].copy_from_slice(&ENTRY_FLAG_LAST_ENTRY.to_le_bytes());
    body.extend_from_slice(&terminator);

    let entries_offset = 0x10u32;
    let index_length = entries_offset + body.len() as u32;
    let mut root = vec![0u8; 0x10 + index_length as usize];
    root[0x10..0x14].copy_from_slice(&entries_offset.to_le_bytes());
    root[0x14..0x18].copy_from_slice(&index_length.to_le_bytes());
    let entries_start = 0x10 + entries_offset as usize;
    root[entries_start..entries_start + body.len()].copy_from_slice(&body);
    root
}

fn build_mft_record(flags: u16, attrs: &[u8]) -> Vec<u8> {
    const ATTR_END: u32 = 0xFFFF_FFFF;
    let mut buf = vec![0u8; MFT_RECORD_SIZE as usize];
    buf[0..4].copy_from_slice(b"FILE");
    buf[4..6].copy_from_slice(&0x30u16.to_le_bytes()); // usa_offset
    buf[6..8].copy_from_slice(&3u16.to_le_bytes()); // usa_count: sentinel + 2 sector words
    buf[0x10..0x12].copy_from_slice(&1u16.to_le_bytes()); // sequence_number
    buf[0x14..0x16].copy_from_slice(&0x40u16.to_le_bytes()); // first_attribute_offset
    buf[0x16..0x18].copy_from_slice(&flags.to_le_bytes());
    buf[0x20..0x28].copy_from_slice(&0u64.to_le_bytes()); // base_record

    let attrs_start = 0x40;
    buf[attrs_start..attrs_start + attrs.len()].copy_from_slice(attrs);
    let end_marker_at = attrs_start + attrs.len();
    buf[end_marker_at..end_marker_at + 4].copy_from_slice(&ATTR_END.to_le_bytes());

    // USA sentinel: record is entirely zero past our attribute data
    // (well clear of the two 512-byte sector trailers), so the saved
    // words are zero and the sentinel can be anything consistent.
    let sentinel = 0xABCDu16;
    buf[0x30..0x32].copy_from_slice(&sentinel.to_le_bytes());
    buf[510..512].copy_from_slice(&sentinel.to_le_bytes());
    buf[1022..1024].copy_from_slice(&sentinel.to_le_bytes());

    buf
}

fn build_boot_sector() -> Vec<u8> {
    let mut sector = vec![0u8; 512];
    sector[3..11].copy_from_slice(b"NTFS    ");
    sector[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
    sector[0x0D] = 8; // sectors_per_cluster -> 4096 bytes/cluster
    sector[0x28..0x30].copy_from_slice(&100_000u64.to_le_bytes());
    sector[0x30..0x38].copy_from_slice(&MFT_LCN.to_le_bytes());
    sector[0x38..0x40].copy_from_slice(&2u64.to_le_bytes());
    sector[0x40] = (-10i8) as u8; // mft record size indicator -> 1024 bytes
    sector[0x44] = (-12i8) as u8; // index record size indicator -> 4096 bytes
    sector[510] = 0x55;
    sector[511] = 0xAA;
    sector
}

/// Places `data` at absolute byte offset `at` in `image`, growing it if needed.
fn place(image: &mut Vec<u8>, at: u64, data: &[u8]) {
    let end = at as usize + data.len();
    if image.len() < end {
        image.resize(end, 0);
    }
    image[at as usize..end].copy_from_slice(data);
}

/// Builds a minimal but structurally valid NTFS image with:
/// - record 0: `$MFT` itself, one non-resident run covering records 0..16
/// - record 5: root directory, `$INDEX_ROOT` listing 3 children
/// - record 6: `marker.txt`, resident `$DATA` = b"hello"
/// - record 7: `big.bin`, non-resident `$DATA`, one run, initialized < data size
/// - record 8: `sparse.bin`, non-resident `$DATA`, fully sparse
fn build_synthetic_image() -> Vec<u8> {
    let mut image = vec![0u8; 65536];
    place(&mut image, 0, &build_boot_sector());

    let mft_data_disk_start = MFT_LCN * BYTES_PER_CLUSTER;
    let record_disk_offset = |record_number: u64| mft_data_disk_start + record_number * MFT_RECORD_SIZE;

    let mft_data_attr =
        build_non_resident_attribute(ATTR_DATA, &[(Some(MFT_LCN), 4)], 16384, 16384, 16384);
    place(
        &mut image,
        record_disk_offset(0),
        &build_mft_record(FLAG_IN_USE, &mft_data_attr),
    );

    let index_root = build_index_root(&[
        ("marker.txt", 6, false),
        ("big.bin", 7, false),
        ("sparse.bin", 8, false),
    ]);
    let root_attr = build_resident_attribute(ATTR_INDEX_ROOT, &index_root);
    place(
        &mut image,
        record_disk_offset(5),
        &build_mft_record(FLAG_IN_USE | FLAG_DIRECTORY, &root_attr),
    );

    let marker_attr = build_resident_attribute(ATTR_DATA, b"hello");
    place(
        &mut image,
        record_disk_offset(6),
        &build_mft_record(FLAG_IN_USE, &marker_attr),
    );

    const BIG_BIN_LCN: u64 = 10;
    let mut big_bin_data = vec![0xCDu8; 2048];
    place(&mut image, BIG_BIN_LCN * BYTES_PER_CLUSTER, &{
        big_bin_data.resize(4096, 0);
        big_bin_data
    });
    let big_bin_attr =
        build_non_resident_attribute(ATTR_DATA, &[(Some(BIG_BIN_LCN), 1)], 4096, 2048, 4096);
    place(
        &mut image,
        record_disk_offset(7),
        &build_mft_record(FLAG_IN_USE, &big_bin_attr),
    );

    let sparse_attr = build_non_resident_attribute(ATTR_DATA, &[(None, 1)], 4096, 0, 4096);
    place(
        &mut image,
        record_disk_offset(8),
        &build_mft_record(FLAG_IN_USE, &sparse_attr),
    );

    image
}

fn open_synthetic_volume() -> (NamedTempFile, NtfsVolume) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&build_synthetic_image()).unwrap();
    file.flush().unwrap();

    let device = LinuxBlockDevice::open(file.path().to_str().unwrap()).unwrap();
    let volume = NtfsVolume::open(Box::new(device)).unwrap();
    (file, volume)
}

#[test]
fn resolves_and_extracts_a_small_resident_file() {
    let (_guard, volume) = open_synthetic_volume();

    let reference = volume.resolve_path(&["marker.txt".to_string()]).unwrap();
    assert_eq!(reference.record_number(), 6);

    let mut out = Vec::new();
    let written = volume
        .extract_stream(reference.record_number(), None, &mut out)
        .unwrap();
    assert_eq!(written, 5);
    assert_eq!(out, b"hello");
}

#[test]
fn path_resolution_is_case_insensitive() {
    let (_guard, volume) = open_synthetic_volume();

    let lower = volume.resolve_path(&["marker.txt".to_string()]).unwrap();
    let upper = volume.resolve_path(&["MARKER.TXT".to_string()]).unwrap();
    assert_eq!(lower.record_number(), upper.record_number());
}

#[test]
fn non_resident_extraction_zero_fills_beyond_initialized_size() {
    let (_guard, volume) = open_synthetic_volume();

    let reference = volume.resolve_path(&["big.bin".to_string()]).unwrap();
    let mut out = Vec::new();
    let written = volume
        .extract_stream(reference.record_number(), None, &mut out)
        .unwrap();

    assert_eq!(written, 4096);
    assert!(out[..2048].iter().all(|&b| b == 0xCD));
    assert!(out[2048..].iter().all(|&b| b == 0));
}

#[test]
fn fully_sparse_file_extracts_as_zero_of_declared_length() {
    let (_guard, volume) = open_synthetic_volume();

    let reference = volume.resolve_path(&["sparse.bin".to_string()]).unwrap();
    let mut out = Vec::new();
    let written = volume
        .extract_stream(reference.record_number(), None, &mut out)
        .unwrap();

    assert_eq!(written, 4096);
    assert!(out.iter().all(|&b| b == 0));
}

#[test]
fn listing_the_root_directory_yields_every_child() {
    let (_guard, volume) = open_synthetic_volume();

    let mut names: Vec<String> = volume
        .list_directory(5)
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    names.sort();

    assert_eq!(names, vec!["big.bin", "marker.txt", "sparse.bin"]);
}
