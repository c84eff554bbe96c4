//! `NtfsVolume`: the central object tying the structure decoders, run
//! list engine, MFT locator, directory resolver, and file extractor
//! into one session over a single open block device.

use super::attribute::{
    Attribute, AttributeBody, ATTR_ATTRIBUTE_LIST, ATTR_DATA, ATTR_INDEX_ALLOCATION,
    ATTR_INDEX_ROOT,
};
use super::boot_sector::parse_boot_sector;
use super::cursor::BinaryCursor;
use super::index::{parse_index_block, parse_index_root};
use super::mft_locator::MftLocator;
use super::mft_record::MftRecord;
use crate::domain::entities::{DirectoryEntry, MftReference, VolumeGeometry};
use crate::domain::error::{NtfsError, NtfsResult};
use crate::domain::repositories::BlockDeviceReader;
use crate::domain::services::naming;
use std::collections::HashMap;
use std::io::Write;

/// Reads larger than this are broken into sub-reads of this size, to
/// bound peak memory while extracting very large files.
const MAX_SINGLE_READ: u64 = 21 * 1024 * 1024;

pub struct NtfsVolume {
    device: Box<dyn BlockDeviceReader>,
    geometry: VolumeGeometry,
    mft_locator: MftLocator,
}

impl NtfsVolume {
    /// Opens a volume by reading its boot sector and bootstrapping the
    /// `$MFT` locator from `$MFT`'s own record 0.
    pub fn open(device: Box<dyn BlockDeviceReader>) -> NtfsResult<Self> {
        let boot_sector = device
            .read_at(0, 512)
            .map_err(NtfsError::Io)?;
        let geometry = parse_boot_sector(&boot_sector)?;

        let mft_record_0 = device
            .read_at(geometry.mft_offset(), geometry.mft_record_size() as usize)
            .map_err(NtfsError::Io)?;
        let record0 = MftRecord::parse(mft_record_0, 0)?;

        let data_attr = record0
            .attributes()?
            .into_iter()
            .find(|a| a.attr_type == ATTR_DATA && a.name.is_none())
            .ok_or(NtfsError::AttributeNotFound {
                record: 0,
                attr_type: ATTR_DATA,
            })?;

        let runs = match &data_attr.body {
            AttributeBody::NonResident { runs, .. } => runs.clone(),
            AttributeBody::Resident { .. } => {
                return Err(NtfsError::CorruptAttribute {
                    record: 0,
                    reason: "$MFT's own $DATA attribute must be non-resident".to_string(),
                })
            }
        };

        let mft_locator =
            MftLocator::from_runs(&runs, geometry.bytes_per_cluster(), geometry.mft_record_size());

        Ok(Self {
            device,
            geometry,
            mft_locator,
        })
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn read_record(&self, record_number: u64) -> NtfsResult<MftRecord> {
        let buffer = self
            .mft_locator
            .read_record(self.device.as_ref(), record_number)?;
        MftRecord::parse(buffer, record_number)
    }

    /// Collects every attribute belonging to a record, following
    /// `$ATTRIBUTE_LIST` indirection into extension records. Guarded
    /// against cyclical base-record references.
    pub fn resolve_attributes(&self, record: &MftRecord) -> NtfsResult<Vec<Attribute>> {
        let record_number = record.reference.record_number();
        let mut attrs = record.attributes()?;
        let mut visited = std::collections::HashSet::new();
        visited.insert(record_number);

        let attribute_list = attrs.iter().find(|a| a.attr_type == ATTR_ATTRIBUTE_LIST).cloned();
        if let Some(attribute_list) = attribute_list {
            let raw = self.read_attribute_data(&attribute_list)?;
            let referenced_records = parse_attribute_list_entries(&raw, record_number)?;

            for reference in referenced_records {
                let extension_record_number = reference.record_number();
                if !visited.insert(extension_record_number) {
                    continue;
                }
                let extension = self.read_record(extension_record_number)?;
                for attr in extension.attributes()? {
                    if attr.attr_type != ATTR_ATTRIBUTE_LIST {
                        attrs.push(attr);
                    }
                }
            }
        }

        Ok(attrs)
    }

    /// Materializes the full value of an attribute, following its run
    /// list if non-resident. Clipped to `data_size` (not
    /// `allocated_size`); sparse runs read as zero.
    pub fn read_attribute_data(&self, attribute: &Attribute) -> NtfsResult<Vec<u8>> {
        match &attribute.body {
            AttributeBody::Resident { data } => Ok(data.clone()),
            AttributeBody::NonResident { runs, data_size, .. } => {
                let bpc = self.geometry.bytes_per_cluster();
                let mut out = Vec::with_capacity((*data_size).min(64 * 1024 * 1024) as usize);

                for run in runs {
                    if out.len() as u64 >= *data_size {
                        break;
                    }
                    let run_bytes = run.length() * bpc;
                    let remaining = data_size - out.len() as u64;
                    let take = run_bytes.min(remaining);

                    match run {
                        super::runlist::Run::Sparse { .. } => {
                            out.resize(out.len() + take as usize, 0);
                        }
                        super::runlist::Run::Present { lcn, .. } => {
                            let mut read_so_far = 0u64;
                            while read_so_far < take {
                                let chunk = (take - read_so_far).min(MAX_SINGLE_READ);
                                let bytes = self
                                    .device
                                    .read_at(lcn * bpc + read_so_far, chunk as usize)
                                    .map_err(NtfsError::Io)?;
                                out.extend_from_slice(&bytes);
                                read_so_far += chunk;
                            }
                        }
                    }
                }

                if (out.len() as u64) < *data_size {
                    out.resize(*data_size as usize, 0);
                }
                Ok(out)
            }
        }
    }

    /// Lists the immediate children of a directory record, merging
    /// `$INDEX_ROOT` and `$INDEX_ALLOCATION` entries and preferring
    /// long names over 8.3 short names for the same child record.
    pub fn list_directory(&self, record_number: u64) -> NtfsResult<Vec<DirectoryEntry>> {
        let record = self.read_record(record_number)?;
        if !record.is_directory() {
            return Err(NtfsError::NotADirectory(record_number));
        }

        let attrs = self.resolve_attributes(&record)?;
        let mut by_record: HashMap<u64, DirectoryEntry> = HashMap::new();

        for attr in &attrs {
            if attr.attr_type == ATTR_INDEX_ROOT {
                let data = attr
                    .resident_data()
                    .ok_or_else(|| NtfsError::CorruptAttribute {
                        record: record_number,
                        reason: "$INDEX_ROOT must be resident".to_string(),
                    })?;
                for entry in parse_index_root(data, record_number)? {
                    merge_entry(&mut by_record, entry);
                }
            }
        }

        for attr in &attrs {
            if attr.attr_type == ATTR_INDEX_ALLOCATION {
                let raw = self.read_attribute_data(attr)?;
                let block_size = self.geometry.index_record_size() as usize;
                for chunk in raw.chunks(block_size) {
                    if chunk.len() < block_size {
                        continue;
                    }
                    for entry in parse_index_block(chunk.to_vec(), record_number)? {
                        merge_entry(&mut by_record, entry);
                    }
                }
            }
        }

        Ok(by_record.into_values().collect())
    }

    /// Resolves a single path component under a known parent directory.
    pub fn resolve_child(&self, parent_record: u64, component: &str) -> NtfsResult<DirectoryEntry> {
        self.list_directory(parent_record)?
            .into_iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(component))
            .ok_or_else(|| NtfsError::PathNotFound(component.to_string()))
    }

    /// Resolves a full path starting at the volume root (record 5).
    pub fn resolve_path(&self, components: &[String]) -> NtfsResult<MftReference> {
        let mut current = MftReference::root();
        for component in components {
            let entry = self.resolve_child(current.record_number(), component)?;
            current = entry.reference;
        }
        Ok(current)
    }

    /// Names of named `$DATA` streams (alternate data streams) on a
    /// record, excluding the unnamed primary stream.
    pub fn named_data_streams(&self, record_number: u64) -> NtfsResult<Vec<String>> {
        let record = self.read_record(record_number)?;
        let attrs = self.resolve_attributes(&record)?;
        Ok(attrs
            .into_iter()
            .filter(|a| a.attr_type == ATTR_DATA)
            .filter_map(|a| a.name)
            .collect())
    }

    /// Extracts a `$DATA` stream (the unnamed primary stream when
    /// `stream_name` is `None`) to `writer`, honoring resident vs.
    /// non-resident storage and `initialized_size`/`data_size`
    /// zero-fill. Returns the number of bytes written.
    ///
    /// A stream's run list can be split across several non-resident
    /// `$DATA` fragments reached through `$ATTRIBUTE_LIST` extension
    /// records, each carrying a disjoint range of VCNs. Only the
    /// VCN-0 fragment's `data_size`/`initialized_size` are meaningful;
    /// the others are runs to append after it.
    pub fn extract_stream(
        &self,
        record_number: u64,
        stream_name: Option<&str>,
        writer: &mut dyn Write,
    ) -> NtfsResult<u64> {
        let record = self.read_record(record_number)?;
        let attrs = self.resolve_attributes(&record)?;

        let mut fragments: Vec<Attribute> = attrs
            .into_iter()
            .filter(|a| a.attr_type == ATTR_DATA && a.name.as_deref() == stream_name)
            .collect();

        if fragments.is_empty() {
            return Err(NtfsError::AttributeNotFound {
                record: record_number,
                attr_type: ATTR_DATA,
            });
        }

        if fragments.len() == 1 {
            return match fragments.remove(0).body {
                AttributeBody::Resident { data } => {
                    write_all(writer, &data, record_number)?;
                    Ok(data.len() as u64)
                }
                AttributeBody::NonResident {
                    runs,
                    data_size,
                    initialized_size,
                    ..
                } => self.extract_non_resident(&runs, data_size, initialized_size, record_number, writer),
            };
        }

        fragments.sort_by_key(|a| match &a.body {
            AttributeBody::NonResident { starting_vcn, .. } => *starting_vcn,
            AttributeBody::Resident { .. } => 0,
        });

        let (data_size, initialized_size) = match &fragments[0].body {
            AttributeBody::NonResident {
                starting_vcn: 0,
                data_size,
                initialized_size,
                ..
            } => (*data_size, *initialized_size),
            _ => {
                return Err(NtfsError::CorruptAttribute {
                    record: record_number,
                    reason: "split $DATA stream has no VCN-0 fragment".to_string(),
                })
            }
        };

        let mut runs = Vec::new();
        for fragment in &fragments {
            match &fragment.body {
                AttributeBody::NonResident { runs: fragment_runs, .. } => runs.extend_from_slice(fragment_runs),
                AttributeBody::Resident { .. } => {
                    return Err(NtfsError::CorruptAttribute {
                        record: record_number,
                        reason: "split $DATA stream mixes resident and non-resident fragments".to_string(),
                    })
                }
            }
        }

        self.extract_non_resident(&runs, data_size, initialized_size, record_number, writer)
    }

    fn extract_non_resident(
        &self,
        runs: &[super::runlist::Run],
        data_size: u64,
        initialized_size: u64,
        record_number: u64,
        writer: &mut dyn Write,
    ) -> NtfsResult<u64> {
        let bpc = self.geometry.bytes_per_cluster();
        let mut written = 0u64;

        for run in runs {
            if written >= data_size {
                break;
            }
            let run_bytes = run.length() * bpc;
            let remaining = data_size - written;
            let take = run_bytes.min(remaining);

            let init_remaining = initialized_size.saturating_sub(written);
            let real_bytes = take.min(init_remaining);
            let zero_bytes = take - real_bytes;

            if real_bytes > 0 {
                match run {
                    super::runlist::Run::Sparse { .. } => {
                        write_zeros(writer, real_bytes, record_number)?;
                    }
                    super::runlist::Run::Present { lcn, .. } => {
                        let mut read_so_far = 0u64;
                        while read_so_far < real_bytes {
                            let chunk = (real_bytes - read_so_far).min(MAX_SINGLE_READ);
                            let bytes = self
                                .device
                                .read_at(lcn * bpc + read_so_far, chunk as usize)
                                .map_err(NtfsError::Io)?;
                            write_all(writer, &bytes, record_number)?;
                            read_so_far += chunk;
                        }
                    }
                }
            }
            if zero_bytes > 0 {
                write_zeros(writer, zero_bytes, record_number)?;
            }

            written += take;
        }

        if written < data_size {
            write_zeros(writer, data_size - written, record_number)?;
            written = data_size;
        }

        Ok(written)
    }
}

fn merge_entry(by_record: &mut HashMap<u64, DirectoryEntry>, entry: DirectoryEntry) {
    let key = entry.reference.record_number();
    match by_record.get_mut(&key) {
        Some(existing) if naming::prefer(&entry.name, &existing.name) => {
            existing.name = entry.name;
        }
        Some(_) => {}
        None => {
            by_record.insert(key, entry);
        }
    }
}

fn write_all(writer: &mut dyn Write, data: &[u8], record_number: u64) -> NtfsResult<()> {
    writer.write_all(data).map_err(|e| NtfsError::ExtractIoError {
        path: format!("<record {record_number}>"),
        source: e,
    })
}

fn write_zeros(writer: &mut dyn Write, count: u64, record_number: u64) -> NtfsResult<()> {
    const ZERO_CHUNK: usize = 64 * 1024;
    let zeros = [0u8; ZERO_CHUNK];
    let mut remaining = count;
    while remaining > 0 {
        let chunk = remaining.min(ZERO_CHUNK as u64) as usize;
        write_all(writer, &zeros[..chunk], record_number)?;
        remaining -= chunk as u64;
    }
    Ok(())
}

/// Parses `$ATTRIBUTE_LIST` entries, returning the distinct extension
/// record references they point into (the base record and
/// already-visited extensions are filtered by the caller).
fn parse_attribute_list_entries(data: &[u8], record: u64) -> NtfsResult<Vec<MftReference>> {
    let mut cursor = BinaryCursor::new(data);
    let mut references = Vec::new();

    while cursor.remaining() >= 0x1A {
        let entry_start = cursor.position();
        let _attr_type = cursor.read_u32().map_err(|e| list_err(record, "attr type", e))?;
        let length = cursor.read_u16().map_err(|e| list_err(record, "entry length", e))?;
        let _name_length = cursor.read_u8().map_err(|e| list_err(record, "name length", e))?;
        let _name_offset = cursor.read_u8().map_err(|e| list_err(record, "name offset", e))?;
        let _starting_vcn = cursor.read_u64().map_err(|e| list_err(record, "starting vcn", e))?;
        let base_reference = cursor.read_u64().map_err(|e| list_err(record, "base reference", e))?;
        let _attribute_id = cursor.read_u16().map_err(|e| list_err(record, "attribute id", e))?;

        if length == 0 || entry_start + length as usize > data.len() {
            break;
        }

        references.push(MftReference::from_raw(base_reference));
        cursor.seek(entry_start + length as usize);
    }

    Ok(references)
}

fn list_err(record: u64, field: &str, e: super::cursor::CursorError) -> NtfsError {
    NtfsError::CorruptAttribute {
        record,
        reason: format!("truncated while reading attribute list {field}: {e}"),
    }
}
