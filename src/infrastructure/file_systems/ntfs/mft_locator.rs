//! Maps MFT record numbers to disk byte ranges.
//!
//! The `$MFT` file's own `$DATA` attribute is itself a run list over
//! the volume, exactly like any other non-resident attribute. This
//! locator treats that run list as one logical byte stream (extents of
//! contiguous disk bytes stitched together in VCN order) and slices
//! `record_number * record_size .. +record_size` out of it. Modeled
//! this way rather than assuming each record sits wholly inside one
//! run, a record can straddle an extent boundary without special
//! casing — the reader below simply issues more than one device read
//! and concatenates.

use super::runlist::Run;
use crate::domain::error::{NtfsError, NtfsResult};
use crate::domain::repositories::BlockDeviceReader;

/// One contiguous disk byte range contributing to the logical stream.
#[derive(Debug, Clone, Copy)]
struct Extent {
    /// Logical offset (bytes into the $MFT data stream) where this
    /// extent begins.
    logical_start: u64,
    length: u64,
    /// `None` for a sparse extent (reads as zeroes).
    disk_offset: Option<u64>,
}

pub struct MftLocator {
    extents: Vec<Extent>,
    record_size: u64,
    total_length: u64,
}

impl MftLocator {
    pub fn from_runs(runs: &[Run], bytes_per_cluster: u64, record_size: u64) -> Self {
        let mut extents = Vec::with_capacity(runs.len());
        let mut logical_start = 0u64;
        for run in runs {
            let length = run.length() * bytes_per_cluster;
            let disk_offset = match run {
                Run::Sparse { .. } => None,
                Run::Present { lcn, .. } => Some(lcn * bytes_per_cluster),
            };
            extents.push(Extent {
                logical_start,
                length,
                disk_offset,
            });
            logical_start += length;
        }

        Self {
            extents,
            record_size,
            total_length: logical_start,
        }
    }

    pub fn record_count(&self) -> u64 {
        if self.record_size == 0 {
            0
        } else {
            self.total_length / self.record_size
        }
    }

    /// Reads the raw bytes of `record_number`, stitching together
    /// however many extents the record's byte range touches.
    pub fn read_record(
        &self,
        device: &dyn BlockDeviceReader,
        record_number: u64,
    ) -> NtfsResult<Vec<u8>> {
        let start = record_number
            .checked_mul(self.record_size)
            .ok_or(NtfsError::RecordOutOfRange(record_number))?;
        let end = start + self.record_size;
        if end > self.total_length {
            return Err(NtfsError::RecordOutOfRange(record_number));
        }

        let mut out = vec![0u8; self.record_size as usize];
        let mut filled = 0u64;

        while filled < self.record_size {
            let logical_pos = start + filled;
            let extent = self
                .extent_containing(logical_pos)
                .ok_or(NtfsError::RecordOutOfRange(record_number))?;

            let offset_in_extent = logical_pos - extent.logical_start;
            let available = extent.length - offset_in_extent;
            let to_read = available.min(self.record_size - filled);

            let dest = &mut out[filled as usize..(filled + to_read) as usize];
            match extent.disk_offset {
                Some(disk_offset) => {
                    let bytes = device
                        .read_at(disk_offset + offset_in_extent, to_read as usize)
                        .map_err(NtfsError::Io)?;
                    dest.copy_from_slice(&bytes);
                }
                None => dest.fill(0),
            }

            filled += to_read;
        }

        Ok(out)
    }

    fn extent_containing(&self, logical_pos: u64) -> Option<&Extent> {
        self.extents
            .iter()
            .find(|e| logical_pos >= e.logical_start && logical_pos < e.logical_start + e.length)
    }
}
