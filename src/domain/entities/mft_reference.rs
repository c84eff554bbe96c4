//! MFT reference: a packed record number + sequence number.

use std::fmt;

/// Low 48 bits hold the record number; high 16 bits hold the sequence
/// number used to detect a record that has been reused since a caller
/// last saw it.
const RECORD_NUMBER_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;

/// A reference to an MFT record as stored in index entries, the
/// `$FILE_NAME` parent field, and `$ATTRIBUTE_LIST` base references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MftReference {
    record_number: u64,
    sequence_number: u16,
}

impl MftReference {
    pub fn new(record_number: u64, sequence_number: u16) -> Self {
        Self {
            record_number: record_number & RECORD_NUMBER_MASK,
            sequence_number,
        }
    }

    /// Packs a raw 64-bit reference value into its two halves (MREF/MSEQNO).
    pub fn from_raw(raw: u64) -> Self {
        Self {
            record_number: raw & RECORD_NUMBER_MASK,
            sequence_number: (raw >> 48) as u16,
        }
    }

    /// The well-known root directory record.
    pub fn root() -> Self {
        Self::new(5, 0)
    }

    pub fn record_number(&self) -> u64 {
        self.record_number
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    pub fn to_raw(&self) -> u64 {
        (self.sequence_number as u64) << 48 | self.record_number
    }
}

impl fmt::Display for MftReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_number, self.sequence_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_raw() {
        let reference = MftReference::new(1234, 7);
        assert_eq!(MftReference::from_raw(reference.to_raw()), reference);
    }

    #[test]
    fn masks_record_number_to_48_bits() {
        let reference = MftReference::new(u64::MAX, 1);
        assert_eq!(reference.record_number(), RECORD_NUMBER_MASK);
    }

    #[test]
    fn root_is_record_five() {
        assert_eq!(MftReference::root().record_number(), 5);
    }
}
