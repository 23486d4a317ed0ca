//! Frame size table and the derived offset table.
//!
//! The size table is `frame_count` little-endian `u32` values right after the
//! header.  Its integrity check is a plain wrapping additive sum stored in
//! the header's `crc_frame_sizes` field.  Offsets are not stored; they are a
//! prefix sum over the sizes starting at [`Header::data_offset`].

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};

use crate::error::FormatError;
use crate::header::Header;

/// Read `count` frame sizes.
pub fn read_frame_size_table<R: Read>(mut reader: R, count: u32) -> Result<Vec<u32>, FormatError> {
    let mut sizes = vec![0u32; count as usize];
    reader
        .read_u32_into::<LittleEndian>(&mut sizes)
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => FormatError::Truncated,
            _ => FormatError::Io(e),
        })?;
    Ok(sizes)
}

/// Wrapping 32-bit sum of all sizes.
pub fn checksum(sizes: &[u32]) -> u32 {
    sizes.iter().fold(0u32, |acc, &s| acc.wrapping_add(s))
}

/// Byte offset of every frame: `start + sum(sizes[..i])`.
pub fn compute_offsets(sizes: &[u32], start: u64) -> Vec<u64> {
    let mut offsets = Vec::with_capacity(sizes.len());
    let mut runner = start;
    for &size in sizes {
        offsets.push(runner);
        runner += size as u64;
    }
    offsets
}

/// Validated size + offset tables of one open file.
#[derive(Debug, Clone, Default)]
pub struct FrameTable {
    sizes:   Vec<u32>,
    offsets: Vec<u64>,
}

impl FrameTable {
    /// Read the size table that follows `header`, verify it against the
    /// stored checksum and derive the offsets.
    pub fn read<R: Read>(reader: R, header: &Header) -> Result<Self, FormatError> {
        let sizes = read_frame_size_table(reader, header.frame_count)?;
        let computed = checksum(&sizes);
        if computed != header.crc_frame_sizes {
            return Err(FormatError::ChecksumMismatch {
                stored: header.crc_frame_sizes,
                computed,
            });
        }
        let offsets = compute_offsets(&sizes, header.data_offset());
        Ok(Self { sizes, offsets })
    }

    pub fn from_sizes(sizes: Vec<u32>, start: u64) -> Self {
        let offsets = compute_offsets(&sizes, start);
        Self { sizes, offsets }
    }

    /// Fail if any payload reaches past `file_len`.
    pub fn check_extent(&self, file_len: u64) -> Result<(), FormatError> {
        if let Some(last) = self.sizes.len().checked_sub(1) {
            let end = self.offsets[last] + self.sizes[last] as u64;
            if end > file_len {
                return Err(FormatError::FrameDataOutOfBounds { frame: last, end, file_len });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn size(&self, frame: usize) -> Option<u32> {
        self.sizes.get(frame).copied()
    }

    pub fn offset(&self, frame: usize) -> Option<u64> {
        self.offsets.get(frame).copied()
    }

    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Largest compressed frame; sizes the read scratch buffer.
    pub fn max_size(&self) -> u32 {
        self.sizes.iter().copied().max().unwrap_or(0)
    }

    pub fn total_size(&self) -> u64 {
        self.sizes.iter().map(|&s| s as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::CompressionType;
    use byteorder::WriteBytesExt;
    use proptest::prelude::*;

    fn table_bytes(sizes: &[u32]) -> Vec<u8> {
        let mut buf = Vec::new();
        for &s in sizes {
            buf.write_u32::<LittleEndian>(s).unwrap();
        }
        buf
    }

    #[test]
    fn offsets_for_empty_single_and_hundred() {
        assert!(compute_offsets(&[], 40).is_empty());
        assert_eq!(compute_offsets(&[17], 44), vec![44]);

        let sizes: Vec<u32> = (1..=100).collect();
        let offsets = compute_offsets(&sizes, 440);
        assert_eq!(offsets.len(), 100);
        for i in 0..100 {
            let expected = 440 + sizes[..i].iter().map(|&s| s as u64).sum::<u64>();
            assert_eq!(offsets[i], expected);
        }
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[u32::MAX, 2]), 1);
    }

    #[test]
    fn read_verifies_checksum() {
        let sizes = [10u32, 20, 30];
        let mut header = Header::new(8, 8, 25, CompressionType::Dxt5Alpha);
        header.frame_count = 3;
        header.crc_frame_sizes = 60;
        let table = FrameTable::read(&table_bytes(&sizes)[..], &header).unwrap();
        assert_eq!(table.offsets(), &[52, 62, 82]);
        assert_eq!(table.max_size(), 30);

        header.crc_frame_sizes = 61;
        assert!(matches!(
            FrameTable::read(&table_bytes(&sizes)[..], &header),
            Err(FormatError::ChecksumMismatch { stored: 61, computed: 60 })
        ));
    }

    #[test]
    fn short_table_is_truncated() {
        let bytes = table_bytes(&[1, 2]);
        assert!(matches!(
            read_frame_size_table(&bytes[..], 3),
            Err(FormatError::Truncated)
        ));
    }

    #[test]
    fn extent_check() {
        let table = FrameTable::from_sizes(vec![5, 5], 100);
        assert!(table.check_extent(110).is_ok());
        assert!(matches!(
            table.check_extent(109),
            Err(FormatError::FrameDataOutOfBounds { frame: 1, end: 110, file_len: 109 })
        ));
        assert!(FrameTable::default().check_extent(0).is_ok());
    }

    proptest! {
        #[test]
        fn offsets_are_prefix_sums(sizes in proptest::collection::vec(0u32..1_000_000, 0..200), start in 0u64..1 << 40) {
            let offsets = compute_offsets(&sizes, start);
            prop_assert_eq!(offsets.len(), sizes.len());
            let mut acc = start;
            for (i, &s) in sizes.iter().enumerate() {
                prop_assert_eq!(offsets[i], acc);
                acc += s as u64;
            }
        }

        #[test]
        fn checksum_matches_truncated_u64_sum(sizes in proptest::collection::vec(any::<u32>(), 0..64)) {
            let wide: u64 = sizes.iter().map(|&s| s as u64).sum();
            prop_assert_eq!(checksum(&sizes), wide as u32);
        }
    }
}
