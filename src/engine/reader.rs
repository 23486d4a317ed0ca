//! Random-access frame reader over an open container.
//!
//! Owns the file handle, the validated [`FrameTable`], a scratch buffer for
//! compressed payloads (sized to the largest frame, allocated once) and a
//! staging buffer that receives the decompressed frame.  The engine swaps
//! the staging buffer into the consumer-visible slot only after a frame
//! decoded successfully.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use crate::codec::FrameDecompressor;
use crate::engine::stats::StatsCell;
use crate::error::{EngineError, FormatError, Result};
use crate::frame_table::FrameTable;
use crate::header::Header;

pub struct FrameReader<R: Read + Seek = File> {
    reader:       R,
    header:       Header,
    table:        FrameTable,
    scratch:      Vec<u8>,
    staging:      Vec<u8>,
    decompressor: Box<dyn FrameDecompressor>,
}

impl FrameReader<File> {
    /// Open `path` and validate header, frame table and payload extent.
    /// Nothing is retained on failure.
    pub fn open<P: AsRef<Path>>(path: P, decompressor: Box<dyn FrameDecompressor>) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        Self::new(file, file_len, decompressor)
    }
}

impl<R: Read + Seek> FrameReader<R> {
    pub fn new(mut reader: R, stream_len: u64, decompressor: Box<dyn FrameDecompressor>) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = Header::read(&mut reader)?;
        header.validate()?;
        header.check_table_fits(stream_len)?;
        let table = FrameTable::read(&mut reader, &header)?;
        if table.is_empty() {
            return Err(FormatError::NoFrames.into());
        }
        table.check_extent(stream_len)?;

        let scratch = vec![0u8; table.max_size() as usize];
        let staging = vec![0u8; header.bytes_per_frame()];
        Ok(Self { reader, header, table, scratch, staging, decompressor })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn table(&self) -> &FrameTable {
        &self.table
    }

    pub fn frame_count(&self) -> usize {
        self.table.len()
    }

    /// Read the compressed payload of `frame` into the scratch buffer.
    pub fn read_compressed(&mut self, frame: usize) -> Result<&[u8]> {
        let (offset, size) = match (self.table.offset(frame), self.table.size(frame)) {
            (Some(o), Some(s)) => (o, s as usize),
            _ => {
                return Err(EngineError::FrameOutOfRange {
                    frame: frame as i64,
                    count: self.table.len() as u64,
                })
            }
        };
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut self.scratch[..size])?;
        Ok(&self.scratch[..size])
    }

    /// Read and decompress `frame` into the staging buffer.  Timings go to
    /// `stats` when given.
    pub fn read_frame(&mut self, frame: usize, stats: Option<&StatsCell>) -> Result<()> {
        let started = Instant::now();
        let size = self.read_compressed(frame)?.len();
        let read_done = Instant::now();

        self.decompressor
            .decompress_into(&self.scratch[..size], &mut self.staging)?;

        if let Some(stats) = stats {
            stats.record_read(read_done - started);
            stats.record_decompress(read_done.elapsed());
        }
        Ok(())
    }

    /// Decoded frame waiting to be published.
    pub fn staging_mut(&mut self) -> &mut Vec<u8> {
        &mut self.staging
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Lz4BlockDecompressor;
    use crate::frame_table::checksum;
    use crate::header::CompressionType;
    use std::io::Cursor;

    fn container(frames: &[Vec<u8>]) -> Vec<u8> {
        let payloads: Vec<Vec<u8>> = frames.iter().map(|f| lz4_flex::block::compress(f)).collect();
        let sizes: Vec<u32> = payloads.iter().map(|p| p.len() as u32).collect();
        let mut header = Header::new(8, 4, 30, CompressionType::Dxt5Alpha);
        header.frame_count = frames.len() as u32;
        header.crc_frame_sizes = checksum(&sizes);

        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        for s in &sizes {
            out.extend_from_slice(&s.to_le_bytes());
        }
        for p in &payloads {
            out.extend_from_slice(p);
        }
        out
    }

    fn frames(n: u8) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i; 32]).collect()
    }

    #[test]
    fn decodes_any_frame() {
        let bytes = container(&frames(5));
        let len = bytes.len() as u64;
        let mut reader = FrameReader::new(Cursor::new(bytes), len, Box::new(Lz4BlockDecompressor)).unwrap();
        assert_eq!(reader.frame_count(), 5);
        for i in [3usize, 0, 4] {
            reader.read_frame(i, None).unwrap();
            assert!(reader.staging_mut().iter().all(|&b| b == i as u8));
        }
        assert!(matches!(reader.read_frame(5, None), Err(EngineError::FrameOutOfRange { frame: 5, count: 5 })));
    }

    #[test]
    fn truncated_payload_fails_at_open() {
        let mut bytes = container(&frames(3));
        bytes.truncate(bytes.len() - 1);
        let len = bytes.len() as u64;
        let err = FrameReader::new(Cursor::new(bytes), len, Box::new(Lz4BlockDecompressor)).err().unwrap();
        assert!(matches!(err, EngineError::Format(FormatError::FrameDataOutOfBounds { frame: 2, .. })));
    }

    #[test]
    fn records_stats() {
        let bytes = container(&frames(2));
        let len = bytes.len() as u64;
        let mut reader = FrameReader::new(Cursor::new(bytes), len, Box::new(Lz4BlockDecompressor)).unwrap();
        let stats = StatsCell::default();
        reader.read_frame(1, Some(&stats)).unwrap();
        let snap = stats.snapshot();
        assert_eq!(snap.decode_total(), snap.read + snap.decompress);
        assert_eq!(snap.upload, std::time::Duration::ZERO);
    }
}
