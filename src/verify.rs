//! Whole-file integrity check: header, frame table checksum, payload extent,
//! then decompression of every frame.
//!
//! With the `parallel` feature frames are decompressed concurrently using
//! Rayon, one file handle and one pair of buffers per worker.  Without it the
//! same work runs sequentially on the calling thread.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::codec::{FrameDecompressor, Lz4BlockDecompressor};
use crate::error::{EngineError, FormatError, Result};
use crate::frame_table::FrameTable;
use crate::header::Header;

/// A frame that failed to read or decompress.
#[derive(Debug, Clone)]
pub struct FrameFault {
    pub frame: usize,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub path:             PathBuf,
    pub header:           Header,
    pub compressed_bytes: u64,
    /// Sum of bytes-per-frame over every frame that decoded.
    pub decoded_bytes:    u64,
    pub faults:           Vec<FrameFault>,
    pub elapsed:          Duration,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn frames_ok(&self) -> usize {
        self.header.frame_count as usize - self.faults.len()
    }

    /// Compressed / decoded size over the whole file.
    pub fn ratio(&self) -> f64 {
        if self.decoded_bytes == 0 {
            return 0.0;
        }
        self.compressed_bytes as f64 / self.decoded_bytes as f64
    }
}

// ── Per-frame work ───────────────────────────────────────────────────────────

struct Worker {
    file:    File,
    scratch: Vec<u8>,
    out:     Vec<u8>,
}

impl Worker {
    fn new(path: &Path, table: &FrameTable, bytes_per_frame: usize) -> std::io::Result<Self> {
        Ok(Self {
            file:    File::open(path)?,
            scratch: vec![0u8; table.max_size() as usize],
            out:     vec![0u8; bytes_per_frame],
        })
    }

    fn check(&mut self, table: &FrameTable, frame: usize) -> Result<()> {
        let (offset, size) = match (table.offset(frame), table.size(frame)) {
            (Some(o), Some(s)) => (o, s as usize),
            _ => return Err(EngineError::FrameOutOfRange { frame: frame as i64, count: table.len() as u64 }),
        };
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut self.scratch[..size])?;
        Lz4BlockDecompressor.decompress_into(&self.scratch[..size], &mut self.out)?;
        Ok(())
    }
}

fn fault(frame: usize, e: impl std::fmt::Display) -> FrameFault {
    FrameFault { frame, error: e.to_string() }
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Verify `path`.  Container-level problems (bad header, checksum, extent)
/// are returned as errors; per-frame problems are collected in the report.
pub fn verify_file<P: AsRef<Path>>(path: P) -> Result<VerifyReport> {
    let path = path.as_ref().to_path_buf();
    let started = Instant::now();

    let mut file = File::open(&path)?;
    let file_len = file.metadata()?.len();
    let header = Header::read(&mut file)?;
    header.validate()?;
    header.check_table_fits(file_len)?;
    let table = FrameTable::read(&mut file, &header)?;
    if table.is_empty() {
        return Err(FormatError::NoFrames.into());
    }
    table.check_extent(file_len)?;
    drop(file);

    let bpf = header.bytes_per_frame();
    let faults = decode_all(&path, &table, bpf);
    let decoded = (table.len() - faults.len()) as u64 * bpf as u64;

    let report = VerifyReport {
        compressed_bytes: table.total_size(),
        decoded_bytes:    decoded,
        elapsed:          started.elapsed(),
        path,
        header,
        faults,
    };
    tracing::debug!(
        frames = report.header.frame_count,
        faults = report.faults.len(),
        "verified {} in {:?}",
        report.path.display(),
        report.elapsed
    );
    Ok(report)
}

fn decode_all(path: &Path, table: &FrameTable, bytes_per_frame: usize) -> Vec<FrameFault> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let mut faults: Vec<FrameFault> = (0..table.len())
            .into_par_iter()
            .map_init(
                || Worker::new(path, table, bytes_per_frame),
                |worker, i| match worker {
                    Ok(w) => w.check(table, i).err().map(|e| fault(i, e)),
                    Err(e) => Some(fault(i, e)),
                },
            )
            .flatten()
            .collect();
        faults.sort_by_key(|f| f.frame);
        faults
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut worker = match Worker::new(path, table, bytes_per_frame) {
            Ok(w) => w,
            Err(e) => return (0..table.len()).map(|i| fault(i, &e)).collect(),
        };
        (0..table.len())
            .filter_map(|i| worker.check(table, i).err().map(|e| fault(i, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_table::checksum;
    use crate::header::CompressionType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_container(payloads: &[Vec<u8>]) -> NamedTempFile {
        let sizes: Vec<u32> = payloads.iter().map(|p| p.len() as u32).collect();
        let mut header = Header::new(4, 4, 24, CompressionType::Dxt1NoAlpha);
        header.frame_count = payloads.len() as u32;
        header.crc_frame_sizes = checksum(&sizes);

        let mut tmp = NamedTempFile::new().unwrap();
        header.write(&mut tmp).unwrap();
        for s in &sizes {
            tmp.write_all(&s.to_le_bytes()).unwrap();
        }
        for p in payloads {
            tmp.write_all(p).unwrap();
        }
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn clean_file_verifies() {
        // DXT1 4x4 → 8 bytes per frame
        let payloads: Vec<Vec<u8>> = (0..4u8).map(|i| lz4_flex::block::compress(&[i; 8])).collect();
        let tmp = write_container(&payloads);
        let report = verify_file(tmp.path()).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.frames_ok(), 4);
        assert_eq!(report.decoded_bytes, 32);
        assert!(report.ratio() > 0.0);
    }

    #[test]
    fn bad_frames_are_reported_not_fatal() {
        let mut payloads: Vec<Vec<u8>> = (0..4u8).map(|i| lz4_flex::block::compress(&[i; 8])).collect();
        payloads[2] = lz4_flex::block::compress(&[9u8; 5]);
        let tmp = write_container(&payloads);
        let report = verify_file(tmp.path()).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].frame, 2);
        assert_eq!(report.frames_ok(), 3);
    }

    #[test]
    fn container_errors_are_fatal() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&[0u8; 40]).unwrap();
        tmp.flush().unwrap();
        assert!(matches!(
            verify_file(tmp.path()),
            Err(EngineError::Format(FormatError::BadMagic(0)))
        ));
    }
}
