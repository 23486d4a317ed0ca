use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Timings of the most recent decode.  Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Disk seek + read of the compressed payload.
    pub read:       Duration,
    /// LZ4 decompression into the staging buffer.
    pub decompress: Duration,
    /// Texture upload, reported by the GPU bridge via `set_upload_time`.
    pub upload:     Duration,
}

impl DecodeStats {
    pub fn decode_total(&self) -> Duration {
        self.read + self.decompress
    }
}

/// Lock-free storage shared between the decode thread and readers.
#[derive(Debug, Default)]
pub struct StatsCell {
    read_ns:       AtomicU64,
    decompress_ns: AtomicU64,
    upload_ns:     AtomicU64,
}

fn nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

impl StatsCell {
    pub fn record_read(&self, d: Duration) {
        self.read_ns.store(nanos(d), Ordering::Relaxed);
    }

    pub fn record_decompress(&self, d: Duration) {
        self.decompress_ns.store(nanos(d), Ordering::Relaxed);
    }

    pub fn record_upload(&self, d: Duration) {
        self.upload_ns.store(nanos(d), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DecodeStats {
        DecodeStats {
            read:       Duration::from_nanos(self.read_ns.load(Ordering::Relaxed)),
            decompress: Duration::from_nanos(self.decompress_ns.load(Ordering::Relaxed)),
            upload:     Duration::from_nanos(self.upload_ns.load(Ordering::Relaxed)),
        }
    }

    pub fn reset(&self) {
        self.read_ns.store(0, Ordering::Relaxed);
        self.decompress_ns.store(0, Ordering::Relaxed);
        self.upload_ns.store(0, Ordering::Relaxed);
    }
}
