#![allow(dead_code)]

use hpv::frame_table::checksum;
use hpv::{CompressionType, EngineOptions, Header};
use std::io::Write;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

pub const WIDTH:  u32 = 8;
pub const HEIGHT: u32 = 4;

/// Frame `i` is `bytes_per_frame` copies of `i as u8`.
pub fn frame_bytes(ct: CompressionType, i: usize) -> Vec<u8> {
    vec![i as u8; ct.bytes_per_frame(WIDTH, HEIGHT)]
}

pub fn container_bytes(frames: usize, fps: u32, ct: CompressionType) -> Vec<u8> {
    let payloads: Vec<Vec<u8>> = (0..frames)
        .map(|i| lz4_flex::block::compress(&frame_bytes(ct, i)))
        .collect();
    let sizes: Vec<u32> = payloads.iter().map(|p| p.len() as u32).collect();

    let mut header = Header::new(WIDTH, HEIGHT, fps, ct);
    header.frame_count = frames as u32;
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

pub fn write_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(bytes).unwrap();
    tmp.flush().unwrap();
    tmp
}

pub fn write_hpv(frames: usize, fps: u32) -> NamedTempFile {
    write_bytes(&container_bytes(frames, fps, CompressionType::Dxt5Alpha))
}

/// Overwrite the little-endian u32 header field at `index`.
pub fn patch_field(bytes: &mut [u8], index: usize, value: u32) {
    bytes[index * 4..index * 4 + 4].copy_from_slice(&value.to_le_bytes());
}

/// Generous seek timeout so loaded CI machines do not flake.
pub fn test_options() -> EngineOptions {
    EngineOptions { seek_timeout_ms: 2_000, ..EngineOptions::default() }
}

pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

/// Overwrite the payload of `frame` with 0xFF so it no longer decompresses.
/// The size table and checksum stay valid.
pub fn corrupt_frame(bytes: &mut [u8], frame: usize) {
    let count = u32::from_le_bytes(bytes[16..20].try_into().unwrap()) as usize;
    let size_at = |i: usize| {
        let at = 40 + 4 * i;
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap()) as usize
    };
    let start = 40 + 4 * count + (0..frame).map(size_at).sum::<usize>();
    let end = start + size_at(frame);
    bytes[start..end].fill(0xFF);
}

pub fn write_hpv_with_bad_frame(frames: usize, fps: u32, bad: usize) -> NamedTempFile {
    let mut bytes = container_bytes(frames, fps, CompressionType::Dxt5Alpha);
    corrupt_frame(&mut bytes, bad);
    write_bytes(&bytes)
}
