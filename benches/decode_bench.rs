use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hpv::codec::{FrameDecompressor, Lz4BlockDecompressor};
use hpv::engine::FrameReader;
use hpv::frame_table::{checksum, compute_offsets};
use hpv::{CompressionType, Header};
use std::io::Cursor;

/// 1080p DXT5: one byte per pixel.
fn frame_1080p(seed: u8) -> Vec<u8> {
    (0..1920 * 1080).map(|i| ((i / 64) as u8).wrapping_add(seed)).collect()
}

fn bench_decompress(c: &mut Criterion) {
    let frame = frame_1080p(0);
    let packed = lz4_flex::block::compress(&frame);
    let mut out = vec![0u8; frame.len()];

    c.bench_function("lz4_decompress_1080p_dxt5", |b| {
        b.iter(|| Lz4BlockDecompressor.decompress_into(black_box(&packed), &mut out).unwrap())
    });
}

fn bench_offsets(c: &mut Criterion) {
    let sizes: Vec<u32> = (0..100_000u32).map(|i| 40_000 + (i % 977)).collect();

    c.bench_function("offsets_100k_frames", |b| b.iter(|| compute_offsets(black_box(&sizes), 400_040)));
    c.bench_function("checksum_100k_frames", |b| b.iter(|| checksum(black_box(&sizes))));
}

fn bench_read_frame(c: &mut Criterion) {
    let frames: Vec<Vec<u8>> = (0..8).map(frame_1080p).collect();
    let payloads: Vec<Vec<u8>> = frames.iter().map(|f| lz4_flex::block::compress(f)).collect();
    let sizes: Vec<u32> = payloads.iter().map(|p| p.len() as u32).collect();

    let mut header = Header::new(1920, 1080, 60, CompressionType::Dxt5Alpha);
    header.frame_count = frames.len() as u32;
    header.crc_frame_sizes = checksum(&sizes);
    let mut bytes = Vec::new();
    header.write(&mut bytes).unwrap();
    for s in &sizes {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    for p in &payloads {
        bytes.extend_from_slice(p);
    }

    let len = bytes.len() as u64;
    let mut reader = FrameReader::new(Cursor::new(bytes), len, Box::new(Lz4BlockDecompressor)).unwrap();
    let mut i = 0usize;
    c.bench_function("read_frame_1080p_in_memory", |b| {
        b.iter(|| {
            reader.read_frame(black_box(i % 8), None).unwrap();
            i += 1;
        })
    });
}

criterion_group!(benches, bench_decompress, bench_offsets, bench_read_frame);
criterion_main!(benches);
