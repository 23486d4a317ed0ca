//! The fixed 40-byte `.hpv` header.
//!
//! # Layout
//! Ten little-endian `u32` fields, in order:
//!
//! | # | Field              |
//! |---|--------------------|
//! | 0 | `magic`            |
//! | 1 | `version`          |
//! | 2 | `width`            |
//! | 3 | `height`           |
//! | 4 | `frame_count`      |
//! | 5 | `frame_rate`       |
//! | 6 | `compression_type` |
//! | 7 | `crc_frame_sizes`  |
//! | 8 | `reserved_1`       |
//! | 9 | `reserved_2`       |
//!
//! The frame size table follows immediately, then the frame payloads.
//!
//! # Endianness
//! Always little-endian on disk, regardless of host.  Files written by
//! big-endian hosts with native byte order are rejected by the magic check.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Cursor, Read, Write};

use crate::error::FormatError;

pub const MAGIC: u32 = 0x4850_5646; // "HPVF"
pub const HEADER_SIZE: usize = 40;
pub const MAX_SIDE: u32 = 8192;

// ── Format versions ─────────────────────────────────────────────────────────

pub const VERSION_CONCAT:       u32 = 0;
pub const VERSION_DIMENSIONS:   u32 = 1;
pub const VERSION_FRAME_RATE:   u32 = 2;
pub const VERSION_ALPHA:        u32 = 3;
pub const VERSION_RESERVED:     u32 = 4;
pub const VERSION_SCALED_COCGY: u32 = 5;
/// Frames are LZ4 block-compressed on top of DXT.
pub const VERSION_LZ4:          u32 = 6;
pub const CURRENT_VERSION:      u32 = VERSION_LZ4;

// ── Compression type ────────────────────────────────────────────────────────

/// GPU block encoding of every frame in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum CompressionType {
    /// DXT1 / BC1, RGB without alpha, 4 bits per pixel.
    Dxt1NoAlpha = 0,
    /// DXT5 / BC3, RGBA, 8 bits per pixel.
    Dxt5Alpha = 1,
    /// DXT5 / BC3 storing scaled CoCg in RGB and Y in alpha, 8 bits per pixel.
    ScaledDxt5CoCgY = 2,
}

/// Texture block format the GPU bridge has to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    Bc1,
    Bc3,
}

impl CompressionType {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(CompressionType::Dxt1NoAlpha),
            1 => Some(CompressionType::Dxt5Alpha),
            2 => Some(CompressionType::ScaledDxt5CoCgY),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionType::Dxt1NoAlpha     => "DXT1 (no ALPHA)",
            CompressionType::Dxt5Alpha       => "DXT5 (with ALPHA)",
            CompressionType::ScaledDxt5CoCgY => "SCALED DXT5 (CoCg_Y)",
        }
    }

    pub fn block_format(self) -> BlockFormat {
        match self {
            CompressionType::Dxt1NoAlpha => BlockFormat::Bc1,
            CompressionType::Dxt5Alpha | CompressionType::ScaledDxt5CoCgY => BlockFormat::Bc3,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == CompressionType::Dxt5Alpha
    }

    /// CoCg_Y frames must go through a YCoCg → RGB shader after upload.
    pub fn needs_color_transform(self) -> bool {
        self == CompressionType::ScaledDxt5CoCgY
    }

    /// Uncompressed (DXT) size of one frame.
    pub fn bytes_per_frame(self, width: u32, height: u32) -> usize {
        let bytes = width as usize * height as usize;
        match self {
            CompressionType::Dxt1NoAlpha => bytes >> 1,
            _ => bytes,
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Header ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic:            u32,
    pub version:          u32,
    pub width:            u32,
    pub height:           u32,
    pub frame_count:      u32,
    pub frame_rate:       u32,
    pub compression_type: CompressionType,
    pub crc_frame_sizes:  u32,
    pub reserved_1:       u32,
    pub reserved_2:       u32,
}

impl Header {
    pub fn new(width: u32, height: u32, frame_rate: u32, compression_type: CompressionType) -> Self {
        Self {
            magic:            MAGIC,
            version:          CURRENT_VERSION,
            width,
            height,
            frame_count:      0,
            frame_rate,
            compression_type,
            crc_frame_sizes:  0,
            reserved_1:       0,
            reserved_2:       0,
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.width)?;
        writer.write_u32::<LittleEndian>(self.height)?;
        writer.write_u32::<LittleEndian>(self.frame_count)?;
        writer.write_u32::<LittleEndian>(self.frame_rate)?;
        writer.write_u32::<LittleEndian>(self.compression_type as u32)?;
        writer.write_u32::<LittleEndian>(self.crc_frame_sizes)?;
        writer.write_u32::<LittleEndian>(self.reserved_1)?;
        writer.write_u32::<LittleEndian>(self.reserved_2)?;
        Ok(())
    }

    /// Read exactly [`HEADER_SIZE`] bytes and parse them.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, FormatError> {
        let mut raw = [0u8; HEADER_SIZE];
        reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => FormatError::Truncated,
            _ => FormatError::Io(e),
        })?;
        Self::parse(&raw)
    }

    /// Parse a header from the start of `bytes`.  Checks the magic number and
    /// the compression type; dimensions are checked by [`validate_dimensions`].
    ///
    /// [`validate_dimensions`]: Header::validate_dimensions
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated);
        }
        let mut r = Cursor::new(&bytes[..HEADER_SIZE]);
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        let version          = r.read_u32::<LittleEndian>()?;
        let width            = r.read_u32::<LittleEndian>()?;
        let height           = r.read_u32::<LittleEndian>()?;
        let frame_count      = r.read_u32::<LittleEndian>()?;
        let frame_rate       = r.read_u32::<LittleEndian>()?;
        let raw_type         = r.read_u32::<LittleEndian>()?;
        let crc_frame_sizes  = r.read_u32::<LittleEndian>()?;
        let reserved_1       = r.read_u32::<LittleEndian>()?;
        let reserved_2       = r.read_u32::<LittleEndian>()?;
        let compression_type = CompressionType::from_u32(raw_type)
            .ok_or(FormatError::UnknownCompressionType(raw_type))?;
        Ok(Self {
            magic,
            version,
            width,
            height,
            frame_count,
            frame_rate,
            compression_type,
            crc_frame_sizes,
            reserved_1,
            reserved_2,
        })
    }

    pub fn validate_dimensions(&self) -> Result<(), FormatError> {
        if self.width == 0 || self.width > MAX_SIDE {
            return Err(FormatError::InvalidWidth(self.width));
        }
        if self.height == 0 || self.height > MAX_SIDE {
            return Err(FormatError::InvalidHeight(self.height));
        }
        Ok(())
    }

    /// Dimension and frame rate checks.  Must pass before the frame table is
    /// trusted.
    pub fn validate(&self) -> Result<(), FormatError> {
        self.validate_dimensions()?;
        if self.frame_rate == 0 {
            return Err(FormatError::InvalidFrameRate);
        }
        Ok(())
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.compression_type.bytes_per_frame(self.width, self.height)
    }

    /// Byte offset of the first frame payload.
    pub fn data_offset(&self) -> u64 {
        HEADER_SIZE as u64 + 4 * self.frame_count as u64
    }

    /// The size table must fit inside a stream of `stream_len` bytes.  Checked
    /// before the table is allocated, so a forged `frame_count` cannot ask
    /// for gigabytes.
    pub fn check_table_fits(&self, stream_len: u64) -> Result<(), FormatError> {
        if self.data_offset() > stream_len {
            return Err(FormatError::Truncated);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        let mut h = Header::new(64, 32, 30, CompressionType::Dxt5Alpha);
        h.frame_count = 12;
        h.crc_frame_sizes = 0xDEAD_BEEF;
        h
    }

    #[test]
    fn write_then_parse() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[..4], &[0x46, 0x56, 0x50, 0x48]);
        assert_eq!(Header::parse(&buf).unwrap(), sample());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        buf[0] ^= 0xFF;
        assert!(matches!(Header::parse(&buf), Err(FormatError::BadMagic(_))));
    }

    #[test]
    fn short_input_is_truncated() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        assert!(matches!(Header::parse(&buf[..39]), Err(FormatError::Truncated)));
        assert!(matches!(Header::read(&buf[..10]), Err(FormatError::Truncated)));
    }

    #[test]
    fn table_must_fit_in_stream() {
        let mut h = sample();
        assert!(h.check_table_fits(HEADER_SIZE as u64 + 48).is_ok());
        assert!(matches!(h.check_table_fits(HEADER_SIZE as u64 + 47), Err(FormatError::Truncated)));
        h.frame_count = u32::MAX;
        assert!(matches!(h.check_table_fits(1 << 20), Err(FormatError::Truncated)));
    }

    #[test]
    fn unknown_compression_type() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        buf[24] = 7;
        assert!(matches!(
            Header::parse(&buf),
            Err(FormatError::UnknownCompressionType(7))
        ));
    }

    #[test]
    fn dimension_bounds() {
        let mut h = sample();
        h.width = 0;
        assert!(matches!(h.validate_dimensions(), Err(FormatError::InvalidWidth(0))));
        h.width = MAX_SIDE;
        h.height = MAX_SIDE + 1;
        assert!(matches!(h.validate_dimensions(), Err(FormatError::InvalidHeight(8193))));
        h.height = 1;
        assert!(h.validate_dimensions().is_ok());
        h.frame_rate = 0;
        assert!(matches!(h.validate(), Err(FormatError::InvalidFrameRate)));
    }

    #[test]
    fn dxt1_frames_are_half_size() {
        let mut h = sample();
        assert_eq!(h.bytes_per_frame(), 64 * 32);
        h.compression_type = CompressionType::Dxt1NoAlpha;
        assert_eq!(h.bytes_per_frame(), 64 * 32 / 2);
        assert_eq!(h.data_offset(), 40 + 4 * 12);
    }

    #[test]
    fn block_formats() {
        assert_eq!(CompressionType::Dxt1NoAlpha.block_format(), BlockFormat::Bc1);
        assert_eq!(CompressionType::ScaledDxt5CoCgY.block_format(), BlockFormat::Bc3);
        assert!(CompressionType::ScaledDxt5CoCgY.needs_color_transform());
        assert!(!CompressionType::Dxt5Alpha.needs_color_transform());
        assert!(CompressionType::Dxt5Alpha.has_alpha());
    }
}
