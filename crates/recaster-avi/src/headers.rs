//! Fixed-layout header records: `avih`, `strh`, `strf` and `idx1` entries.
//!
//! All fields are little-endian. `to_bytes` produces exactly the chunk
//! payload; `parse` reads one back and returns `None` when it is too short.

use crate::FourCc;

/// `avih` flag: the file carries an `idx1` index.
pub const AVIF_HASINDEX: u32 = 0x10;
/// `idx1` entry flag: the chunk is a keyframe.
pub const AVIIF_KEYFRAME: u32 = 0x10;
/// `biCompression` for uncompressed RGB.
pub const BI_RGB: u32 = 0;

// ── Byte helpers ──────────────────────────────────────────────────────────────

struct Le<'a> {
    buf: &'a [u8],
}

impl<'a> Le<'a> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.buf.len() < N {
            return None;
        }
        let (head, rest) = self.buf.split_at(N);
        self.buf = rest;
        head.try_into().ok()
    }

    fn u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn fourcc(&mut self) -> Option<FourCc> {
        self.take()
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

// ── avih ──────────────────────────────────────────────────────────────────────

/// AVIMAINHEADER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MainHeader {
    pub micro_sec_per_frame: u32,
    pub max_bytes_per_sec: u32,
    pub padding_granularity: u32,
    pub flags: u32,
    pub total_frames: u32,
    pub initial_frames: u32,
    pub streams: u32,
    pub suggested_buffer_size: u32,
    pub width: u32,
    pub height: u32,
}

impl MainHeader {
    pub const LEN: usize = 56;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        put_u32(&mut out, self.micro_sec_per_frame);
        put_u32(&mut out, self.max_bytes_per_sec);
        put_u32(&mut out, self.padding_granularity);
        put_u32(&mut out, self.flags);
        put_u32(&mut out, self.total_frames);
        put_u32(&mut out, self.initial_frames);
        put_u32(&mut out, self.streams);
        put_u32(&mut out, self.suggested_buffer_size);
        put_u32(&mut out, self.width);
        put_u32(&mut out, self.height);
        out.extend_from_slice(&[0; 16]); // dwReserved[4]
        out
    }

    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::LEN {
            return None;
        }
        let mut r = Le { buf: payload };
        Some(Self {
            micro_sec_per_frame: r.u32()?,
            max_bytes_per_sec: r.u32()?,
            padding_granularity: r.u32()?,
            flags: r.u32()?,
            total_frames: r.u32()?,
            initial_frames: r.u32()?,
            streams: r.u32()?,
            suggested_buffer_size: r.u32()?,
            width: r.u32()?,
            height: r.u32()?,
        })
    }
}

// ── strh ──────────────────────────────────────────────────────────────────────

/// AVISTREAMHEADER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    pub initial_frames: u32,
    pub scale: u32,
    pub rate: u32,
    pub start: u32,
    pub length: u32,
    pub suggested_buffer_size: u32,
    /// `u32::MAX` means "driver default".
    pub quality: u32,
    pub sample_size: u32,
    /// rcFrame: left, top, right, bottom.
    pub frame: [u16; 4],
}

impl StreamHeader {
    pub const LEN: usize = 56;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.fcc_type);
        out.extend_from_slice(&self.fcc_handler);
        put_u32(&mut out, self.flags);
        put_u16(&mut out, self.priority);
        put_u16(&mut out, self.language);
        put_u32(&mut out, self.initial_frames);
        put_u32(&mut out, self.scale);
        put_u32(&mut out, self.rate);
        put_u32(&mut out, self.start);
        put_u32(&mut out, self.length);
        put_u32(&mut out, self.suggested_buffer_size);
        put_u32(&mut out, self.quality);
        put_u32(&mut out, self.sample_size);
        for edge in self.frame {
            put_u16(&mut out, edge);
        }
        out
    }

    pub fn parse(payload: &[u8]) -> Option<Self> {
        let mut r = Le { buf: payload };
        Some(Self {
            fcc_type: r.fourcc()?,
            fcc_handler: r.fourcc()?,
            flags: r.u32()?,
            priority: r.u16()?,
            language: r.u16()?,
            initial_frames: r.u32()?,
            scale: r.u32()?,
            rate: r.u32()?,
            start: r.u32()?,
            length: r.u32()?,
            suggested_buffer_size: r.u32()?,
            quality: r.u32()?,
            sample_size: r.u32()?,
            frame: [r.u16()?, r.u16()?, r.u16()?, r.u16()?],
        })
    }
}

// ── strf ──────────────────────────────────────────────────────────────────────

/// BITMAPINFOHEADER. A negative `height` declares top-down rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl BitmapInfoHeader {
    pub const LEN: usize = 40;

    /// Header for top-down, uncompressed 32-bit BGRA bitmaps.
    pub fn bgra32_top_down(width: u32, height: u32) -> Self {
        let width = width.min(i32::MAX as u32) as i32;
        let height = height.min(i32::MAX as u32) as i32;
        Self {
            size: Self::LEN as u32,
            width,
            height: -height,
            planes: 1,
            bit_count: 32,
            compression: BI_RGB,
            size_image: (width as u32).wrapping_mul(height as u32).wrapping_mul(4),
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            clr_used: 0,
            clr_important: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        put_u32(&mut out, self.size);
        put_i32(&mut out, self.width);
        put_i32(&mut out, self.height);
        put_u16(&mut out, self.planes);
        put_u16(&mut out, self.bit_count);
        put_u32(&mut out, self.compression);
        put_u32(&mut out, self.size_image);
        put_i32(&mut out, self.x_pels_per_meter);
        put_i32(&mut out, self.y_pels_per_meter);
        put_u32(&mut out, self.clr_used);
        put_u32(&mut out, self.clr_important);
        out
    }

    pub fn parse(payload: &[u8]) -> Option<Self> {
        let mut r = Le { buf: payload };
        Some(Self {
            size: r.u32()?,
            width: r.i32()?,
            height: r.i32()?,
            planes: r.u16()?,
            bit_count: r.u16()?,
            compression: r.u32()?,
            size_image: r.u32()?,
            x_pels_per_meter: r.i32()?,
            y_pels_per_meter: r.i32()?,
            clr_used: r.u32()?,
            clr_important: r.u32()?,
        })
    }

    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }
}

// ── idx1 ──────────────────────────────────────────────────────────────────────

/// One `idx1` record (AVIOLDINDEX entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub chunk_id: FourCc,
    pub flags: u32,
    /// Offset of the chunk header from the first byte after the `movi` tag.
    pub offset: u32,
    /// Payload length of the chunk.
    pub size: u32,
}

impl IndexEntry {
    pub const LEN: usize = 16;

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.chunk_id);
        put_u32(out, self.flags);
        put_u32(out, self.offset);
        put_u32(out, self.size);
    }

    pub fn parse(record: &[u8]) -> Option<Self> {
        let mut r = Le { buf: record };
        Some(Self {
            chunk_id: r.fourcc()?,
            flags: r.u32()?,
            offset: r.u32()?,
            size: r.u32()?,
        })
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags & AVIIF_KEYFRAME != 0
    }
}
