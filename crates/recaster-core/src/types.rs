use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::FrameError;

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

// MARK: - Resolution

/// Pixel dimensions of a capture surface or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Self = Self { width: 1280, height: 720 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Byte length of one tightly packed BGRA frame at this size.
    pub fn frame_len(&self) -> u64 {
        self.total_pixels() * BYTES_PER_PIXEL as u64
    }

    /// Integer downscale by `divisor`, never collapsing an axis below 1 px.
    pub fn divided_by(&self, divisor: u32) -> Self {
        let divisor = divisor.max(1);
        Self {
            width: (self.width / divisor).max(1),
            height: (self.height / divisor).max(1),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

// MARK: - Frame

/// One captured raster image: tightly packed BGRA rows, top row first.
///
/// The pixel buffer is immutable once constructed. Cloning a `Frame` shares
/// the underlying allocation instead of copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    size: Resolution,
    data: Bytes,
}

impl Frame {
    /// Wrap a BGRA pixel buffer, checking it is exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: impl Into<Bytes>) -> Result<Self, FrameError> {
        let size = Resolution::new(width, height);
        if size.is_empty() {
            return Err(FrameError::EmptyDimensions { width, height });
        }
        let data = data.into();
        let expected = size.frame_len();
        if data.len() as u64 != expected {
            return Err(FrameError::LengthMismatch { expected, actual: data.len() });
        }
        Ok(Self { size, data })
    }

    /// A frame filled with a single BGRA colour.
    pub fn solid(width: u32, height: u32, bgra: [u8; 4]) -> Result<Self, FrameError> {
        let pixels = Resolution::new(width, height).total_pixels() as usize;
        let data: Vec<u8> = bgra.iter().copied().cycle().take(pixels * BYTES_PER_PIXEL).collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn size(&self) -> Resolution {
        self.size
    }

    /// Raw BGRA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divided_by_never_reaches_zero() {
        let base = Resolution::new(640, 480);
        assert_eq!(base.divided_by(2), Resolution::new(320, 240));
        assert_eq!(base.divided_by(0), base);
        assert_eq!(Resolution::new(3, 5).divided_by(8), Resolution::new(1, 1));
    }

    #[test]
    fn frame_rejects_wrong_length() {
        let err = Frame::new(2, 2, vec![0u8; 15]).unwrap_err();
        assert!(matches!(err, FrameError::LengthMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn frame_rejects_zero_dimensions() {
        let err = Frame::new(0, 4, Vec::new()).unwrap_err();
        assert!(matches!(err, FrameError::EmptyDimensions { width: 0, height: 4 }));
    }

    #[test]
    fn solid_frame_repeats_pixel() {
        let frame = Frame::solid(3, 1, [1, 2, 3, 4]).unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(frame.size(), Resolution::new(3, 1));
    }
}
