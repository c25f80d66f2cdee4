//! Pixel conversion shared by capture backends.
//!
//! Host toolkits hand back pixels in whatever layout they like, with row
//! padding. Recording wants tightly packed BGRA, top row first.

use anyhow::{ensure, Result};
use recaster_core::{Frame, Resolution, BYTES_PER_PIXEL};

/// Channel layout of a packed source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra,
    /// 4 bytes per pixel: Blue, Green, Red, unused.
    Bgrx,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba | Self::Bgra | Self::Bgrx => 4,
        }
    }
}

/// Convert a row-strided source buffer into a packed BGRA [`Frame`].
///
/// `stride` is the distance in bytes between the starts of consecutive rows.
/// Sources without alpha get an opaque alpha channel.
pub fn to_bgra(src: &[u8], size: Resolution, stride: usize, layout: PixelLayout) -> Result<Frame> {
    ensure!(!size.is_empty(), "surface has empty dimensions {size}");

    let width = size.width as usize;
    let height = size.height as usize;
    let channels = layout.channels();
    let row_bytes = width * channels;
    ensure!(stride >= row_bytes, "stride {stride} shorter than a {row_bytes}-byte row");

    let needed = stride * (height - 1) + row_bytes;
    ensure!(src.len() >= needed, "source holds {} bytes, geometry needs {needed}", src.len());

    let mut out = Vec::with_capacity(width * height * BYTES_PER_PIXEL);
    for row in src.chunks(stride).take(height) {
        for px in row[..row_bytes].chunks_exact(channels) {
            let bgra = match layout {
                PixelLayout::Rgb => [px[2], px[1], px[0], 255],
                PixelLayout::Rgba => [px[2], px[1], px[0], px[3]],
                PixelLayout::Bgra => [px[0], px[1], px[2], px[3]],
                PixelLayout::Bgrx => [px[0], px[1], px[2], 255],
            };
            out.extend_from_slice(&bgra);
        }
    }

    Ok(Frame::new(size.width, size.height, out)?)
}

/// Nearest-neighbour rescale of a BGRA frame.
pub fn scale_nearest(frame: &Frame, target: Resolution) -> Result<Frame> {
    ensure!(!target.is_empty(), "scale target has empty dimensions {target}");
    if frame.size() == target {
        return Ok(frame.clone());
    }

    let (src_w, src_h) = (frame.width() as u64, frame.height() as u64);
    let (dst_w, dst_h) = (target.width as u64, target.height as u64);
    let src = frame.data();

    let mut out = Vec::with_capacity(target.frame_len() as usize);
    for y in 0..dst_h {
        let sy = y * src_h / dst_h;
        let row = (sy * src_w) as usize * BYTES_PER_PIXEL;
        for x in 0..dst_w {
            let sx = (x * src_w / dst_w) as usize;
            let at = row + sx * BYTES_PER_PIXEL;
            out.extend_from_slice(&src[at..at + BYTES_PER_PIXEL]);
        }
    }

    Ok(Frame::new(target.width, target.height, out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_rows_with_padding_become_bgra() {
        // 2×2 RGB with a 2-byte pad at the end of each row.
        let src = [
            10, 20, 30, 40, 50, 60, 0, 0, //
            70, 80, 90, 1, 2, 3, 0, 0,
        ];
        let frame = to_bgra(&src, Resolution::new(2, 2), 8, PixelLayout::Rgb).unwrap();
        assert_eq!(
            frame.data(),
            &[30, 20, 10, 255, 60, 50, 40, 255, 90, 80, 70, 255, 3, 2, 1, 255]
        );
    }

    #[test]
    fn rgba_keeps_alpha_and_bgrx_is_opaque() {
        let rgba = to_bgra(&[1, 2, 3, 4], Resolution::new(1, 1), 4, PixelLayout::Rgba).unwrap();
        assert_eq!(rgba.data(), &[3, 2, 1, 4]);

        let bgrx = to_bgra(&[1, 2, 3, 0], Resolution::new(1, 1), 4, PixelLayout::Bgrx).unwrap();
        assert_eq!(bgrx.data(), &[1, 2, 3, 255]);
    }

    #[test]
    fn short_source_is_rejected() {
        let err = to_bgra(&[0; 10], Resolution::new(2, 2), 6, PixelLayout::Rgb);
        assert!(err.is_err());
        let err = to_bgra(&[0; 64], Resolution::new(4, 1), 8, PixelLayout::Rgba);
        assert!(err.is_err(), "stride shorter than a row must fail");
    }

    #[test]
    fn halving_picks_top_left_of_each_block() {
        // 4×2 frame where pixel value = column index.
        let mut data = Vec::new();
        for _ in 0..2 {
            for x in 0..4u8 {
                data.extend_from_slice(&[x, x, x, 255]);
            }
        }
        let frame = Frame::new(4, 2, data).unwrap();
        let half = scale_nearest(&frame, Resolution::new(2, 1)).unwrap();
        assert_eq!(half.data(), &[0, 0, 0, 255, 2, 2, 2, 255]);
    }

    #[test]
    fn same_size_scale_is_identity() {
        let frame = Frame::solid(3, 3, [9, 8, 7, 6]).unwrap();
        assert_eq!(scale_nearest(&frame, frame.size()).unwrap(), frame);
    }
}
