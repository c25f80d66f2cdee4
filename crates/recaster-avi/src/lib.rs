//! recaster-avi — uncompressed AVI container muxing.
//!
//! Turns an ordered run of same-sized BGRA frames into a RIFF/AVI file any
//! AVI-compatible player can open: one `vids`/`DIB ` stream, 32-bit top-down
//! bitmaps, one `00db` chunk per frame and an `idx1` keyframe index.
//!
//! # File layout
//!
//! ```text
//! RIFF 'AVI '
//! ├── LIST 'hdrl'
//! │   ├── avih            main header (µs/frame, frame count, size, HASINDEX)
//! │   └── LIST 'strl'
//! │       ├── strh        stream header (vids, DIB , rate = fps)
//! │       └── strf        BITMAPINFOHEADER (32 bpp, BI_RGB, negative height)
//! ├── LIST 'movi'
//! │   ├── 00db            frame 0 pixels
//! │   ├── 00db            frame 1 pixels
//! │   └── …
//! └── idx1                (00db, KEYFRAME, offset from movi payload, length) × N
//! ```
//!
//! Chunks are streamed out once. Each size field is written as zero when its
//! chunk opens and patched in place when it closes, so nothing is pre-scanned.
//!
//! # Usage
//!
//! ```rust
//! use recaster_core::Frame;
//!
//! let frames = vec![Frame::solid(4, 2, [0, 0, 255, 255])?; 3];
//! let bytes = recaster_avi::mux(&frames, 30)?;
//! let avi = recaster_avi::read_avi(&bytes)?;
//! assert_eq!(avi.frames.len(), 3);
//! assert_eq!(avi.format.height, -2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chunk;
pub mod headers;
mod mux;
pub mod reader;

pub use headers::{BitmapInfoHeader, IndexEntry, MainHeader, StreamHeader};
pub use mux::{mux, write_avi, write_avi_file, MuxSummary};
pub use reader::{read_avi, AviFile, Chunk, ContainerError};

/// Four-character code identifying a chunk or list.
pub type FourCc = [u8; 4];

pub mod fourcc {
    use super::FourCc;

    pub const RIFF: FourCc = *b"RIFF";
    pub const LIST: FourCc = *b"LIST";
    pub const AVI: FourCc = *b"AVI ";
    pub const HDRL: FourCc = *b"hdrl";
    pub const AVIH: FourCc = *b"avih";
    pub const STRL: FourCc = *b"strl";
    pub const STRH: FourCc = *b"strh";
    pub const STRF: FourCc = *b"strf";
    pub const MOVI: FourCc = *b"movi";
    pub const IDX1: FourCc = *b"idx1";
    /// Uncompressed video frame of stream 0.
    pub const FRAME: FourCc = *b"00db";
    pub const VIDS: FourCc = *b"vids";
    pub const DIB: FourCc = *b"DIB ";

    /// Printable form for logs and errors.
    pub fn display(id: &FourCc) -> String {
        String::from_utf8_lossy(id).into_owned()
    }
}
