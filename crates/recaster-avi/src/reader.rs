//! Reading back RIFF/AVI files.
//!
//! Understands the single-stream uncompressed layout this crate writes. Every
//! chunk's declared size is checked against its enclosing chunk, and every
//! `idx1` entry must resolve to a frame chunk of the stated length.

use thiserror::Error;

use crate::fourcc::{self, AVI, AVIH, FRAME, HDRL, IDX1, LIST, MOVI, RIFF, STRF, STRH, STRL};
use crate::headers::{BitmapInfoHeader, IndexEntry, MainHeader, StreamHeader};
use crate::FourCc;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Not a RIFF file")]
    NotRiff,

    #[error("RIFF form is '{0}', expected 'AVI '")]
    NotAvi(String),

    #[error("Chunk '{id}' at byte {offset} declares {declared} bytes, only {available} available")]
    Truncated { id: String, offset: usize, declared: usize, available: usize },

    #[error("Missing '{0}' chunk")]
    MissingChunk(&'static str),

    #[error("Malformed '{0}' header")]
    BadHeader(&'static str),

    #[error("Index entry {entry} does not point at a matching frame chunk")]
    BadIndex { entry: usize },
}

/// One chunk inside a byte region.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub id: FourCc,
    /// Offset of the chunk header within the scanned region.
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// For `LIST` chunks, the list type and the child region.
    pub fn as_list(&self) -> Option<(FourCc, &'a [u8])> {
        if self.id != LIST || self.payload.len() < 4 {
            return None;
        }
        let (kind, children) = self.payload.split_at(4);
        Some((kind.try_into().ok()?, children))
    }
}

/// Iterate sibling chunks in `region`, skipping pad bytes after odd payloads.
pub fn chunks(region: &[u8]) -> Chunks<'_> {
    Chunks { region, cursor: 0, failed: false }
}

pub struct Chunks<'a> {
    region: &'a [u8],
    cursor: usize,
    failed: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor + 8 > self.region.len() {
            return None;
        }
        let offset = self.cursor;
        let header = &self.region[offset..offset + 8];
        let id: FourCc = [header[0], header[1], header[2], header[3]];
        let declared = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let start = offset + 8;
        let available = self.region.len() - start;
        if declared > available {
            self.failed = true;
            return Some(Err(ContainerError::Truncated {
                id: fourcc::display(&id),
                offset,
                declared,
                available,
            }));
        }

        self.cursor = start + declared + (declared & 1);
        Some(Ok(Chunk { id, offset, payload: &self.region[start..start + declared] }))
    }
}

/// A parsed AVI file borrowing its frame payloads from the input bytes.
#[derive(Debug)]
pub struct AviFile<'a> {
    pub main_header: MainHeader,
    pub stream_header: StreamHeader,
    pub format: BitmapInfoHeader,
    /// Frame chunk payloads in file order.
    pub frames: Vec<&'a [u8]>,
    pub index: Vec<IndexEntry>,
    /// Absolute offset of the first byte after the `movi` list tag.
    pub movi_start: usize,
}

/// Parse an AVI file written by [`crate::mux`].
pub fn read_avi(data: &[u8]) -> Result<AviFile<'_>, ContainerError> {
    if data.len() < 12 || data[..4] != RIFF {
        return Err(ContainerError::NotRiff);
    }
    let riff = chunks(data).next().ok_or(ContainerError::NotRiff)??;
    if riff.payload.len() < 4 {
        return Err(ContainerError::NotRiff);
    }
    let (form, body) = riff.payload.split_at(4);
    if form != AVI.as_slice() {
        return Err(ContainerError::NotAvi(String::from_utf8_lossy(form).into_owned()));
    }
    // Absolute offset of `body` inside `data`.
    let body_base = riff.offset + 12;

    let mut headers = None;
    let mut movi = None;
    let mut index = None;

    for chunk in chunks(body) {
        let chunk = chunk?;
        match chunk.as_list() {
            Some((kind, children)) if kind == HDRL => headers = Some(parse_hdrl(children)?),
            Some((kind, children)) if kind == MOVI => {
                movi = Some((body_base + chunk.offset + 12, children));
            }
            _ if chunk.id == IDX1 => {
                let entries = chunk
                    .payload
                    .chunks_exact(IndexEntry::LEN)
                    .filter_map(IndexEntry::parse)
                    .collect::<Vec<_>>();
                index = Some(entries);
            }
            _ => {}
        }
    }

    let (main_header, stream_header, format) = headers.ok_or(ContainerError::MissingChunk("hdrl"))?;
    let (movi_start, movi_children) = movi.ok_or(ContainerError::MissingChunk("movi"))?;
    let index = index.ok_or(ContainerError::MissingChunk("idx1"))?;

    let mut frames = Vec::new();
    for chunk in chunks(movi_children) {
        let chunk = chunk?;
        if chunk.id == FRAME {
            frames.push(chunk.payload);
        }
    }

    for (i, entry) in index.iter().enumerate() {
        let at = entry.offset as usize;
        let hit = chunks(movi_children.get(at..).unwrap_or_default())
            .next()
            .and_then(Result::ok)
            .filter(|c| c.id == entry.chunk_id && c.payload.len() == entry.size as usize);
        if hit.is_none() {
            return Err(ContainerError::BadIndex { entry: i });
        }
    }

    Ok(AviFile { main_header, stream_header, format, frames, index, movi_start })
}

fn parse_hdrl(region: &[u8]) -> Result<(MainHeader, StreamHeader, BitmapInfoHeader), ContainerError> {
    let mut main = None;
    let mut stream = None;
    let mut format = None;

    for chunk in chunks(region) {
        let chunk = chunk?;
        if chunk.id == AVIH {
            main = Some(MainHeader::parse(chunk.payload).ok_or(ContainerError::BadHeader("avih"))?);
        } else if let Some((kind, children)) = chunk.as_list() {
            if kind != STRL {
                continue;
            }
            for inner in chunks(children) {
                let inner = inner?;
                if inner.id == STRH {
                    stream = Some(StreamHeader::parse(inner.payload).ok_or(ContainerError::BadHeader("strh"))?);
                } else if inner.id == STRF {
                    format = Some(BitmapInfoHeader::parse(inner.payload).ok_or(ContainerError::BadHeader("strf"))?);
                }
            }
        }
    }

    Ok((
        main.ok_or(ContainerError::MissingChunk("avih"))?,
        stream.ok_or(ContainerError::MissingChunk("strh"))?,
        format.ok_or(ContainerError::MissingChunk("strf"))?,
    ))
}

impl AviFile<'_> {
    /// Frames per second declared by the stream header.
    pub fn fps(&self) -> f64 {
        if self.stream_header.scale == 0 {
            return 0.0;
        }
        self.stream_header.rate as f64 / self.stream_header.scale as f64
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        let fps = self.fps();
        if fps == 0.0 {
            0.0
        } else {
            self.frames.len() as f64 / fps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux;
    use recaster_core::Frame;

    #[test]
    fn rejects_non_riff_input() {
        assert!(matches!(read_avi(b"JUNKJUNKJUNK"), Err(ContainerError::NotRiff)));
        assert!(matches!(read_avi(b""), Err(ContainerError::NotRiff)));
    }

    #[test]
    fn rejects_other_riff_forms() {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        assert!(matches!(read_avi(&wav), Err(ContainerError::NotAvi(form)) if form == "WAVE"));
    }

    #[test]
    fn truncated_file_is_detected() {
        let bytes = mux(&[Frame::solid(4, 4, [1, 2, 3, 4]).unwrap()], 30).unwrap();
        let cut = &bytes[..bytes.len() - 10];
        assert!(matches!(read_avi(cut), Err(ContainerError::Truncated { .. })));
    }

    #[test]
    fn corrupted_index_is_detected() {
        let mut bytes = mux(&vec![Frame::solid(2, 2, [0; 4]).unwrap(); 2], 30).unwrap();
        // Second idx1 entry's offset field: last 16-byte record, bytes 8..12.
        let at = bytes.len() - 8;
        bytes[at..at + 4].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(read_avi(&bytes), Err(ContainerError::BadIndex { entry: 1 })));
    }

    #[test]
    fn reports_rate_and_duration() {
        let bytes = mux(&vec![Frame::solid(2, 2, [0; 4]).unwrap(); 20], 10).unwrap();
        let avi = read_avi(&bytes).unwrap();
        assert_eq!(avi.fps(), 10.0);
        assert_eq!(avi.duration_secs(), 2.0);
    }
}
