use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use recaster_core::{Frame, MuxError, Resolution};
use tracing::{debug, info, warn};

use crate::chunk::ChunkWriter;
use crate::fourcc::{AVI, AVIH, DIB, FRAME, HDRL, IDX1, MOVI, RIFF, STRF, STRH, STRL, VIDS};
use crate::headers::{
    BitmapInfoHeader, IndexEntry, MainHeader, StreamHeader, AVIF_HASINDEX, AVIIF_KEYFRAME,
};

/// Bytes before the first `movi` payload byte: RIFF/AVI, hdrl with its three
/// header chunks, and the movi list header.
const HEADER_OVERHEAD: u64 = 12 + (12 + 8 + 56 + 12 + 8 + 56 + 8 + 40) + 12;

/// What a mux call wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxSummary {
    pub size: Resolution,
    pub frames_written: u32,
    /// Frames dropped because their dimensions differ from the first frame.
    pub frames_skipped: usize,
    pub bytes: u64,
}

/// The frames that will be emitted, decided before any byte is written.
struct Plan<'a> {
    size: Resolution,
    frame_size: u32,
    frames: Vec<&'a Frame>,
    skipped: usize,
}

impl<'a> Plan<'a> {
    fn new(frames: &'a [Frame]) -> Result<Self, MuxError> {
        let first = frames.first().ok_or(MuxError::NoFrames)?;
        let size = first.size();
        let invalid = || MuxError::InvalidFrameSize { width: size.width, height: size.height };
        if size.is_empty() {
            return Err(invalid());
        }
        let frame_size = u32::try_from(size.frame_len()).map_err(|_| invalid())?;

        let kept: Vec<&Frame> = frames
            .iter()
            .filter(|f| f.size() == size && f.data().len() == frame_size as usize)
            .collect();
        let skipped = frames.len() - kept.len();
        if skipped > 0 {
            debug!("Skipping {} frame(s) not matching {}", skipped, size);
        }

        let count = kept.len() as u64;
        let total = HEADER_OVERHEAD + count * (8 + frame_size as u64) + 8 + count * IndexEntry::LEN as u64;
        if total - 8 > u32::MAX as u64 {
            return Err(MuxError::TooLarge { bytes: total });
        }

        Ok(Self { size, frame_size, frames: kept, skipped })
    }

    fn count(&self) -> u32 {
        // Bounded by the RIFF size check above.
        self.frames.len() as u32
    }

    fn main_header(&self, fps: u32) -> MainHeader {
        MainHeader {
            micro_sec_per_frame: 1_000_000 / fps,
            max_bytes_per_sec: self.frame_size.saturating_mul(fps),
            padding_granularity: 0,
            flags: AVIF_HASINDEX,
            total_frames: self.count(),
            initial_frames: 0,
            streams: 1,
            suggested_buffer_size: self.frame_size,
            width: self.size.width,
            height: self.size.height,
        }
    }

    fn stream_header(&self, fps: u32) -> StreamHeader {
        let clip = |v: u32| v.min(u16::MAX as u32) as u16;
        StreamHeader {
            fcc_type: VIDS,
            fcc_handler: DIB,
            flags: 0,
            priority: 0,
            language: 0,
            initial_frames: 0,
            scale: 1,
            rate: fps,
            start: 0,
            length: self.count(),
            suggested_buffer_size: self.frame_size,
            quality: u32::MAX,
            sample_size: 0,
            frame: [0, 0, clip(self.size.width), clip(self.size.height)],
        }
    }

    fn format(&self) -> BitmapInfoHeader {
        BitmapInfoHeader {
            size_image: self.frame_size,
            ..BitmapInfoHeader::bgra32_top_down(self.size.width, self.size.height)
        }
    }
}

/// Mux `frames` at `fps` into an in-memory AVI file.
pub fn mux(frames: &[Frame], fps: u32) -> Result<Vec<u8>, MuxError> {
    let mut out = Cursor::new(Vec::new());
    write_avi(&mut out, frames, fps)?;
    Ok(out.into_inner())
}

/// Mux `frames` into a new file at `path`, replacing any existing file.
///
/// Input is validated before the file is created, so an empty or invalid
/// frame list never leaves a file behind. A write that fails part way
/// removes the partial file.
pub fn write_avi_file(path: &Path, frames: &[Frame], fps: u32) -> Result<MuxSummary, MuxError> {
    let plan = Plan::new(frames)?;

    let file = File::create(path).map_err(|source| MuxError::Open { path: path.to_path_buf(), source })?;
    let summary = remove_on_error(path, || {
        let mut out = BufWriter::new(file);
        let summary = write_planned(&mut out, &plan, fps)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(summary)
    })?;

    info!(
        "Wrote {} ({} frames, {}, {} bytes)",
        path.display(),
        summary.frames_written,
        summary.size,
        summary.bytes
    );
    Ok(summary)
}

fn remove_on_error<T>(path: &Path, write: impl FnOnce() -> Result<T, MuxError>) -> Result<T, MuxError> {
    let result = write();
    if let Err(e) = &result {
        warn!("Removing partial {} after failed write: {}", path.display(), e);
        if let Err(rm) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), rm);
        }
    }
    result
}

/// Mux `frames` into any seekable sink, starting at its current position.
///
/// Frames whose dimensions differ from the first frame are skipped.
/// `fps` below 1 is treated as 1.
pub fn write_avi<W: Write + Seek>(out: W, frames: &[Frame], fps: u32) -> Result<MuxSummary, MuxError> {
    write_planned(out, &Plan::new(frames)?, fps)
}

fn write_planned<W: Write + Seek>(out: W, plan: &Plan<'_>, fps: u32) -> Result<MuxSummary, MuxError> {
    let fps = fps.max(1);

    let mut w = ChunkWriter::new(out)?;
    let start = w.position();

    let riff = w.begin_chunk(&RIFF)?;
    w.write_fourcc(&AVI)?;

    let hdrl = w.begin_list(&HDRL)?;
    w.write_chunk(&AVIH, &plan.main_header(fps).to_bytes())?;
    let strl = w.begin_list(&STRL)?;
    w.write_chunk(&STRH, &plan.stream_header(fps).to_bytes())?;
    w.write_chunk(&STRF, &plan.format().to_bytes())?;
    w.end_chunk(strl)?;
    w.end_chunk(hdrl)?;

    let movi = w.begin_list(&MOVI)?;
    let movi_start = w.position();
    let mut index = Vec::with_capacity(plan.frames.len());
    for frame in &plan.frames {
        let offset = w.position() - movi_start;
        let size = w.write_chunk(&FRAME, frame.data())?;
        index.push(IndexEntry {
            chunk_id: FRAME,
            flags: AVIIF_KEYFRAME,
            offset: offset as u32,
            size,
        });
    }
    w.end_chunk(movi)?;

    let mut idx1 = Vec::with_capacity(index.len() * IndexEntry::LEN);
    for entry in &index {
        entry.write_to(&mut idx1);
    }
    w.write_chunk(&IDX1, &idx1)?;

    w.end_chunk(riff)?;
    w.flush()?;

    Ok(MuxSummary {
        size: plan.size,
        frames_written: plan.count(),
        frames_skipped: plan.skipped,
        bytes: w.position() - start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{chunks, read_avi};
    use crate::fourcc::LIST;

    fn frame(width: u32, height: u32, seed: u8) -> Frame {
        let data: Vec<u8> = (0..width * height * 4).map(|i| (i as u8).wrapping_add(seed)).collect();
        Frame::new(width, height, data).unwrap()
    }

    /// Recursively check that every chunk's size field equals the bytes that
    /// follow it and that odd payloads carry exactly one zero pad byte.
    fn assert_sizes_consistent(region: &[u8]) {
        let mut cursor = 0;
        while cursor < region.len() {
            let declared = u32::from_le_bytes(region[cursor + 4..cursor + 8].try_into().unwrap()) as usize;
            let payload_start = cursor + 8;
            let payload_end = payload_start + declared;
            assert!(payload_end <= region.len(), "chunk at {cursor} overruns its parent");
            if &region[cursor..cursor + 4] == b"LIST" || &region[cursor..cursor + 4] == b"RIFF" {
                assert_sizes_consistent(&region[payload_start + 4..payload_end]);
            }
            cursor = payload_end;
            if declared % 2 == 1 {
                assert_eq!(region[cursor], 0, "pad byte must be zero");
                cursor += 1;
            }
        }
        assert_eq!(cursor, region.len(), "children must exactly fill their parent");
    }

    #[test]
    fn round_trip_preserves_every_frame() {
        let frames: Vec<Frame> = (0..5).map(|i| frame(6, 3, i * 17)).collect();
        let bytes = mux(&frames, 30).unwrap();
        let avi = read_avi(&bytes).unwrap();

        assert_eq!(avi.frames.len(), 5);
        for (got, want) in avi.frames.iter().zip(&frames) {
            assert_eq!(*got, want.data());
        }
        assert_eq!(avi.index.len(), 5);
    }

    #[test]
    fn header_fields_follow_fps_and_size() {
        let frames = vec![frame(320, 240, 0); 30];
        let bytes = mux(&frames, 10).unwrap();
        let avi = read_avi(&bytes).unwrap();

        let frame_size = 320 * 240 * 4;
        assert_eq!(avi.main_header.micro_sec_per_frame, 100_000);
        assert_eq!(avi.main_header.max_bytes_per_sec, frame_size * 10);
        assert_eq!(avi.main_header.flags, AVIF_HASINDEX);
        assert_eq!(avi.main_header.total_frames, 30);
        assert_eq!(avi.main_header.streams, 1);
        assert_eq!(avi.main_header.suggested_buffer_size, frame_size);
        assert_eq!((avi.main_header.width, avi.main_header.height), (320, 240));

        assert_eq!(&avi.stream_header.fcc_type, b"vids");
        assert_eq!(&avi.stream_header.fcc_handler, b"DIB ");
        assert_eq!(avi.stream_header.scale, 1);
        assert_eq!(avi.stream_header.rate, 10);
        assert_eq!(avi.stream_header.length, 30);
        assert_eq!(avi.stream_header.quality, u32::MAX);
        assert_eq!(avi.stream_header.sample_size, 0);
        assert_eq!(avi.stream_header.frame, [0, 0, 320, 240]);

        assert_eq!(avi.format.size, 40);
        assert_eq!(avi.format.width, 320);
        assert_eq!(avi.format.height, -240);
        assert_eq!(avi.format.bit_count, 32);
        assert_eq!(avi.format.compression, 0);
        assert_eq!(avi.format.size_image, frame_size);
    }

    #[test]
    fn every_size_field_matches_its_payload() {
        let frames: Vec<Frame> = (0..3).map(|i| frame(5, 1, i)).collect();
        let bytes = mux(&frames, 25).unwrap();

        assert_eq!(&bytes[..4], b"RIFF");
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        assert_eq!(riff_size, bytes.len() - 8);
        assert_sizes_consistent(&bytes);
    }

    #[test]
    fn index_offsets_point_at_frame_chunks() {
        let frames: Vec<Frame> = (0..4).map(|i| frame(2, 2, i)).collect();
        let bytes = mux(&frames, 30).unwrap();
        let avi = read_avi(&bytes).unwrap();

        for (i, entry) in avi.index.iter().enumerate() {
            assert_eq!(&entry.chunk_id, b"00db");
            assert!(entry.is_keyframe());
            assert_eq!(entry.size, 16);
            assert_eq!(entry.offset as usize, i * (8 + 16));
            let at = avi.movi_start + entry.offset as usize;
            assert_eq!(&bytes[at..at + 4], b"00db");
        }
    }

    #[test]
    fn mismatched_frames_are_excluded_from_chunks_and_index() {
        let frames = vec![frame(4, 4, 1), frame(8, 8, 2), frame(4, 4, 3), frame(2, 2, 4)];
        let mut out = Cursor::new(Vec::new());
        let summary = write_avi(&mut out, &frames, 30).unwrap();
        assert_eq!(summary.frames_written, 2);
        assert_eq!(summary.frames_skipped, 2);

        let bytes = out.into_inner();
        let avi = read_avi(&bytes).unwrap();
        assert_eq!(avi.frames.len(), 2);
        assert_eq!(avi.index.len(), 2);
        assert_eq!(avi.main_header.total_frames, 2);
        assert_eq!(avi.frames[1], frames[2].data());
    }

    #[test]
    fn all_but_first_mismatched_still_yields_one_frame() {
        let frames = vec![frame(3, 3, 0), frame(4, 3, 0), frame(3, 4, 0)];
        let avi_bytes = mux(&frames, 5).unwrap();
        let avi = read_avi(&avi_bytes).unwrap();
        assert_eq!(avi.frames.len(), 1);
        assert_eq!(avi.main_header.total_frames, 1);
        assert_sizes_consistent(&avi_bytes);
    }

    #[test]
    fn empty_input_fails_without_creating_a_file() {
        assert!(matches!(mux(&[], 30), Err(MuxError::NoFrames)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.avi");
        assert!(matches!(write_avi_file(&path, &[], 30), Err(MuxError::NoFrames)));
        assert!(!path.exists());
    }

    #[test]
    fn zero_fps_is_treated_as_one() {
        let bytes = mux(&[frame(1, 1, 0)], 0).unwrap();
        let avi = read_avi(&bytes).unwrap();
        assert_eq!(avi.main_header.micro_sec_per_frame, 1_000_000);
        assert_eq!(avi.stream_header.rate, 1);
    }

    #[test]
    fn writes_file_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        let frames = vec![frame(8, 6, 9); 3];
        let summary = write_avi_file(&path, &frames, 15).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, summary.bytes);
        assert_eq!(bytes, mux(&frames, 15).unwrap());
    }

    #[test]
    fn unopenable_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("clip.avi");
        let err = write_avi_file(&path, &[frame(1, 1, 0)], 30).unwrap_err();
        assert!(matches!(err, MuxError::Open { .. }));
    }

    /// Sink that accepts writes but fails to flush, like a full disk.
    struct FlushFails(Cursor<Vec<u8>>);

    impl Write for FlushFails {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"))
        }
    }

    impl Seek for FlushFails {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.0.seek(pos)
        }
    }

    #[test]
    fn flush_failure_is_reported() {
        let err = write_avi(FlushFails(Cursor::new(Vec::new())), &[frame(2, 2, 0)], 30).unwrap_err();
        assert!(matches!(err, MuxError::Io(ref e) if e.to_string().contains("no space")));
    }

    #[test]
    fn failed_write_removes_the_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.avi");
        std::fs::write(&path, b"RIFF").unwrap();

        let frames = [frame(2, 2, 0)];
        let plan = Plan::new(&frames).unwrap();
        let result = remove_on_error(&path, || {
            write_planned(FlushFails(Cursor::new(Vec::new())), &plan, 30)
        });
        assert!(matches!(result, Err(MuxError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn successful_write_keeps_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept.avi");
        std::fs::write(&path, b"RIFF").unwrap();
        let kept = remove_on_error(&path, || Ok(7)).unwrap();
        assert_eq!(kept, 7);
        assert!(path.exists());
    }

    #[test]
    fn top_level_layout() {
        let bytes = mux(&[frame(2, 1, 0)], 30).unwrap();
        let top: Vec<_> = chunks(&bytes[12..]).map(|c| c.unwrap()).collect();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].id, LIST);
        assert_eq!(&top[0].payload[..4], b"hdrl");
        assert_eq!(top[1].id, LIST);
        assert_eq!(&top[1].payload[..4], b"movi");
        assert_eq!(&top[2].id, b"idx1");
        assert_eq!(top[2].payload.len(), IndexEntry::LEN);
    }
}
