//! Captured frames awaiting the muxer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use recaster_core::{Frame, Resolution};

/// Result of [`FrameBuffer::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Stored,
    /// The frame's size differs from the first stored frame; it was discarded.
    Dropped { expected: Resolution, got: Resolution },
}

/// Ordered, append-only frame store shared between the capture thread and
/// the control side.
///
/// Every stored frame has the size of the first one. Appends and drains are
/// serialized by one lock, and frames are moved in and out whole, so a drain
/// sees each append either entirely or not at all.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Mutex<Vec<Frame>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, frame: Frame) -> Append {
        let mut frames = self.lock();
        if let Some(first) = frames.first() {
            if first.size() != frame.size() {
                return Append::Dropped { expected: first.size(), got: frame.size() };
            }
        }
        frames.push(frame);
        Append::Stored
    }

    /// Remove and return everything stored, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Size every stored frame shares, if any frame is stored.
    pub fn frame_size(&self) -> Option<Resolution> {
        self.lock().first().map(Frame::size)
    }

    // A panicking appender cannot leave a half-pushed frame behind.
    fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    /// 1×1 frame whose pixel encodes `id`.
    fn tagged(id: u32) -> Frame {
        Frame::new(1, 1, id.to_le_bytes().to_vec()).unwrap()
    }

    fn tag(frame: &Frame) -> u32 {
        u32::from_le_bytes(frame.data().try_into().unwrap())
    }

    #[test]
    fn keeps_capture_order() {
        let buffer = FrameBuffer::new();
        for id in 0..5 {
            assert_eq!(buffer.append(tagged(id)), Append::Stored);
        }
        let ids: Vec<u32> = buffer.drain().iter().map(tag).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn mismatched_frames_are_dropped() {
        let buffer = FrameBuffer::new();
        buffer.append(Frame::solid(4, 4, [0; 4]).unwrap());
        let outcome = buffer.append(Frame::solid(8, 8, [0; 4]).unwrap());
        assert_eq!(
            outcome,
            Append::Dropped { expected: Resolution::new(4, 4), got: Resolution::new(8, 8) }
        );
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.frame_size(), Some(Resolution::new(4, 4)));
    }

    #[test]
    fn drain_empties_the_buffer() {
        let buffer = FrameBuffer::new();
        buffer.append(tagged(1));
        assert_eq!(buffer.drain().len(), 1);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn concurrent_drains_lose_and_duplicate_nothing() {
        const WRITERS: u32 = 4;
        const PER_WRITER: u32 = 500;

        let buffer = Arc::new(FrameBuffer::new());
        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        buffer.append(tagged(w * PER_WRITER + i));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        while writers.iter().any(|h| !h.is_finished()) {
            seen.extend(buffer.drain().iter().map(tag));
        }
        for handle in writers {
            handle.join().unwrap();
        }
        seen.extend(buffer.drain().iter().map(tag));

        let unique: HashSet<u32> = seen.iter().copied().collect();
        assert_eq!(seen.len(), (WRITERS * PER_WRITER) as usize);
        assert_eq!(unique.len(), seen.len());
    }
}
