use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a session's capture counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    /// Capture attempts made.
    pub ticks: u64,
    /// Frames appended to the buffer.
    pub frames_stored: u64,
    /// Frames discarded for not matching the session's frame size.
    pub frames_dropped: u64,
    /// Ticks where the source produced no frame.
    pub capture_failures: u64,
}

impl std::fmt::Display for RecordingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ticks, {} stored, {} dropped, {} failed",
            self.ticks, self.frames_stored, self.frames_dropped, self.capture_failures
        )
    }
}

/// Live counters shared with the capture thread.
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    ticks: AtomicU64,
    stored: AtomicU64,
    dropped: AtomicU64,
    failures: AtomicU64,
}

impl SessionCounters {
    pub(crate) fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RecordingStats {
        RecordingStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_stored: self.stored.load(Ordering::Relaxed),
            frames_dropped: self.dropped.load(Ordering::Relaxed),
            capture_failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
