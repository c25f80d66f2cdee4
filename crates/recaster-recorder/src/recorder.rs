use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use recaster_capture::FrameCaptureSource;
use recaster_core::{RecasterError, RecordingOptions, RecordingSettings, Resolution};
use tracing::{error, info, warn};

use crate::buffer::FrameBuffer;
use crate::stats::{RecordingStats, SessionCounters};
use crate::worker::{CaptureJob, CaptureWorker};

/// What a successful [`Recorder::start`] set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub output_path: PathBuf,
    pub fps: u32,
    /// Dimensions every captured frame is requested at.
    pub capture_size: Resolution,
}

struct ActiveSession {
    settings: RecordingSettings,
    capture_size: Resolution,
    buffer: Arc<FrameBuffer>,
    counters: Arc<SessionCounters>,
    worker: CaptureWorker,
    started_at: Instant,
}

/// Records one capture source into AVI files, one session at a time.
///
/// States are Idle and Recording. `start` moves Idle → Recording, `stop`
/// moves Recording → Idle and writes the file. Dropping a recording
/// `Recorder` stops it the same way `stop` does.
pub struct Recorder {
    source: Arc<dyn FrameCaptureSource>,
    session: Mutex<Option<ActiveSession>>,
    recording: AtomicBool,
}

impl Recorder {
    pub fn new(source: Arc<dyn FrameCaptureSource>) -> Self {
        Self { source, session: Mutex::new(None), recording: AtomicBool::new(false) }
    }

    /// Begin capturing into a fresh buffer.
    ///
    /// Fails with `AlreadyRecording` before looking at `options` if a session
    /// is active; that session is left untouched.
    pub fn start(&self, options: &RecordingOptions) -> Result<SessionInfo, RecasterError> {
        let mut session = self.lock();
        if session.is_some() {
            return Err(RecasterError::AlreadyRecording);
        }

        let settings = RecordingSettings::from_options(options)?;
        let surface = self
            .source
            .surface_size()
            .map_err(|e| RecasterError::TargetUnavailable { reason: format!("{e:#}") })?;
        if surface.is_empty() {
            return Err(RecasterError::InvalidWindowSize {
                width: surface.width,
                height: surface.height,
            });
        }
        let capture_size = settings.capture_size(surface);

        let buffer = Arc::new(FrameBuffer::new());
        let counters = Arc::new(SessionCounters::default());
        let worker = CaptureWorker::spawn(CaptureJob {
            source: Arc::clone(&self.source),
            capture_size,
            interval: settings.frame_interval(),
            buffer: Arc::clone(&buffer),
            counters: Arc::clone(&counters),
        })
        .map_err(RecasterError::CaptureThread)?;

        info!(
            "Recording started: {} at {} fps, surface {} captured at {}",
            settings.output_path.display(),
            settings.fps,
            surface,
            capture_size
        );

        let info = SessionInfo {
            output_path: settings.output_path.clone(),
            fps: settings.fps,
            capture_size,
        };
        *session = Some(ActiveSession {
            settings,
            capture_size,
            buffer,
            counters,
            worker,
            started_at: Instant::now(),
        });
        self.recording.store(true, Ordering::SeqCst);
        Ok(info)
    }

    /// Stop capturing and write the buffered frames.
    ///
    /// Returns `Ok(None)` when idle. Blocks until the capture thread has
    /// exited, so no frame is appended after the buffer is drained. The
    /// recorder is Idle afterwards whether or not the file was written.
    pub fn stop(&self) -> Result<Option<PathBuf>, RecasterError> {
        let mut session = self.lock();
        let Some(active) = session.take() else {
            return Ok(None);
        };
        self.recording.store(false, Ordering::SeqCst);

        active.worker.stop();
        let frames = active.buffer.drain();
        let stats = active.counters.snapshot();
        info!(
            "Capture stopped after {:.1}s: {}",
            active.started_at.elapsed().as_secs_f64(),
            stats
        );

        if frames.is_empty() {
            warn!("No frames captured; {} not written", active.settings.output_path.display());
            return Err(RecasterError::NoFramesCaptured);
        }

        let path = active.settings.output_path;
        let summary = recaster_avi::write_avi_file(&path, &frames, active.settings.fps)?;
        info!(
            "Recording saved: {} ({} frames at {}, {} bytes)",
            path.display(),
            summary.frames_written,
            summary.size,
            summary.bytes
        );
        Ok(Some(path))
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Counters of the active session.
    pub fn stats(&self) -> Option<RecordingStats> {
        self.lock().as_ref().map(|s| s.counters.snapshot())
    }

    /// Frame size of the active session.
    pub fn capture_size(&self) -> Option<Resolution> {
        self.lock().as_ref().map(|s| s.capture_size)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if !self.is_recording() {
            return;
        }
        warn!("Recorder dropped while recording; finalizing");
        if let Err(e) = self.stop() {
            error!("Failed to finalize recording on shutdown: {}", e);
        }
    }
}
