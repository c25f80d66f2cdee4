//! recaster-recorder — the recording session.
//!
//! ```text
//! Recorder::start ──► CaptureWorker thread
//!                        │  every max(1, 1000/fps) ms
//!                        ▼
//!                FrameCaptureSource::capture(capture_size)
//!                        │  Ok(frame)           Err(_) → skipped, counted
//!                        ▼
//!                  FrameBuffer::append  (mismatched sizes dropped)
//!
//! Recorder::stop ──► wake + join worker ──► FrameBuffer::drain
//!                                              │
//!                                              ▼
//!                                recaster_avi::write_avi_file(output_path)
//! ```
//!
//! One session at a time. `stop` on an idle recorder is a successful no-op,
//! and dropping a recorder mid-session finalizes the file.

pub mod buffer;
mod recorder;
pub mod stats;
mod worker;

pub use buffer::{Append, FrameBuffer};
pub use recorder::{Recorder, SessionInfo};
pub use stats::RecordingStats;
