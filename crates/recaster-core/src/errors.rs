use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecasterError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Screen recording is already running.")]
    AlreadyRecording,

    #[error("Capture target unavailable: {reason}")]
    TargetUnavailable { reason: String },

    #[error("Window has invalid size: {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },

    #[error("No frames captured.")]
    NoFramesCaptured,

    #[error("Mux error: {0}")]
    Mux(#[from] MuxError),

    #[error("Failed to start capture thread: {0}")]
    CaptureThread(#[source] std::io::Error),
}

impl RecasterError {
    /// Error code reported across the host command channel.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_args",
            Self::AlreadyRecording => "already_recording",
            Self::TargetUnavailable { .. } => "target_unavailable",
            Self::InvalidWindowSize { .. } => "window_size_invalid",
            Self::CaptureThread(_) => "start_failed",
            Self::NoFramesCaptured | Self::Mux(_) => "stop_failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum MuxError {
    #[error("No frames were captured.")]
    NoFrames,

    #[error("Invalid frame size: {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("Container would be {bytes} bytes, beyond the 32-bit RIFF limit")]
    TooLarge { bytes: u64 },

    #[error("Failed to open output file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to finalize AVI output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame has empty dimensions: {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },

    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: u64, actual: usize },
}
