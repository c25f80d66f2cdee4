use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::RecasterError;
use crate::types::Resolution;

pub const DEFAULT_FPS: u32 = 30;
pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;

pub const DEFAULT_RESOLUTION_DIVISOR: u32 = 1;
pub const MAX_RESOLUTION_DIVISOR: u32 = 8;

/// A Start request as received from the host, before validation.
///
/// Numeric fields are signed and optional so that out-of-range values clamp
/// rather than fail to parse, and absent values fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingOptions {
    #[serde(alias = "outputPath")]
    pub output_path: String,
    pub fps: Option<i64>,
    #[serde(alias = "resolutionDivisor")]
    pub resolution_divisor: Option<i64>,
}

impl RecordingOptions {
    pub fn new(output_path: impl Into<String>) -> Self {
        Self { output_path: output_path.into(), ..Default::default() }
    }

    pub fn with_fps(mut self, fps: i64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_resolution_divisor(mut self, divisor: i64) -> Self {
        self.resolution_divisor = Some(divisor);
        self
    }
}

/// Validated settings for one recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSettings {
    pub output_path: PathBuf,
    /// Frames per second, within `[MIN_FPS, MAX_FPS]`.
    pub fps: u32,
    /// Capture downscale factor, within `[1, MAX_RESOLUTION_DIVISOR]`.
    pub resolution_divisor: u32,
}

impl RecordingSettings {
    /// Validate the output path and clamp the numeric options into range.
    pub fn from_options(options: &RecordingOptions) -> Result<Self, RecasterError> {
        if options.output_path.is_empty() {
            return Err(RecasterError::InvalidArgument {
                reason: "outputPath is required.".into(),
            });
        }
        Ok(Self {
            output_path: PathBuf::from(&options.output_path),
            fps: clamp(options.fps, DEFAULT_FPS, MIN_FPS, MAX_FPS),
            resolution_divisor: clamp(
                options.resolution_divisor,
                DEFAULT_RESOLUTION_DIVISOR,
                1,
                MAX_RESOLUTION_DIVISOR,
            ),
        })
    }

    /// Delay between capture ticks: `max(1, 1000 / fps)` milliseconds.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis((1000 / self.fps.max(1)).max(1) as u64)
    }

    /// Capture dimensions for a source surface of size `base`.
    pub fn capture_size(&self, base: Resolution) -> Resolution {
        base.divided_by(self.resolution_divisor)
    }
}

fn clamp(value: Option<i64>, default: u32, min: u32, max: u32) -> u32 {
    match value {
        Some(v) => v.clamp(min as i64, max as i64) as u32,
        None => default,
    }
}
