pub mod config;
pub mod errors;
pub mod types;

pub use config::{RecordingOptions, RecordingSettings};
pub use errors::{FrameError, MuxError, RecasterError};
pub use types::*;
