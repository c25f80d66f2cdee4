//! recaster-capture — where frames come from.
//!
//! The recorder only ever talks to a [`FrameCaptureSource`]: "tell me how big
//! the target surface is" and "give me one BGRA frame of this size". Platform
//! backends (GDI blit, GdkPixbuf grab, ScreenCaptureKit) live behind that trait
//! in the host adapter; this crate ships the pieces they share.
//!
//! # Backends
//!
//! | Source | Target | Status |
//! |--------|--------|--------|
//! | [`TestPatternSource`] | in-process animated colour bars | ✓ |
//! | Host window adapters | GDI / GTK / CoreGraphics | provided by the embedding host |
//!
//! # Usage
//!
//! ```rust
//! use recaster_capture::{FrameCaptureSource, TestPatternSource};
//! use recaster_core::Resolution;
//!
//! let source = TestPatternSource::new(Resolution::new(640, 480));
//! let base = source.surface_size()?;
//! let frame = source.capture(base.divided_by(2))?;
//! assert_eq!(frame.size(), Resolution::new(320, 240));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Frame path
//!
//! ```text
//! host surface (RGB / RGBA / BGRx, strided rows)
//!          │  to_bgra()
//!          ▼
//! packed BGRA at surface size
//!          │  scale_nearest()
//!          ▼
//! Frame at capture size ─────► Recorder tick ─► FrameBuffer
//! ```

pub mod convert;
pub mod pattern;

use anyhow::Result;
use recaster_core::{Frame, Resolution};

pub use convert::{scale_nearest, to_bgra, PixelLayout};
pub use pattern::TestPatternSource;

// ── Capability trait ──────────────────────────────────────────────────────────

/// A capturable on-screen surface.
///
/// Implementations are called from the recorder's capture thread while the
/// control side may concurrently query them, so they must be `Send + Sync`.
/// Every failure is non-fatal to a running session: the tick is skipped.
pub trait FrameCaptureSource: Send + Sync {
    /// Current geometry of the target surface.
    ///
    /// Errors when the target does not exist or its geometry cannot be read.
    fn surface_size(&self) -> Result<Resolution>;

    /// Grab one frame scaled to `target`.
    ///
    /// The returned frame is fully populated BGRA in top-down row order.
    /// Backends that cannot honour `target` exactly may return another size;
    /// the recorder drops frames that disagree with the session's first frame.
    fn capture(&self, target: Resolution) -> Result<Frame>;

    /// Short label used in logs.
    fn name(&self) -> &str {
        "capture-source"
    }
}

impl<T: FrameCaptureSource + ?Sized> FrameCaptureSource for std::sync::Arc<T> {
    fn surface_size(&self) -> Result<Resolution> {
        (**self).surface_size()
    }

    fn capture(&self, target: Resolution) -> Result<Frame> {
        (**self).capture(target)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
