//! In-process capture target: animated colour bars.
//!
//! Stands in for a host window when no platform adapter is attached (CI,
//! headless runs, the `recaster` binary). It goes through the same
//! strided-RGB → BGRA → scale path a toolkit pixbuf grab would.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Result};
use recaster_core::{Frame, Resolution};
use tracing::debug;

use crate::convert::{scale_nearest, to_bgra, PixelLayout};
use crate::FrameCaptureSource;

/// SMPTE-ish bar colours, RGB.
const BARS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];

/// Row padding added to the synthetic surface, like a toolkit's aligned rowstride.
const ROW_PAD: usize = 3;

pub struct TestPatternSource {
    surface: Mutex<Resolution>,
    visible: AtomicBool,
    frame_index: AtomicU64,
}

impl TestPatternSource {
    pub fn new(surface: Resolution) -> Self {
        Self {
            surface: Mutex::new(surface),
            visible: AtomicBool::new(true),
            frame_index: AtomicU64::new(0),
        }
    }

    /// Resize the simulated window.
    pub fn set_surface_size(&self, size: Resolution) {
        debug!("TestPatternSource resized to {}", size);
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner) = size;
    }

    /// Show or hide the simulated window. Hidden surfaces fail every call.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    /// Number of frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frame_index.load(Ordering::Relaxed)
    }

    fn render_rgb(size: Resolution, phase: u64) -> (Vec<u8>, usize) {
        let width = size.width as usize;
        let stride = width * 3 + ROW_PAD;
        let mut buf = vec![0u8; stride * size.height as usize];
        for row in buf.chunks_exact_mut(stride) {
            for (x, px) in row[..width * 3].chunks_exact_mut(3).enumerate() {
                let bar = (x * BARS.len() / width + phase as usize) % BARS.len();
                px.copy_from_slice(&BARS[bar]);
            }
        }
        (buf, stride)
    }
}

impl FrameCaptureSource for TestPatternSource {
    fn surface_size(&self) -> Result<Resolution> {
        if !self.visible.load(Ordering::SeqCst) {
            bail!("test pattern window is not visible");
        }
        Ok(*self.surface.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn capture(&self, target: Resolution) -> Result<Frame> {
        let surface = self.surface_size()?;
        if surface.is_empty() {
            bail!("test pattern window has zero size ({surface})");
        }
        let phase = self.frame_index.fetch_add(1, Ordering::Relaxed);
        let (rgb, stride) = Self::render_rgb(surface, phase);
        let full = to_bgra(&rgb, surface, stride, PixelLayout::Rgb)?;
        scale_nearest(&full, target)
    }

    fn name(&self) -> &str {
        "test-pattern"
    }
}
