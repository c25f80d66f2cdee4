//! Background capture thread.
//!
//! One tick = one `capture` call. The thread waits between ticks on a stop
//! channel instead of sleeping, so `stop` wakes it immediately and the join
//! returns within one in-flight capture.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use recaster_capture::FrameCaptureSource;
use recaster_core::Resolution;
use tracing::{debug, error, info};

use crate::buffer::{Append, FrameBuffer};
use crate::stats::SessionCounters;

pub(crate) struct CaptureWorker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// What the capture thread needs for one session.
pub(crate) struct CaptureJob {
    pub source: Arc<dyn FrameCaptureSource>,
    pub capture_size: Resolution,
    pub interval: Duration,
    pub buffer: Arc<FrameBuffer>,
    pub counters: Arc<SessionCounters>,
}

impl CaptureWorker {
    pub(crate) fn spawn(job: CaptureJob) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("recaster-capture".into())
            .spawn(move || run(job, stop_rx))?;
        Ok(Self { stop_tx, handle })
    }

    /// Signal the thread and block until it has exited.
    ///
    /// No tick runs after this returns.
    pub(crate) fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            error!("Capture thread panicked; keeping frames captured before the panic");
        }
    }
}

fn run(job: CaptureJob, stop_rx: mpsc::Receiver<()>) {
    info!(
        "Capture loop started: source={} size={} interval={:?}",
        job.source.name(),
        job.capture_size,
        job.interval
    );

    let mut deadline = Instant::now();
    loop {
        tick(&job);

        deadline += job.interval;
        let now = Instant::now();
        if deadline < now {
            // Capture overran the interval; resume the cadence from now.
            deadline = now;
        }
        match stop_rx.recv_timeout(deadline - now) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("Capture loop exited");
}

fn tick(job: &CaptureJob) {
    job.counters.tick();
    match job.source.capture(job.capture_size) {
        Ok(frame) => match job.buffer.append(frame) {
            Append::Stored => job.counters.stored(),
            Append::Dropped { expected, got } => {
                job.counters.dropped();
                debug!("Dropped {} frame, session frames are {}", got, expected);
            }
        },
        Err(e) => {
            job.counters.failed();
            debug!("Capture skipped: {:#}", e);
        }
    }
}
