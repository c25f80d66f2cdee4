use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod channel;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=debug for per-tick capture logs.
    // stdout carries command responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Recaster v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.as_slice() {
        [] => app::run().await,
        [cmd, path] if cmd == "inspect" => inspect(Path::new(path)),
        _ => bail!("usage: recaster [inspect <file.avi>]"),
    };

    match result {
        Ok(()) => {
            info!("Recaster exited cleanly.");
            Ok(())
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            Err(e)
        }
    }
}

/// Log a summary of a recorded AVI file.
fn inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let avi = recaster_avi::read_avi(&bytes).with_context(|| format!("parsing {}", path.display()))?;

    info!("{}: {} bytes", path.display(), bytes.len());
    info!(
        "  video: {}x{} {} bpp, {}",
        avi.format.width,
        avi.format.height.unsigned_abs(),
        avi.format.bit_count,
        if avi.format.is_top_down() { "top-down" } else { "bottom-up" }
    );
    info!(
        "  frames: {} at {:.2} fps ({:.2}s), {} index entries",
        avi.frames.len(),
        avi.fps(),
        avi.duration_secs(),
        avi.index.len()
    );
    Ok(())
}
