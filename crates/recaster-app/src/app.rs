use std::sync::Arc;

use anyhow::Result;
use recaster_capture::TestPatternSource;
use recaster_core::Resolution;
use recaster_recorder::Recorder;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::channel::{self, MethodCall, MethodResponse};

/// Serve host method calls from stdin until it closes.
///
/// # Environment
/// - `RECASTER_SOURCE_WIDTH` / `RECASTER_SOURCE_HEIGHT`: size of the capture
///   surface (default 1280×720).
///
/// # Flow
/// 1. Read one JSON method call per stdin line
/// 2. Dispatch it on a blocking thread (stop joins the capture thread and
///    writes the file)
/// 3. Write one JSON response line to stdout
/// 4. When the loop ends, for any reason, drop the recorder on a blocking
///    thread, which finalizes an active recording
pub async fn run() -> Result<()> {
    let surface = Resolution::new(
        env_dimension("RECASTER_SOURCE_WIDTH", Resolution::HD.width),
        env_dimension("RECASTER_SOURCE_HEIGHT", Resolution::HD.height),
    );
    let source = Arc::new(TestPatternSource::new(surface));
    let recorder = Arc::new(Recorder::new(source));
    info!("Capture surface {}; waiting for method calls on stdin", surface);

    let served = serve(&recorder, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await;

    // Dropping the last handle stops any active recording and writes its file.
    tokio::task::spawn_blocking(move || drop(recorder)).await?;
    served
}

/// Answer every line of `input` on `output` until `input` ends.
async fn serve<R, W>(recorder: &Arc<Recorder>, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line).await? == 0 {
            info!("Command channel closed");
            return Ok(());
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let response = match serde_json::from_slice::<MethodCall>(&line) {
            Ok(call) => {
                debug!("→ {}", call.method);
                let recorder = Arc::clone(recorder);
                tokio::task::spawn_blocking(move || channel::dispatch(&recorder, &call)).await?
            }
            Err(e) => {
                warn!("Malformed method call: {}", e);
                MethodResponse::error("bad_request", format!("Malformed method call: {e}"), None)
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        output.write_all(&out).await?;
        output.flush().await?;
    }
}

fn env_dimension(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: not a valid dimension", name, value);
            default
        }),
        Err(_) => default,
    }
}
