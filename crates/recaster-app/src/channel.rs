//! Host method-call surface.
//!
//! Requests are `{"method": "...", "args": {...}}`. Each gets exactly one
//! response, `{"ok": <value>}` or `{"error": {"code", "message", "details"?}}`.

use recaster_core::{RecasterError, RecordingOptions};
use recaster_recorder::Recorder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub(crate) struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Option<Value>,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MethodResponse {
    Ok(Value),
    Error(ErrorBody),
}

impl MethodResponse {
    pub(crate) fn error(code: &str, message: impl Into<String>, details: Option<String>) -> Self {
        Self::Error(ErrorBody { code: code.to_owned(), message: message.into(), details })
    }

    fn from_recorder_error(e: &RecasterError) -> Self {
        let message = match e {
            RecasterError::InvalidArgument { reason } => reason.clone(),
            other => other.to_string(),
        };
        Self::error(e.code(), message, None)
    }
}

/// Run one call against `recorder`. Blocks for the duration of a stop.
pub(crate) fn dispatch(recorder: &Recorder, call: &MethodCall) -> MethodResponse {
    match call.method.as_str() {
        "getPlatformVersion" => MethodResponse::Ok(Value::String(platform_version())),
        "isRecording" => MethodResponse::Ok(Value::Bool(recorder.is_recording())),
        "startRecording" => {
            let options = match start_options(call.args.as_ref()) {
                Ok(options) => options,
                Err(e) => return MethodResponse::from_recorder_error(&e),
            };
            match recorder.start(&options) {
                Ok(_) => MethodResponse::Ok(Value::Null),
                Err(e) => {
                    warn!("startRecording failed: {}", e);
                    MethodResponse::from_recorder_error(&e)
                }
            }
        }
        "stopRecording" => match recorder.stop() {
            Ok(path) => {
                MethodResponse::Ok(path.map_or(Value::Null, |p| Value::String(p.display().to_string())))
            }
            Err(e) => {
                warn!("stopRecording failed: {}", e);
                MethodResponse::error(e.code(), "Failed to finalize recording.", Some(e.to_string()))
            }
        },
        other => {
            info!("Unknown method '{}'", other);
            MethodResponse::error("not_implemented", format!("Method '{other}' is not implemented."), None)
        }
    }
}

/// Extract Start options from loosely typed host arguments.
///
/// Integer fields of the wrong type are ignored so the defaults apply.
fn start_options(args: Option<&Value>) -> Result<RecordingOptions, RecasterError> {
    let invalid = |reason: &str| RecasterError::InvalidArgument { reason: reason.to_owned() };

    let args: &Map<String, Value> =
        args.and_then(Value::as_object).ok_or_else(|| invalid("Arguments are required."))?;
    let output_path = args
        .get("outputPath")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid("outputPath is required."))?;

    Ok(RecordingOptions {
        output_path: output_path.to_owned(),
        fps: args.get("fps").and_then(Value::as_i64),
        resolution_divisor: args.get("resolutionDivisor").and_then(Value::as_i64),
    })
}

/// `"<OS> <kernel release>"`, falling back to the CPU architecture where the
/// release is not readable.
pub(crate) fn platform_version() -> String {
    let os = match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    };
    let release = std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| std::env::consts::ARCH.to_owned());
    format!("{os} {release}")
}
