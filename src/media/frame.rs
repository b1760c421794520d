//! Video preview frame extraction
//!
//! Extracts a single preview frame from a local or remote video by invoking
//! the `ffmpeg` binary, decoding one frame to PNG on stdout. ffmpeg handles
//! both filesystem paths and http(s) URLs, so the same invocation covers
//! remote previews.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Errors that can occur during preview frame extraction
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("ffmpeg binary not found: {0}")]
    FfmpegNotFound(String),

    #[error("failed to launch ffmpeg: {0}")]
    Launch(#[from] std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Process { status: String, stderr: String },

    #[error("ffmpeg produced no frame data")]
    EmptyOutput,
}

/// Locate the ffmpeg binary: an explicit path wins, otherwise PATH lookup.
fn locate_ffmpeg(explicit: Option<&Path>) -> Result<PathBuf, FrameError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => which::which("ffmpeg").map_err(|e| FrameError::FfmpegNotFound(e.to_string())),
    }
}

/// Arguments for decoding the first video frame as PNG to stdout.
fn preview_frame_args(input: &str) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "image2pipe".to_string(),
        "-c:v".to_string(),
        "png".to_string(),
        "pipe:1".to_string(),
    ]
}

/// Extract one preview frame from `input` (path or URL) as PNG bytes.
///
/// # Arguments
/// * `input` - video path or http(s) URL, already normalized
/// * `ffmpeg_path` - optional explicit ffmpeg binary (defaults to PATH lookup)
pub fn extract_preview_frame(
    input: &str,
    ffmpeg_path: Option<&Path>,
) -> Result<Vec<u8>, FrameError> {
    let ffmpeg = locate_ffmpeg(ffmpeg_path)?;

    tracing::debug!(target: "media", input = %input, "extracting video preview frame");

    let output = Command::new(&ffmpeg).args(preview_frame_args(input)).output()?;

    if !output.status.success() {
        return Err(FrameError::Process {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if output.stdout.is_empty() {
        return Err(FrameError::EmptyOutput);
    }

    Ok(output.stdout)
}
