use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to process image: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame buffer overflow encountered")]
    FrameBufferOverflow,
    #[error("FFmpeg command execution failed while {0}")]
    FfmpegFailed(&'static str),
    #[error("FFmpeg is not available on this system")]
    FfmpegNotAvailable,
    #[error("Failed to read video metadata: {0}")]
    ProbeFailed(String),
    #[error("Failed to attach audio track: {0}")]
    MuxFailed(String),
    #[error("Error sending data across channels")]
    SendError,
    #[error("Input file not found: {}", .0.display())]
    InputFileNotFound(PathBuf),
    #[error("Unsupported video format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("No watermark region defined for any video")]
    NoRegionsDefined,
    #[error("Argument cannot be empty: {0}")]
    EmptyArgument(String),
    #[error("Invalid argument provided: {0}")]
    InvalidArgument(String),
    #[error("Required argument is missing: {0}")]
    MissingArgument(String),
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
    #[error("{failed} of {total} videos failed")]
    JobsFailed { failed: usize, total: usize },
}
