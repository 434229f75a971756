//! Error taxonomy. Every variant renders as a human-readable log line.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with user input, reported before any task starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a YouTube URL")]
    EmptyUrl,
    #[error("Invalid YouTube URL")]
    InvalidUrl(String),
    #[error("Please select a download location")]
    MissingDestination,
    #[error("Download path does not exist: {}", .0.display())]
    DestinationNotFound(PathBuf),
    #[error("Unsupported quality '{quality}' for {format}")]
    InvalidQuality { quality: String, format: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A download is already running")]
    AlreadyRunning,
    #[error("Error fetching video info: {0}")]
    Resolution(String),
    #[error("Download error: {0}")]
    Download(String),
    #[error("Settings error: {0}")]
    Settings(String),
    #[error("Error loading thumbnail: {0}")]
    Thumbnail(String),
    #[error("{tool} probe failed: {reason}")]
    Probe { tool: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
