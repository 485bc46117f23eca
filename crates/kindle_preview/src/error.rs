// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error type for the previewer.

use kindle_trigger::HostError;
use thiserror::Error;

/// Errors that abort a preview run
#[derive(Debug, Error)]
pub enum PreviewError {
    /// IO error reading the scene or writing frames
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene file failed to parse
    #[error("Failed to parse scene: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Frame record failed to serialize
    #[error("Failed to write frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Site lookup failed
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Scene parsed but is unusable
    #[error("Invalid scene: {0}")]
    Invalid(String),
}
