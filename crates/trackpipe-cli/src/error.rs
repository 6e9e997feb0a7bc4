use std::path::PathBuf;

use trackpipe::TrackpipeError;

/// Everything that can stop a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid script: {0}")]
    InvalidScript(String),

    #[error(transparent)]
    Engine(#[from] TrackpipeError),

    #[error("failed to write {}: {source}", .path.display())]
    WriteImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
