use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while mirroring a course.
///
/// Fetch-time and input failures abort the run. `Download` is the only
/// variant the tree builder recovers from; it is logged per topic.
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("no working API version for course {course_id} (tried {tried})")]
    Discovery { course_id: String, tried: String },

    #[error("unexpected status {status} from {url}")]
    Transport { status: StatusCode, url: String },

    #[error("failed to download {url} to {}: {reason}", path.display())]
    Download {
        url: String,
        path: PathBuf,
        reason: String,
    },

    #[error("invalid snapshot: {0}")]
    Schema(String),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CmsError {
    /// Whether this error should end the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CmsError::Download { .. })
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;
