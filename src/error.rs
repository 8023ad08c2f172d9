use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while opening, browsing or saving images.
///
/// None of these are fatal to the viewer: the frame loop turns them into
/// visible state (menu bar colour, error message) or a log line.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("no images found in {0}")]
    EmptyDirectory(PathBuf),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("no thumbnail for {path}: {reason}")]
    ThumbnailExtraction { path: PathBuf, reason: String },

    #[error("failed to inspect {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ViewerError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn thumbnail(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ViewerError::ThumbnailExtraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn save(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ViewerError::Save {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
