use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single navigator call. Never fatal to the session; the
/// dispatcher reports it and the user re-triggers the action.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("cannot list {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy path: {0}")]
    Clipboard(String),
}

impl NavError {
    pub fn list(path: impl Into<PathBuf>, source: io::Error) -> Self {
        NavError::List {
            path: path.into(),
            source,
        }
    }

    pub fn stat(path: impl Into<PathBuf>, source: io::Error) -> Self {
        NavError::Stat {
            path: path.into(),
            source,
        }
    }
}

pub type NavResult<T> = Result<T, NavError>;
