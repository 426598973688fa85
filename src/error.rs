//! Error types for page cache operations.

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PageCacheError>;

#[derive(Debug, thiserror::Error)]
pub enum PageCacheError {
    /// The host cannot run any operation (unsupported OS, no eviction primitive, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("Invalid path: {}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported object type: {}", .0.display())]
    UnsupportedObjectType(PathBuf),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A kernel primitive returned an error. `source` carries the OS error code.
    #[error("{call} failed: {source}")]
    Syscall {
        call: &'static str,
        #[source]
        source: io::Error,
    },
}

impl PageCacheError {
    pub(crate) fn last_os_error(call: &'static str) -> Self {
        Self::Syscall {
            call,
            source: io::Error::last_os_error(),
        }
    }

    /// Raw OS error code, when this error came from a kernel primitive.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Self::Syscall { source, .. } | Self::InvalidPath { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}
