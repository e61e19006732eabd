//! Error types for zip-path

use std::io;

/// Result type for zip-path operations
pub type Result<T> = std::result::Result<T, ZipPathError>;

/// Error types that can occur while navigating or reading an archive
#[derive(Debug)]
pub enum ZipPathError {
    /// I/O error
    Io(io::Error),
    /// Invalid ZIP format or structure
    InvalidFormat(String),
    /// Entry not found in the archive
    EntryNotFound(String),
    /// Unsupported compression method
    UnsupportedCompression(u16),
    /// Attempted to list the children of a file path
    NotADirectory(String),
    /// Attempted to open a directory path for reading or writing
    IsADirectory(String),
    /// The root path needs the archive's on-disk file name, but none is set
    UnnamedArchive,
    /// Mutually exclusive or malformed options (binary mode with text
    /// options, an empty glob pattern, writing through a read-only handle)
    InvalidArgument(String),
    /// Text decoding failed under strict error handling
    Decode(String),
    /// `relative_to` called with a path that is not an ancestor
    NotAnAncestor(String, String),
}

impl std::fmt::Display for ZipPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZipPathError::Io(e) => write!(f, "I/O error: {}", e),
            ZipPathError::InvalidFormat(msg) => write!(f, "Invalid ZIP format: {}", msg),
            ZipPathError::EntryNotFound(name) => write!(f, "Entry not found: {}", name),
            ZipPathError::UnsupportedCompression(method) => {
                write!(f, "Unsupported compression method: {}", method)
            }
            ZipPathError::NotADirectory(at) => write!(f, "Not a directory: {}", at),
            ZipPathError::IsADirectory(at) => write!(f, "Is a directory: {}", at),
            ZipPathError::UnnamedArchive => {
                write!(f, "Archive has no associated file name")
            }
            ZipPathError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            ZipPathError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ZipPathError::NotAnAncestor(base, path) => {
                write!(f, "{:?} is not an ancestor of {:?}", base, path)
            }
        }
    }
}

impl std::error::Error for ZipPathError {}

impl From<io::Error> for ZipPathError {
    fn from(err: io::Error) -> Self {
        ZipPathError::Io(err)
    }
}
