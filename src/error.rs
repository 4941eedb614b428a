//! Error types for tilecast

use std::fmt;
use std::io;

/// Result type for tilecast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in tilecast operations
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// A tile was constructed from a byte slice that is not 12 bytes long
    InvalidTileSize(usize),

    /// A cell address outside the 50x100 tilemap
    InvalidCell { row: u8, col: u8 },

    /// The frame sequence handed to the encoder was empty
    EmptyInput,

    /// A screen requires more distinct tiles than the library has slots
    TooManyUniqueTiles { frame: usize, count: usize },

    /// The stream violates the wire format at the given byte offset
    CorruptStream { offset: usize, detail: String },

    /// A delay command with a repeat count of zero
    InvalidDelay { offset: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidTileSize(len) => {
                write!(f, "Invalid tile size: expected 12 bytes, got {}", len)
            }
            Error::InvalidCell { row, col } => {
                write!(f, "Invalid cell: ({}, {})", row, col)
            }
            Error::EmptyInput => write!(f, "Empty frame sequence"),
            Error::TooManyUniqueTiles { frame, count } => {
                write!(f, "Frame {} uses {} distinct tiles, library holds 256", frame, count)
            }
            Error::CorruptStream { offset, detail } => {
                write!(f, "Corrupt stream at byte {}: {}", offset, detail)
            }
            Error::InvalidDelay { offset } => {
                write!(f, "Zero delay count at byte {}", offset)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}
