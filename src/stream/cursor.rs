//! Little-endian word cursor over an in-memory stream

use crate::error::{Error, Result};

/// Reads little-endian integers from a byte slice, tracking the offset for
/// error reporting
pub struct StreamCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset from the start of the stream
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn truncated(&self) -> Error {
        Error::CorruptStream {
            offset: self.pos,
            detail: "unexpected end of stream".to_string(),
        }
    }

    /// Reads `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(self.truncated());
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads a little-endian 16-bit word
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}
