//! Compressed stream format support
//!
//! The stream is a flat little-endian command sequence: updates carrying
//! library and map writes, delay commands repeating the current screen, and
//! a two-word end marker. An update's first word is an x offset below 800,
//! so it can never collide with either magic word.

pub mod cursor;
pub mod reader;
pub mod writer;

pub use reader::{decode, decode_file, StreamReader};
pub use writer::StreamWriter;

/// Delay command word
pub const DELAY_WORD: u16 = 0xBABE;

/// End-of-stream marker, low word first
pub const END_MARKER: [u16; 2] = [0xBEEF, 0xCAFE];
