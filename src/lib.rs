//! tilecast - A tile-stream video encoder for Rust
//!
//! tilecast converts a sequence of monochrome screens into a compact binary
//! stream that a tile-based video controller replays by streaming writes
//! into its pattern library and tilemap. The encoder drives a simulated
//! copy of the hardware from blank state through each target screen,
//! choosing per frame between repainting cells and rewriting pattern slots
//! so the stream stays small. The decoder runs the same hardware model in
//! reverse, so a stream always replays into the screens that produced it.
//!
//! # Examples
//!
//! ## Encoding a frame sequence
//!
//! ```
//! use std::sync::Arc;
//! use tilecast::{decode, encode, Screen, Tile};
//!
//! let frames = vec![
//!     Arc::new(Screen::filled(0, 0, Tile::BLANK)),
//!     Arc::new(Screen::filled(0, 0, Tile::FULL)),
//! ];
//!
//! let bytes = encode(&frames)?;
//! assert_eq!(decode(&bytes)?, frames);
//! # Ok::<(), tilecast::Error>(())
//! ```
//!
//! ## Reading a stream frame by frame
//!
//! ```
//! use std::sync::Arc;
//! use tilecast::{encode, Screen, StreamReader, Tile};
//!
//! let frames = vec![Arc::new(Screen::filled(0, 0, Tile::FULL))];
//! let bytes = encode(&frames)?;
//!
//! let mut reader = StreamReader::new(&bytes);
//! while let Some(screen) = reader.next_screen()? {
//!     let (x, y) = screen.offsets();
//!     println!("frame at ({}, {}): {} tiles", x, y, screen.tile_count());
//! }
//! # Ok::<(), tilecast::Error>(())
//! ```

pub mod encoder;
pub mod error;
pub mod hardware;
pub mod stats;
pub mod stream;
pub mod types;

pub use encoder::{
    encode, encode_with_stats, plan_writes, FrameEncoder, FrameLifetime, ScreenUpdate,
    TileAppearanceIndex, WritePlan,
};
pub use error::{Error, Result};
pub use hardware::{viewport_cells, FrameSource, Screen, Tile, TileLibrary, TileMap, TILE_BYTES};
pub use stats::EncodeStats;
pub use stream::{decode, decode_file, StreamReader, StreamWriter};
pub use types::{
    Cell, CELL_COUNT, LIBRARY_SLOTS, MAP_COLS, MAP_ROWS, TILE_HEIGHT, TILE_WIDTH, VIEW_HEIGHT,
    VIEW_WIDTH, VIRTUAL_HEIGHT, VIRTUAL_WIDTH,
};
