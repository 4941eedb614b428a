//! Simulated hardware model shared by the encoder and decoder

pub mod library;
pub mod screen;
pub mod tile;
pub mod tilemap;

pub use library::TileLibrary;
pub use screen::{FrameSource, Screen};
pub use tile::{Tile, TILE_BYTES};
pub use tilemap::{viewport_cells, TileMap};
