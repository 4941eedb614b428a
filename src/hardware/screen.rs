//! Immutable target frames

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::hardware::{viewport_cells, Tile};
use crate::types::{Cell, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};

/// One target frame: viewport offsets plus the tile shown at every visible cell
///
/// Screens are immutable value objects. They are shared behind [`Arc`] so
/// the appearance index, the frame list, and decoder output can hold the
/// same instance without copying the cell map. Equality is structural over
/// the offsets and the tile-to-cells map.
#[derive(Debug)]
pub struct Screen {
    x: u16,
    y: u16,
    tile_positions: BTreeMap<Tile, BTreeSet<Cell>>,
    cells: BTreeSet<Cell>,
}

impl Screen {
    /// Creates a screen from raw offsets and a tile-to-cells map
    ///
    /// Offsets are normalized modulo the 800x600 virtual space. The map
    /// must cover exactly the cells visible at the normalized offsets;
    /// that is the frame source's contract, and a map that breaks it is a
    /// programming error and panics.
    pub fn new(x: u16, y: u16, tile_positions: BTreeMap<Tile, BTreeSet<Cell>>) -> Self {
        let x = x % VIRTUAL_WIDTH;
        let y = y % VIRTUAL_HEIGHT;
        let cells = viewport_cells(x, y);
        assert_eq!(
            tile_positions.values().map(|c| c.len()).sum::<usize>(),
            cells.len(),
            "tile positions must cover the viewport exactly"
        );
        let covered: BTreeSet<Cell> = tile_positions
            .values()
            .flat_map(|set| set.iter().copied())
            .collect();
        assert_eq!(covered, cells, "tile positions must match the viewport cell set");
        Self {
            x,
            y,
            tile_positions,
            cells,
        }
    }

    /// Creates a screen showing one tile at every visible cell
    pub fn filled(x: u16, y: u16, tile: Tile) -> Self {
        Self::from_pattern(x, y, |_| tile)
    }

    /// Creates a screen by asking `paint` for the tile at each visible cell
    pub fn from_pattern<F>(x: u16, y: u16, paint: F) -> Self
    where
        F: Fn(Cell) -> Tile,
    {
        let x = x % VIRTUAL_WIDTH;
        let y = y % VIRTUAL_HEIGHT;
        let mut tile_positions: BTreeMap<Tile, BTreeSet<Cell>> = BTreeMap::new();
        for cell in viewport_cells(x, y) {
            tile_positions.entry(paint(cell)).or_default().insert(cell);
        }
        Self::new(x, y, tile_positions)
    }

    /// Viewport offsets (x, y), normalized
    pub fn offsets(&self) -> (u16, u16) {
        (self.x, self.y)
    }

    /// The full tile-to-cells map
    pub fn tile_positions(&self) -> &BTreeMap<Tile, BTreeSet<Cell>> {
        &self.tile_positions
    }

    /// Iterates the distinct tiles on this screen in lexicographic order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tile_positions.keys()
    }

    /// Number of distinct tiles on this screen
    pub fn tile_count(&self) -> usize {
        self.tile_positions.len()
    }

    /// Whether `tile` appears anywhere on this screen
    pub fn has_tile(&self, tile: &Tile) -> bool {
        self.tile_positions.contains_key(tile)
    }

    /// The cells showing `tile`, if it appears
    pub fn cells_of(&self, tile: &Tile) -> Option<&BTreeSet<Cell>> {
        self.tile_positions.get(tile)
    }

    /// The set of cells visible at this screen's offsets
    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }
}

impl PartialEq for Screen {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.tile_positions == other.tile_positions
    }
}

impl Eq for Screen {}

/// An ordered, finite sequence of target screens
///
/// Frame sources guarantee each screen is internally consistent: every
/// listed cell is visible at the screen's offsets and the union of the
/// cell sets is the whole viewport.
pub trait FrameSource {
    /// The frames to encode, in display order
    fn frames(&self) -> &[Arc<Screen>];
}

impl FrameSource for [Arc<Screen>] {
    fn frames(&self) -> &[Arc<Screen>] {
        self
    }
}

impl FrameSource for Vec<Arc<Screen>> {
    fn frames(&self) -> &[Arc<Screen>] {
        self.as_slice()
    }
}
