//! Tile appearance tracking
//!
//! A single pre-scan over the frame list records, for every distinct tile,
//! the ascending list of frames it appears in. During encoding the frame
//! encoder consumes these lists front to back; when a tile's final
//! appearance passes, it becomes a release candidate and its library slot
//! may be reclaimed.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use rayon::prelude::*;

use crate::hardware::{Screen, Tile};

/// Per-tile ascending frame indices, built in one pass over the frames
///
/// The per-frame tile sets are collected in parallel; the merge walks the
/// frames in order so the index never depends on scheduling.
#[derive(Debug, Clone)]
pub struct TileAppearanceIndex {
    appearances: BTreeMap<Tile, Vec<usize>>,
}

impl TileAppearanceIndex {
    /// Scans `frames` and records where each distinct tile appears
    pub fn build(frames: &[Arc<Screen>]) -> Self {
        let per_frame: Vec<Vec<Tile>> = frames
            .par_iter()
            .map(|screen| screen.tiles().copied().collect())
            .collect();

        let mut appearances: BTreeMap<Tile, Vec<usize>> = BTreeMap::new();
        for (frame, tiles) in per_frame.iter().enumerate() {
            for tile in tiles {
                appearances.entry(*tile).or_default().push(frame);
            }
        }
        Self { appearances }
    }

    /// The frames `tile` appears in, ascending
    pub fn frames_of(&self, tile: &Tile) -> Option<&[usize]> {
        self.appearances.get(tile).map(|frames| frames.as_slice())
    }

    /// Number of distinct tiles across the whole sequence
    pub fn tile_count(&self) -> usize {
        self.appearances.len()
    }
}

/// Consumes an appearance index frame by frame
#[derive(Debug, Clone)]
pub struct FrameLifetime {
    remaining: BTreeMap<Tile, VecDeque<usize>>,
}

impl FrameLifetime {
    /// Wraps an appearance index for consumption during encoding
    pub fn new(index: TileAppearanceIndex) -> Self {
        Self {
            remaining: index
                .appearances
                .into_iter()
                .map(|(tile, frames)| (tile, frames.into()))
                .collect(),
        }
    }

    /// Records that `tile` was just used in `frame`
    ///
    /// Returns true when this was the tile's final scripted appearance, in
    /// which case the caller schedules it for release at end of frame.
    pub fn advance(&mut self, tile: &Tile, frame: usize) -> bool {
        match self.remaining.get_mut(tile) {
            Some(frames) => {
                if frames.back() == Some(&frame) {
                    self.remaining.remove(tile);
                    true
                } else {
                    assert_eq!(
                        frames.front(),
                        Some(&frame),
                        "appearance list out of step with the encoded frames"
                    );
                    frames.pop_front();
                    false
                }
            }
            None => panic!("tile used in a frame it was not indexed for"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::Screen;

    fn tile(id: u8) -> Tile {
        let mut rows = [0u8; 12];
        rows[0] = id;
        Tile::new(rows)
    }

    fn filled(t: Tile) -> Arc<Screen> {
        Arc::new(Screen::filled(0, 0, t))
    }

    #[test]
    fn test_build_records_ascending_frames() {
        let frames = vec![filled(tile(1)), filled(tile(2)), filled(tile(1))];
        let index = TileAppearanceIndex::build(&frames);
        assert_eq!(index.frames_of(&tile(1)), Some(&[0, 2][..]));
        assert_eq!(index.frames_of(&tile(2)), Some(&[1][..]));
        assert_eq!(index.frames_of(&tile(3)), None);
        assert_eq!(index.tile_count(), 2);
    }

    #[test]
    fn test_tile_counted_once_per_frame() {
        let screen = Arc::new(Screen::from_pattern(0, 0, |cell| {
            if cell.row() % 2 == 0 {
                tile(1)
            } else {
                tile(2)
            }
        }));
        let index = TileAppearanceIndex::build(&[screen]);
        assert_eq!(index.frames_of(&tile(1)), Some(&[0][..]));
    }

    #[test]
    fn test_advance_releases_on_final_appearance() {
        let frames = vec![filled(tile(1)), filled(tile(2)), filled(tile(1))];
        let mut lifetime = FrameLifetime::new(TileAppearanceIndex::build(&frames));

        assert!(!lifetime.advance(&tile(1), 0));
        assert!(lifetime.advance(&tile(2), 1));
        assert!(lifetime.advance(&tile(1), 2));
    }

    #[test]
    fn test_single_appearance_releases_immediately() {
        let frames = vec![filled(tile(9))];
        let mut lifetime = FrameLifetime::new(TileAppearanceIndex::build(&frames));
        assert!(lifetime.advance(&tile(9), 0));
    }
}
