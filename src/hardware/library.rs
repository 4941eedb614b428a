//! The 256-slot tile pattern library

use std::collections::{BTreeMap, BTreeSet};

use crate::hardware::Tile;
use crate::types::LIBRARY_SLOTS;

/// Mutable mirror of the controller's pattern memory
///
/// Holds the 256 tile slots plus a reverse index from tile to the slots
/// holding it. As with [`crate::hardware::TileMap`], the only mutation path
/// is [`TileLibrary::set`], which keeps both sides in lockstep. The library
/// is cloned when the encoder evaluates a hypothetical swap, so it stays
/// small: 3072 pattern bytes plus the reverse map.
#[derive(Debug, Clone)]
pub struct TileLibrary {
    slots: [Tile; LIBRARY_SLOTS],
    reverse: BTreeMap<Tile, BTreeSet<u8>>,
}

impl TileLibrary {
    /// Creates the initial library: every slot holds the blank tile
    pub fn new() -> Self {
        let mut reverse = BTreeMap::new();
        reverse.insert(Tile::BLANK, (0..LIBRARY_SLOTS).map(|s| s as u8).collect());
        Self {
            slots: [Tile::BLANK; LIBRARY_SLOTS],
            reverse,
        }
    }

    /// The tile currently held by `slot`
    pub fn tile_at(&self, slot: u8) -> Tile {
        self.slots[slot as usize]
    }

    /// The slots currently holding `tile`, if any
    pub fn slots_of(&self, tile: &Tile) -> Option<&BTreeSet<u8>> {
        self.reverse.get(tile)
    }

    /// Whether `tile` occupies at least one slot
    pub fn contains(&self, tile: &Tile) -> bool {
        self.reverse.contains_key(tile)
    }

    /// Writes `tile` into `slot`, returning the displaced tile
    pub fn set(&mut self, slot: u8, tile: Tile) -> Tile {
        let old = self.slots[slot as usize];
        if old == tile {
            return old;
        }
        if let Some(slots) = self.reverse.get_mut(&old) {
            slots.remove(&slot);
            if slots.is_empty() {
                self.reverse.remove(&old);
            }
        }
        self.reverse.entry(tile).or_default().insert(slot);
        self.slots[slot as usize] = tile;
        old
    }

    /// True iff some tile occupies more than one slot
    pub fn has_duplicates(&self) -> bool {
        self.reverse.values().any(|slots| slots.len() > 1)
    }
}

impl Default for TileLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(library: &TileLibrary) {
        let mut total = 0;
        for slot in 0..LIBRARY_SLOTS {
            let tile = library.tile_at(slot as u8);
            let slots = library.slots_of(&tile).expect("occupied tile missing from reverse");
            assert!(slots.contains(&(slot as u8)));
            total += 1;
        }
        assert_eq!(total, LIBRARY_SLOTS);
        let indexed: usize = library.reverse.values().map(|s| s.len()).sum();
        assert_eq!(indexed, LIBRARY_SLOTS);
    }

    #[test]
    fn test_initial_state() {
        let library = TileLibrary::new();
        assert_eq!(library.tile_at(0), Tile::BLANK);
        assert_eq!(library.tile_at(255), Tile::BLANK);
        assert_eq!(library.slots_of(&Tile::BLANK).unwrap().len(), 256);
        assert!(library.has_duplicates());
        assert_consistent(&library);
    }

    #[test]
    fn test_set_displaces() {
        let mut library = TileLibrary::new();
        let displaced = library.set(3, Tile::FULL);
        assert_eq!(displaced, Tile::BLANK);
        assert_eq!(library.tile_at(3), Tile::FULL);
        assert_eq!(library.slots_of(&Tile::FULL).unwrap().len(), 1);
        assert_eq!(library.slots_of(&Tile::BLANK).unwrap().len(), 255);
        assert_consistent(&library);
    }

    #[test]
    fn test_reverse_entry_removed_with_last_slot() {
        let mut library = TileLibrary::new();
        library.set(0, Tile::FULL);
        library.set(0, Tile::new([1; 12]));
        assert!(library.slots_of(&Tile::FULL).is_none());
        assert!(!library.contains(&Tile::FULL));
        assert_consistent(&library);
    }

    #[test]
    fn test_has_duplicates() {
        let mut library = TileLibrary::new();
        // fill every slot with a distinct tile
        for slot in 0..LIBRARY_SLOTS {
            let mut rows = [0u8; 12];
            rows[0] = slot as u8;
            rows[1] = 0x01;
            library.set(slot as u8, Tile::new(rows));
        }
        assert!(!library.has_duplicates());

        library.set(10, library.tile_at(20));
        assert!(library.has_duplicates());
        assert_consistent(&library);
    }

    #[test]
    fn test_set_same_tile_is_noop() {
        let mut library = TileLibrary::new();
        library.set(5, Tile::FULL);
        let displaced = library.set(5, Tile::FULL);
        assert_eq!(displaced, Tile::FULL);
        assert_eq!(library.slots_of(&Tile::FULL).unwrap().len(), 1);
        assert_consistent(&library);
    }
}
