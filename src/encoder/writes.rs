//! Per-write planning
//!
//! Given a target tile and the cells that must show it, pick the cheapest
//! way to get the tile onto those cells. Planning never mutates hardware
//! state; the frame encoder applies the returned plan (or discards it when
//! the competing swap plan wins).

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::hardware::{Screen, Tile, TileLibrary, TileMap};
use crate::types::{Cell, LIBRARY_SLOTS};

/// A proposed set of hardware writes
///
/// Map writes are pre-filtered: a plan never writes a cell with the slot it
/// already holds. `released` names the release-pool tile whose slot the
/// plan reuses, when one was.
#[derive(Debug, Clone, Default)]
pub struct WritePlan {
    /// Cell rewrites, keyed by cell
    pub map_writes: BTreeMap<Cell, u8>,
    /// Pattern rewrites, keyed by slot
    pub library_writes: BTreeMap<u8, Tile>,
    /// The pool tile displaced by a released-slot reuse
    pub released: Option<Tile>,
}

impl WritePlan {
    /// Total write count, the cost the frame encoder compares plans by
    pub fn write_count(&self) -> usize {
        self.map_writes.len() + self.library_writes.len()
    }
}

/// Ranks a slot for overwrite selection: fewest on-screen uses, then fewest
/// total map uses, then smallest index
fn overwrite_rank(map: &TileMap, screen: &Screen, slot: u8) -> (usize, usize, u8) {
    let on_screen = map
        .positions(slot)
        .iter()
        .filter(|&&cell| screen.cells().contains(&cell))
        .count();
    (on_screen, map.use_count(slot), slot)
}

/// Map writes pointing `cells` at `slot`, with no-ops dropped
fn paint(map: &TileMap, cells: &BTreeSet<Cell>, slot: u8) -> BTreeMap<Cell, u8> {
    cells
        .iter()
        .filter(|&&cell| map.slot_at(cell) != slot)
        .map(|&cell| (cell, slot))
        .collect()
}

fn all_slots() -> impl Iterator<Item = u8> {
    (0..LIBRARY_SLOTS).map(|slot| slot as u8)
}

/// Plans the writes that put `tile` onto `cells`
///
/// Strategies, in strict priority order:
///
/// 1. reuse a slot already holding the tile;
/// 2. overwrite the lowest slot holding a released tile;
/// 3. consolidate a duplicated tile onto one slot and take the freed one;
/// 4. evict a slot whose tile the screen does not use at all.
///
/// `cells` must be non-empty and a subset of the screen's viewport.
pub fn plan_writes(
    library: &TileLibrary,
    map: &TileMap,
    screen: &Screen,
    pool: &BTreeSet<Tile>,
    tile: Tile,
    cells: &BTreeSet<Cell>,
) -> WritePlan {
    debug_assert!(!cells.is_empty());

    // S1: the tile is already in the library
    if let Some(slots) = library.slots_of(&tile) {
        let slot = slots
            .iter()
            .copied()
            .min_by_key(|&slot| overwrite_rank(map, screen, slot))
            .expect("reverse index entries are never empty");
        return WritePlan {
            map_writes: paint(map, cells, slot),
            library_writes: BTreeMap::new(),
            released: None,
        };
    }

    // S2: reuse the lowest slot whose tile has been released
    if !pool.is_empty() {
        if let Some(slot) = all_slots().find(|&slot| pool.contains(&library.tile_at(slot))) {
            let released = library.tile_at(slot);
            let mut library_writes = BTreeMap::new();
            library_writes.insert(slot, tile);
            return WritePlan {
                map_writes: paint(map, cells, slot),
                library_writes,
                released: Some(released),
            };
        }
        trace!("release pool holds no tile still in the library");
    }

    // S3: consolidate a duplicated tile and take the freed slot
    if library.has_duplicates() {
        let victim = all_slots()
            .filter(|&slot| {
                library
                    .slots_of(&library.tile_at(slot))
                    .map_or(false, |slots| slots.len() > 1)
            })
            .min_by_key(|&slot| overwrite_rank(map, screen, slot))
            .expect("duplicate check guarantees a candidate");
        let displaced = library.tile_at(victim);
        let merge = library
            .slots_of(&displaced)
            .expect("victim tile is in the library")
            .iter()
            .copied()
            .filter(|&slot| slot != victim)
            .min_by_key(|&slot| (Reverse(map.use_count(slot)), slot))
            .expect("duplicated tile holds another slot");

        // cells that must keep showing the displaced tile move to the
        // surviving slot before the victim is rewritten
        let mut map_writes = BTreeMap::new();
        if let Some(wanted) = screen.cells_of(&displaced) {
            for &cell in map.positions(victim) {
                if screen.cells().contains(&cell) && wanted.contains(&cell) {
                    map_writes.insert(cell, merge);
                }
            }
        }
        map_writes.extend(paint(map, cells, victim));

        let mut library_writes = BTreeMap::new();
        library_writes.insert(victim, tile);
        return WritePlan {
            map_writes,
            library_writes,
            released: None,
        };
    }

    // S4: evict a slot the screen has no use for
    trace!("forced eviction for {:?}", tile);
    let slot = all_slots()
        .find(|&slot| !screen.has_tile(&library.tile_at(slot)))
        .unwrap_or_else(|| {
            unreachable!("a screen with at most 256 distinct tiles leaves an evictable slot")
        });
    let mut library_writes = BTreeMap::new();
    library_writes.insert(slot, tile);
    WritePlan {
        map_writes: paint(map, cells, slot),
        library_writes,
        released: None,
    }
}
