//! The greedy per-frame driver

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use crate::encoder::lifetime::FrameLifetime;
use crate::encoder::writes::{plan_writes, WritePlan};
use crate::error::{Error, Result};
use crate::hardware::{Screen, Tile, TileLibrary, TileMap};
use crate::types::{Cell, LIBRARY_SLOTS};

/// The writes one frame adds to the stream
///
/// A frame that matches its predecessor's offsets and produced no writes is
/// not represented by an update at all; the stream writer folds it into a
/// delay command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenUpdate {
    /// Viewport x offset
    pub x: u16,
    /// Viewport y offset
    pub y: u16,
    /// Pattern writes, keyed by slot
    pub library_writes: BTreeMap<u8, Tile>,
    /// Cell writes, keyed by cell
    pub map_writes: BTreeMap<Cell, u8>,
}

impl ScreenUpdate {
    fn new(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            library_writes: BTreeMap::new(),
            map_writes: BTreeMap::new(),
        }
    }

    /// Whether the update carries no writes
    pub fn is_empty(&self) -> bool {
        self.library_writes.is_empty() && self.map_writes.is_empty()
    }
}

/// Drives the simulated hardware through each target screen in turn
///
/// The encoder owns the mutable hardware mirrors. Frame N's committed state
/// is the input to frame N+1, so frames must be fed in display order.
pub struct FrameEncoder {
    library: TileLibrary,
    map: TileMap,
    pool: BTreeSet<Tile>,
    lifetime: FrameLifetime,
    committed_offsets: Option<(u16, u16)>,
    frame_index: usize,
}

impl FrameEncoder {
    /// Creates an encoder over blank hardware state
    pub fn new(lifetime: FrameLifetime) -> Self {
        Self {
            library: TileLibrary::new(),
            map: TileMap::new(),
            pool: BTreeSet::new(),
            lifetime,
            committed_offsets: None,
            frame_index: 0,
        }
    }

    /// The library state after the last committed frame
    pub fn library(&self) -> &TileLibrary {
        &self.library
    }

    /// The tilemap state after the last committed frame
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Tiles currently eligible for slot reclamation
    pub fn release_pool(&self) -> &BTreeSet<Tile> {
        &self.pool
    }

    /// Encodes the next frame, returning its update or `None` for a frame
    /// that is pure delay
    pub fn encode_frame(&mut self, screen: &Screen) -> Result<Option<ScreenUpdate>> {
        let frame = self.frame_index;
        if screen.tile_count() > LIBRARY_SLOTS {
            return Err(Error::TooManyUniqueTiles {
                frame,
                count: screen.tile_count(),
            });
        }

        let (x, y) = screen.offsets();
        let mut update = ScreenUpdate::new(x, y);
        let mut releases: Vec<Tile> = Vec::new();

        for (&tile, target) in screen.tile_positions() {
            // bucket the target cells by the slot they currently hold
            let mut by_old_slot: BTreeMap<u8, BTreeSet<Cell>> = BTreeMap::new();
            for &cell in target {
                by_old_slot.entry(self.map.slot_at(cell)).or_default().insert(cell);
            }

            for (&slot, inside) in &by_old_slot {
                if self.library.tile_at(slot) == tile {
                    continue;
                }
                self.encode_bucket(screen, tile, slot, inside, &mut update);
            }

            if self.lifetime.advance(&tile, frame) {
                releases.push(tile);
            }
        }

        // releases take effect after the frame commits, so a tile last used
        // here becomes reusable starting next frame
        self.pool.extend(releases);

        debug!(
            "frame {}: {} library writes, {} map writes, pool {}",
            frame,
            update.library_writes.len(),
            update.map_writes.len(),
            self.pool.len()
        );

        let same_offsets = self.committed_offsets == Some((x, y));
        self.committed_offsets = Some((x, y));
        self.frame_index += 1;

        if update.is_empty() && same_offsets {
            Ok(None)
        } else {
            Ok(Some(update))
        }
    }

    /// Resolves one (tile, old slot) bucket, committing the cheaper of the
    /// standard and swap plans
    fn encode_bucket(
        &mut self,
        screen: &Screen,
        tile: Tile,
        slot: u8,
        inside: &BTreeSet<Cell>,
        update: &mut ScreenUpdate,
    ) {
        let displaced = self.library.tile_at(slot);

        // visible cells that must keep showing the displaced tile if the
        // slot is rewritten in place
        let mut outside: BTreeSet<Cell> = BTreeSet::new();
        if let Some(wanted) = screen.cells_of(&displaced) {
            for &cell in self.map.positions(slot) {
                if !inside.contains(&cell)
                    && screen.cells().contains(&cell)
                    && wanted.contains(&cell)
                {
                    outside.insert(cell);
                }
            }
        }

        let standard = plan_writes(&self.library, &self.map, screen, &self.pool, tile, inside);

        // hypothetical: the slot already holds the new tile, and the
        // repair plan relocates the displaced tile's surviving cells
        let mut hypothetical = self.library.clone();
        hypothetical.set(slot, tile);
        let repair = if outside.is_empty() {
            WritePlan::default()
        } else if !hypothetical.contains(&displaced) && self.pool.contains(&displaced) {
            let mut simulated = self.pool.clone();
            simulated.remove(&displaced);
            plan_writes(&hypothetical, &self.map, screen, &simulated, displaced, &outside)
        } else {
            plan_writes(&hypothetical, &self.map, screen, &self.pool, displaced, &outside)
        };

        // TODO: cost by encoded byte size instead of write count
        let standard_cost = standard.write_count();
        let swap_cost = repair.write_count() + 1;

        if swap_cost < standard_cost {
            trace!(
                "swap {:?} into slot {} ({} writes against {})",
                tile,
                slot,
                swap_cost,
                standard_cost
            );
            self.apply_library_write(slot, tile, update);
            self.retire_if_slotless(displaced);
            self.apply_plan(&repair, update);
        } else {
            self.apply_plan(&standard, update);
        }
    }

    fn apply_plan(&mut self, plan: &WritePlan, update: &mut ScreenUpdate) {
        for (&slot, &tile) in &plan.library_writes {
            self.apply_library_write(slot, tile, update);
        }
        for (&cell, &slot) in &plan.map_writes {
            self.map.set(cell, slot);
            update.map_writes.insert(cell, slot);
        }
        // only the released-slot strategy can displace a pool tile, and it
        // reports which one it reused
        if let Some(released) = plan.released {
            self.retire_if_slotless(released);
        }
    }

    fn apply_library_write(&mut self, slot: u8, tile: Tile, update: &mut ScreenUpdate) {
        self.library.set(slot, tile);
        update.library_writes.insert(slot, tile);
    }

    /// Pool tiles are retired exactly when their last slot is overwritten
    fn retire_if_slotless(&mut self, tile: Tile) {
        if !self.library.contains(&tile) {
            self.pool.remove(&tile);
        }
    }
}
