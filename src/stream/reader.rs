//! Decoding the byte stream back into screens
//!
//! The reader drives the same simulated hardware the encoder ran, so a
//! stream replays into exactly the screens that produced it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::hardware::{viewport_cells, Screen, Tile, TileLibrary, TileMap, TILE_BYTES};
use crate::stream::cursor::StreamCursor;
use crate::stream::{DELAY_WORD, END_MARKER};
use crate::types::{
    Cell, CELL_COUNT, LIBRARY_SLOTS, MAP_COLS, MAP_ROWS, VIRTUAL_HEIGHT, VIRTUAL_WIDTH,
};

/// Incremental stream decoder
///
/// Yields one screen per call to [`StreamReader::next_screen`]: updates
/// produce the screen they materialize, delay commands repeat the current
/// screen. Anything after the end marker is ignored.
pub struct StreamReader<'a> {
    cursor: StreamCursor<'a>,
    library: TileLibrary,
    map: TileMap,
    x: u16,
    y: u16,
    pending_repeats: u16,
    current: Option<Arc<Screen>>,
    done: bool,
}

impl<'a> StreamReader<'a> {
    /// Creates a reader over a complete stream
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: StreamCursor::new(data),
            library: TileLibrary::new(),
            map: TileMap::new(),
            x: 0,
            y: 0,
            pending_repeats: 0,
            current: None,
            done: false,
        }
    }

    /// Decodes the next screen, or `None` at the end marker
    pub fn next_screen(&mut self) -> Result<Option<Arc<Screen>>> {
        if self.pending_repeats > 0 {
            self.pending_repeats -= 1;
            return Ok(Some(self.current_screen()));
        }
        if self.done {
            return Ok(None);
        }

        let start = self.cursor.offset();
        let word = self.cursor.read_u16()?;

        if word == END_MARKER[0] {
            let second = self.cursor.read_u16()?;
            if second != END_MARKER[1] {
                return Err(Error::CorruptStream {
                    offset: start,
                    detail: format!("bad end marker word 0x{:04X}", second),
                });
            }
            self.done = true;
            return Ok(None);
        }

        if word == DELAY_WORD {
            let count = self.cursor.read_u16()?;
            if count == 0 {
                return Err(Error::InvalidDelay { offset: start });
            }
            self.pending_repeats = count - 1;
            return Ok(Some(self.current_screen()));
        }

        self.read_update(start, word)?;
        let screen = self.materialize();
        self.current = Some(screen.clone());
        Ok(Some(screen))
    }

    fn read_update(&mut self, start: usize, x: u16) -> Result<()> {
        if x >= VIRTUAL_WIDTH {
            return Err(Error::CorruptStream {
                offset: start,
                detail: format!("x offset {} out of range", x),
            });
        }
        let y = self.cursor.read_u16()?;
        if y >= VIRTUAL_HEIGHT {
            return Err(Error::CorruptStream {
                offset: start,
                detail: format!("y offset {} out of range", y),
            });
        }
        let library_count = self.cursor.read_u16()?;
        if library_count as usize > LIBRARY_SLOTS {
            return Err(Error::CorruptStream {
                offset: start,
                detail: format!("{} library writes exceed 256", library_count),
            });
        }
        let map_count = self.cursor.read_u16()?;
        if map_count as usize > CELL_COUNT {
            return Err(Error::CorruptStream {
                offset: start,
                detail: format!("{} map writes exceed 5000", map_count),
            });
        }

        for _ in 0..library_count {
            let record = self.cursor.offset();
            let header = self.cursor.read_bytes(4)?;
            if header[1] != 0 || header[2] != 0 || header[3] != 0 {
                return Err(Error::CorruptStream {
                    offset: record,
                    detail: "nonzero high bytes in slot index".to_string(),
                });
            }
            let slot = header[0];
            let pattern = self.cursor.read_bytes(TILE_BYTES)?;
            let tile = Tile::from_bytes(pattern).map_err(|_| Error::CorruptStream {
                offset: record,
                detail: "short tile pattern".to_string(),
            })?;
            self.library.set(slot, tile);
        }

        for _ in 0..map_count {
            let record = self.cursor.offset();
            let bytes = self.cursor.read_bytes(4)?;
            let (row, col, slot, pad) = (bytes[0], bytes[1], bytes[2], bytes[3]);
            if row as usize >= MAP_ROWS || col as usize >= MAP_COLS || pad != 0 {
                return Err(Error::CorruptStream {
                    offset: record,
                    detail: format!("bad map write ({}, {}, {}, {})", row, col, slot, pad),
                });
            }
            let cell = Cell::new(row, col).map_err(|_| Error::CorruptStream {
                offset: record,
                detail: format!("cell ({}, {}) out of range", row, col),
            })?;
            self.map.set(cell, slot);
        }

        self.x = x;
        self.y = y;
        Ok(())
    }

    fn current_screen(&mut self) -> Arc<Screen> {
        match &self.current {
            Some(screen) => screen.clone(),
            None => {
                let screen = self.materialize();
                self.current = Some(screen.clone());
                screen
            }
        }
    }

    /// Builds a screen from the hardware state restricted to the viewport
    fn materialize(&self) -> Arc<Screen> {
        let mut tile_positions: BTreeMap<Tile, BTreeSet<Cell>> = BTreeMap::new();
        for cell in viewport_cells(self.x, self.y) {
            let tile = self.library.tile_at(self.map.slot_at(cell));
            tile_positions.entry(tile).or_default().insert(cell);
        }
        Arc::new(Screen::new(self.x, self.y, tile_positions))
    }
}

/// Decodes a complete stream into its screen sequence
pub fn decode(data: &[u8]) -> Result<Vec<Arc<Screen>>> {
    let mut reader = StreamReader::new(data);
    let mut frames = Vec::new();
    while let Some(screen) = reader.next_screen()? {
        frames.push(screen);
    }
    Ok(frames)
}

/// Memory-maps a stream file and decodes it
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Vec<Arc<Screen>>> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    #[cfg(unix)]
    unsafe {
        libc::madvise(
            mmap.as_ptr() as *mut libc::c_void,
            mmap.len(),
            libc::MADV_SEQUENTIAL | libc::MADV_WILLNEED,
        );
    }

    decode(&mmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    const END: [u8; 4] = [0xEF, 0xBE, 0xFE, 0xCA];

    #[test]
    fn test_decode_blank_update() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&END);
        let frames = decode(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].offsets(), (0, 0));
        assert_eq!(frames[0].tile_count(), 1);
        assert!(frames[0].has_tile(&Tile::BLANK));
    }

    #[test]
    fn test_decode_delay_repeats_screen() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[0xBE, 0xBA, 0x03, 0x00]);
        bytes.extend_from_slice(&END);
        let frames = decode(&bytes).unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], frames[3]);
    }

    #[test]
    fn test_decode_library_and_map_write() {
        let mut bytes = Vec::new();
        // update at (0, 0): one library write, one map write
        bytes.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
        bytes.extend_from_slice(&[7, 0, 0, 0]);
        bytes.extend_from_slice(&[0xFF; 12]);
        bytes.extend_from_slice(&[4, 9, 7, 0]);
        bytes.extend_from_slice(&END);

        let frames = decode(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        let cell = Cell::new(4, 9).unwrap();
        assert_eq!(
            frames[0].cells_of(&Tile::FULL),
            Some(&[cell].into_iter().collect())
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&END);
        bytes.extend_from_slice(&[0xAB, 0xCD, 0xEF]);
        assert_eq!(decode(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_delay_rejected() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[0xBE, 0xBA, 0x00, 0x00]);
        bytes.extend_from_slice(&END);
        match decode(&bytes) {
            Err(Error::InvalidDelay { offset }) => assert_eq!(offset, 8),
            other => panic!("expected InvalidDelay, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_out_of_range_x_rejected() {
        // 800 is the lowest invalid x offset
        let bytes = [0x20, 0x03, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode(&bytes),
            Err(Error::CorruptStream { offset: 0, .. })
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let bytes = [0u8; 6];
        assert!(matches!(decode(&bytes), Err(Error::CorruptStream { .. })));
    }

    #[test]
    fn test_bad_end_marker_rejected() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[0xEF, 0xBE, 0x00, 0x00]);
        assert!(matches!(decode(&bytes), Err(Error::CorruptStream { .. })));
    }

    #[test]
    fn test_bad_map_record_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1, 0]);
        bytes.extend_from_slice(&[50, 0, 3, 0]); // row out of range
        bytes.extend_from_slice(&END);
        assert!(matches!(
            decode(&bytes),
            Err(Error::CorruptStream { offset: 8, .. })
        ));
    }

    #[test]
    fn test_nonzero_slot_padding_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0, 0, 0, 1, 0, 0, 0]);
        bytes.extend_from_slice(&[7, 1, 0, 0]);
        bytes.extend_from_slice(&[0xFF; 12]);
        bytes.extend_from_slice(&END);
        assert!(matches!(
            decode(&bytes),
            Err(Error::CorruptStream { offset: 8, .. })
        ));
    }

    #[test]
    fn test_empty_stream_is_no_frames() {
        assert!(decode(&END).unwrap().is_empty());
    }

    #[test]
    fn test_reader_hardware_stays_consistent() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0, 0, 0, 1, 0, 2, 0]);
        bytes.extend_from_slice(&[3, 0, 0, 0]);
        bytes.extend_from_slice(&[0xFF; 12]);
        bytes.extend_from_slice(&[0, 0, 3, 0]);
        bytes.extend_from_slice(&[1, 1, 3, 0]);
        bytes.extend_from_slice(&[16, 0, 12, 0, 0, 0, 1, 0]);
        bytes.extend_from_slice(&[2, 2, 3, 0]);
        bytes.extend_from_slice(&END);

        let mut reader = StreamReader::new(&bytes);
        while reader.next_screen().unwrap().is_some() {
            let mut total = 0;
            for slot in 0..LIBRARY_SLOTS {
                let slot = slot as u8;
                for cell in reader.map.positions(slot) {
                    assert_eq!(reader.map.slot_at(*cell), slot);
                }
                total += reader.map.use_count(slot);
                let tile = reader.library.tile_at(slot);
                assert!(reader.library.slots_of(&tile).unwrap().contains(&slot));
            }
            assert_eq!(total, CELL_COUNT);
        }
    }

    #[test]
    fn test_reader_stops_at_end_marker() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&END);
        let mut reader = StreamReader::new(&bytes);
        assert!(reader.next_screen().unwrap().is_some());
        assert!(reader.next_screen().unwrap().is_none());
        // repeated polls stay at the end
        assert!(reader.next_screen().unwrap().is_none());
    }

    #[test]
    fn test_leading_delay_repeats_blank_screen() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0xBE, 0xBA, 0x02, 0x00]);
        bytes.extend_from_slice(&END);
        let frames = decode(&bytes).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].offsets(), (0, 0));
        assert!(frames[0].has_tile(&Tile::BLANK));
    }

    #[test]
    fn test_decode_file_round_trip() {
        use std::io::Write;

        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[0xBE, 0xBA, 0x02, 0x00]);
        bytes.extend_from_slice(&END);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let frames = decode_file(file.path()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], frames[2]);
    }
}
