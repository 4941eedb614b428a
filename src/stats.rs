//! Encoding statistics

use serde::Serialize;

/// Totals gathered over one encoding session
#[derive(Debug, Clone, Default, Serialize)]
pub struct EncodeStats {
    /// Frames consumed from the source
    pub frames: usize,
    /// Frames that produced an update command
    pub updates: usize,
    /// Frames folded into delay commands
    pub null_frames: usize,
    /// Total pattern writes across all updates
    pub library_writes: usize,
    /// Total cell writes across all updates
    pub map_writes: usize,
    /// Length of the finished stream in bytes
    pub stream_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialize() {
        let stats = EncodeStats {
            frames: 3,
            updates: 2,
            null_frames: 1,
            library_writes: 4,
            map_writes: 9,
            stream_bytes: 120,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"frames\":3"));
        assert!(json.contains("\"stream_bytes\":120"));
    }
}
