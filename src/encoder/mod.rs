//! Encoder core: write planning, frame driving, and the session entry point

pub mod frame;
pub mod lifetime;
pub mod writes;

pub use frame::{FrameEncoder, ScreenUpdate};
pub use lifetime::{FrameLifetime, TileAppearanceIndex};
pub use writes::{plan_writes, WritePlan};

use log::debug;

use crate::error::{Error, Result};
use crate::hardware::FrameSource;
use crate::stats::EncodeStats;
use crate::stream::StreamWriter;

/// Encodes a frame sequence into the compressed stream
pub fn encode<S: FrameSource + ?Sized>(source: &S) -> Result<Vec<u8>> {
    encode_with_stats(source).map(|(bytes, _)| bytes)
}

/// Encodes a frame sequence, also returning session statistics
pub fn encode_with_stats<S: FrameSource + ?Sized>(
    source: &S,
) -> Result<(Vec<u8>, EncodeStats)> {
    let frames = source.frames();
    if frames.is_empty() {
        return Err(Error::EmptyInput);
    }

    let lifetime = FrameLifetime::new(TileAppearanceIndex::build(frames));
    let mut encoder = FrameEncoder::new(lifetime);
    let mut writer = StreamWriter::new();
    let mut stats = EncodeStats {
        frames: frames.len(),
        ..Default::default()
    };

    for screen in frames {
        let update = encoder.encode_frame(screen)?;
        match &update {
            Some(update) => {
                stats.updates += 1;
                stats.library_writes += update.library_writes.len();
                stats.map_writes += update.map_writes.len();
            }
            None => stats.null_frames += 1,
        }
        writer.push(update.as_ref());
    }

    let bytes = writer.finish();
    stats.stream_bytes = bytes.len();
    debug!(
        "encoded {} frames into {} bytes ({} updates, {} null)",
        stats.frames, stats.stream_bytes, stats.updates, stats.null_frames
    );
    Ok((bytes, stats))
}
