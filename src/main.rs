use tilecast::{decode_file, encode_with_stats, Result};

fn main() -> Result<()> {
    println!("tilecast - Tile Stream Info\n");

    let path = std::env::args().nth(1).unwrap_or_else(|| "video.bin".to_string());
    let frames = decode_file(&path)?;

    println!("Decoded {} frames from {}", frames.len(), path);
    for (index, frame) in frames.iter().take(10).enumerate() {
        let (x, y) = frame.offsets();
        println!(
            "  Frame {:3}: offset ({:3}, {:3}), {} distinct tiles over {} cells",
            index,
            x,
            y,
            frame.tile_count(),
            frame.cells().len()
        );
    }
    if frames.len() > 10 {
        println!("  ... {} more", frames.len() - 10);
    }

    println!("\n--- Re-encoding ---");
    let (bytes, stats) = encode_with_stats(&frames)?;
    println!("Re-encoded to {} bytes", bytes.len());

    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("Could not render stats: {}", e),
    }

    Ok(())
}
