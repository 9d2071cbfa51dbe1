//! Replay a recorded detection sequence through the tracker
//!
//! Usage: replay_frames <frames.json> [config.json]
//!
//! `frames.json` holds a list of `{"time_lag": .., "detections": [..]}`
//! objects with nuScenes-style detections. Tracks of each frame are printed
//! as JSON lines.

use anyhow::{Context, Result};
use centertrack::{CenterTracker, Frame, TrackerConfig};
use std::fs::File;
use std::io::BufReader;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames_path = args
        .next()
        .context("usage: replay_frames <frames.json> [config.json]")?;

    let config = match args.next() {
        Some(path) => TrackerConfig::from_path(&path)
            .with_context(|| format!("failed to load tracker config from {path}"))?,
        None => TrackerConfig::default(),
    };

    let file = File::open(&frames_path).with_context(|| format!("failed to open {frames_path}"))?;
    let frames: Vec<Frame> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse frames from {frames_path}"))?;

    let mut tracker = CenterTracker::new(config)?;
    for class in tracker.class_table().iter() {
        log::info!("Tracking '{}' with a {:.1} m gate", class.name, class.max_distance);
    }
    let start = std::time::Instant::now();
    let mut total_tracks = 0usize;

    for (frame_idx, frame) in frames.iter().enumerate() {
        let tracks = tracker
            .process_frame(&frame.detections, frame.time_lag)
            .with_context(|| format!("frame {frame_idx}"))?;
        total_tracks += tracks.len();

        for track in &tracks {
            println!("{}", serde_json::to_string(track)?);
        }
        log::debug!("Frame {frame_idx}: {} tracks", tracks.len());
    }

    log::info!(
        "Replayed {} frames in {:?}, {} track records, {} live tracks at the end",
        frames.len(),
        start.elapsed(),
        total_tracks,
        tracker.num_tracks()
    );

    Ok(())
}
