//! Example: Drive a video texture without a window
//!
//! Usage: cargo run --example probe_video -- <video_file> [--seconds 3] [--fps 60]
//!
//! Loads the video into a headless GPU texture, steps the playback clock at a
//! fixed rate and reports what each update did.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use video_texture::telemetry::{init_logging, LogConfig};
use video_texture::video::{FfmpegBackend, UpdateOutcome, VideoTexture, WgpuTextureSink};
use video_texture::{GpuContext, PlaybackConfig};

#[derive(Parser, Debug)]
struct Args {
    /// Video file to probe
    video: PathBuf,

    /// Playback time to simulate
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,

    /// Simulated display refresh rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&LogConfig::default())?;

    let gpu = Arc::new(pollster::block_on(GpuContext::headless())?);
    let sink = WgpuTextureSink::new(Arc::clone(&gpu));
    let mut video = VideoTexture::with_config(FfmpegBackend, sink, PlaybackConfig::default());
    video.try_load(&args.video)?;

    let step = Duration::from_secs_f64(1.0 / args.fps);
    let steps = (args.seconds * args.fps).ceil() as u32;
    let (mut applied, mut unchanged, mut skipped, mut failed) = (0u32, 0u32, 0u32, 0u32);

    for i in 0..steps {
        match video.update(step * i) {
            UpdateOutcome::Applied => applied += 1,
            UpdateOutcome::Unchanged => unchanged += 1,
            UpdateOutcome::Skipped(_) | UpdateOutcome::Stopped => skipped += 1,
            UpdateOutcome::UploadFailed | UpdateOutcome::NotLoaded => failed += 1,
        }
        video.bind(0);
    }
    gpu.queue.submit(std::iter::empty());

    println!("Updates: {}", steps);
    println!("  applied:   {}", applied);
    println!("  unchanged: {}", unchanged);
    println!("  skipped:   {}", skipped);
    println!("  failed:    {}", failed);
    if let Some(state) = video.state() {
        println!("Playback state: {:?}", state);
    }
    if let Some(summary) = video.performance().and_then(|p| p.summary()) {
        println!(
            "Warm-up averages over {} frames: decode {:.2}ms, flip {:.2}ms, copy {:.2}ms, total {:.2}ms",
            summary.samples,
            summary.avg_decode.as_secs_f64() * 1000.0,
            summary.avg_flip.as_secs_f64() * 1000.0,
            summary.avg_copy.as_secs_f64() * 1000.0,
            summary.avg_total.as_secs_f64() * 1000.0,
        );
    }

    Ok(())
}
