//! Video Texture - Main Entry Point
//!
//! Plays a video file in a window: decode, flip, upload, draw.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};

use video_texture::telemetry::{init_logging, LogConfig};
use video_texture::{EndOfStreamPolicy, PlayerScene, PlayerSettings, WindowOptions};

/// End-of-stream behaviour accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Loop,
    Wrap,
    Clamp,
    Stop,
}

impl From<PolicyArg> for EndOfStreamPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Loop => EndOfStreamPolicy::Loop,
            PolicyArg::Wrap => EndOfStreamPolicy::Wrap,
            PolicyArg::Clamp => EndOfStreamPolicy::Clamp,
            PolicyArg::Stop => EndOfStreamPolicy::Stop,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Play a video file onto a full-window texture")]
struct Args {
    /// Video file to play (defaults to the settings file's videoPath)
    video: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// What to do when playback passes the end of the video
    #[arg(long, value_enum)]
    end_of_stream: Option<PolicyArg>,

    /// Start in borderless fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// Applied frames to profile after loading (0 disables)
    #[arg(long)]
    stats_samples: Option<u32>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,
}

impl Args {
    /// Apply command line overrides on top of `settings`
    fn apply(&self, settings: &mut PlayerSettings) {
        if let Some(video) = &self.video {
            settings.video_path = Some(video.display().to_string());
        }
        if let Some(policy) = self.end_of_stream {
            settings.end_of_stream = policy.into();
        }
        if self.fullscreen {
            settings.fullscreen = true;
        }
        if let Some(title) = &self.title {
            settings.title = title.clone();
        }
        if let Some(samples) = self.stats_samples {
            settings.stats_sample_cap = samples;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings_path = args.settings.clone().or_else(PlayerSettings::default_path);
    let mut settings = match &settings_path {
        Some(path) => PlayerSettings::load_or_default(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => PlayerSettings::default(),
    };
    args.apply(&mut settings);

    let _log_guard = init_logging(&LogConfig {
        file_path: args.log_file.clone(),
        json_format: args.log_json,
        default_level: settings.log_level.clone(),
        ..LogConfig::default()
    })?;

    if args.save_settings {
        let path = settings_path
            .as_ref()
            .ok_or_else(|| anyhow!("No settings path available"))?;
        settings.save_to_file(path)?;
        tracing::info!(path = %path.display(), "Settings saved");
    }

    let video = settings
        .video_path
        .clone()
        .ok_or_else(|| anyhow!("No video given on the command line or in the settings file"))?;
    tracing::info!(video = %video, policy = ?settings.end_of_stream, "Starting playback");

    let scene = PlayerScene::new(video, settings.playback_config());
    video_texture::app::run(WindowOptions::from(&settings), scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["video-texture", "clip.mp4", "--end-of-stream", "clamp", "--fullscreen"]);
        let mut settings = PlayerSettings::default();
        args.apply(&mut settings);
        assert_eq!(settings.video_path.as_deref(), Some("clip.mp4"));
        assert_eq!(settings.end_of_stream, EndOfStreamPolicy::Clamp);
        assert!(settings.fullscreen);
        assert_eq!(settings.window_width, 960);
    }

    #[test]
    fn test_no_overrides_keeps_settings() {
        let args = Args::parse_from(["video-texture"]);
        let mut settings = PlayerSettings {
            video_path: Some("/media/wall.mov".to_string()),
            end_of_stream: EndOfStreamPolicy::Stop,
            ..PlayerSettings::default()
        };
        let before = settings.clone();
        args.apply(&mut settings);
        assert_eq!(settings, before);
    }
}
