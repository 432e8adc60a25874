//! Player settings
//!
//! Handles loading/saving of the player's XML settings file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};

use crate::telemetry::accumulator::DEFAULT_SAMPLE_CAP;
use crate::video::{EndOfStreamPolicy, MediaOptions, PlaybackConfig};

fn default_title() -> String {
    "video-texture".to_string()
}

fn default_window_width() -> u32 {
    960
}

fn default_window_height() -> u32 {
    540
}

fn default_sample_cap() -> u32 {
    DEFAULT_SAMPLE_CAP
}

fn default_video_only() -> bool {
    true
}

fn default_seek_threshold_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Window, playback and logging preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "VideoTextureSettings")]
pub struct PlayerSettings {
    /// Window title
    #[serde(rename = "title", default = "default_title")]
    pub title: String,

    /// Initial window width
    #[serde(rename = "windowWidth", default = "default_window_width")]
    pub window_width: u32,

    /// Initial window height
    #[serde(rename = "windowHeight", default = "default_window_height")]
    pub window_height: u32,

    /// Start in borderless fullscreen
    #[serde(rename = "fullscreen", default)]
    pub fullscreen: bool,

    /// Video to play when none is given on the command line
    #[serde(rename = "videoPath", default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    /// Behaviour when playback time passes the end of the stream
    #[serde(rename = "endOfStream", default)]
    pub end_of_stream: EndOfStreamPolicy,

    /// Applied frames to profile after each load (0 disables)
    #[serde(rename = "statsSampleCap", default = "default_sample_cap")]
    pub stats_sample_cap: u32,

    /// Skip non-video streams while demuxing
    #[serde(rename = "videoOnly", default = "default_video_only")]
    pub video_only: bool,

    /// Forward distance beyond which the decoder seeks instead of decoding through
    #[serde(rename = "seekThresholdMs", default = "default_seek_threshold_ms")]
    pub seek_threshold_ms: u64,

    /// Default tracing filter when no environment override is set
    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            fullscreen: false,
            video_path: None,
            end_of_stream: EndOfStreamPolicy::default(),
            stats_sample_cap: default_sample_cap(),
            video_only: default_video_only(),
            seek_threshold_ms: default_seek_threshold_ms(),
            log_level: default_log_level(),
        }
    }
}

impl PlayerSettings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("video-texture");
            p.push("settings.xml");
            p
        })
    }

    /// Load settings from an XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let mut settings: Self = from_str(&contents)?;

        // Ensure sane minimums.
        settings.window_width = settings.window_width.max(1);
        settings.window_height = settings.window_height.max(1);

        Ok(settings)
    }

    /// Load from `path`, falling back to defaults if the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save settings to an XML file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let xml = to_string(self)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        fs::write(path, formatted)?;
        Ok(())
    }

    /// Playback controller configuration derived from these settings
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            media: MediaOptions {
                video_only: self.video_only,
                seek_threshold: Duration::from_millis(self.seek_threshold_ms),
                ..MediaOptions::default()
            },
            end_of_stream: self.end_of_stream,
            sample_cap: self.stats_sample_cap,
        }
    }
}

/// Errors reading or writing the settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.window_width, 960);
        assert_eq!(settings.window_height, 540);
        assert!(!settings.fullscreen);
        assert_eq!(settings.end_of_stream, EndOfStreamPolicy::Loop);
        assert_eq!(settings.stats_sample_cap, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.xml");

        let settings = PlayerSettings {
            title: "Lobby Wall".to_string(),
            fullscreen: true,
            video_path: Some("/media/loop.mp4".to_string()),
            end_of_stream: EndOfStreamPolicy::Clamp,
            seek_threshold_ms: 250,
            ..PlayerSettings::default()
        };
        settings.save_to_file(&path).unwrap();

        let loaded = PlayerSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        fs::write(
            &path,
            "<VideoTextureSettings><windowWidth>0</windowWidth><endOfStream>stop</endOfStream></VideoTextureSettings>",
        )
        .unwrap();

        let loaded = PlayerSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded.window_width, 1);
        assert_eq!(loaded.window_height, 540);
        assert_eq!(loaded.end_of_stream, EndOfStreamPolicy::Stop);
        assert!(loaded.video_only);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = PlayerSettings::load_or_default(&dir.path().join("absent.xml")).unwrap();
        assert_eq!(loaded, PlayerSettings::default());
    }

    #[test]
    fn test_playback_config() {
        let settings = PlayerSettings {
            stats_sample_cap: 0,
            seek_threshold_ms: 1000,
            end_of_stream: EndOfStreamPolicy::Wrap,
            ..PlayerSettings::default()
        };
        let config = settings.playback_config();
        assert_eq!(config.sample_cap, 0);
        assert_eq!(config.media.seek_threshold, Duration::from_secs(1));
        assert_eq!(config.end_of_stream, EndOfStreamPolicy::Wrap);
    }
}
