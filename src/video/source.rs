//! Frame source abstraction
//!
//! A frame source maps a requested playback time to the decoded frame that
//! covers it. The FFmpeg implementation lives in `decoder.rs`; tests use an
//! in-memory source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::frame::{PixelFormat, VideoFrame};

/// Errors that can occur while opening or decoding a media source
#[derive(Debug, thiserror::Error)]
pub enum VideoDecoderError {
    /// Failed to open the media file
    #[error("Failed to open video file: {0}")]
    OpenFailed(String),
    /// No video stream found in the file
    #[error("No video stream found in file")]
    NoVideoStream,
    /// Failed to create decoder
    #[error("Failed to create decoder: {0}")]
    DecoderCreationFailed(String),
    /// Failed to create the RGBA scaler
    #[error("Failed to create scaler: {0}")]
    ScalerCreationFailed(String),
    /// Decoding error
    #[error("Decoding failed: {0}")]
    DecodeFailed(String),
    /// Error reported by FFmpeg
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Options applied when opening a media source
#[derive(Debug, Clone, PartialEq)]
pub struct MediaOptions {
    /// Pixel format every decoded frame is converted to
    pub pixel_format: PixelFormat,
    /// Have the demuxer drop packets of every stream but the video one
    pub video_only: bool,
    /// Requests further ahead than this seek instead of decoding forward
    pub seek_threshold: Duration,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgba8,
            video_only: true,
            seek_threshold: Duration::from_millis(500),
        }
    }
}

/// Stream metadata established when a source is opened
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration: Duration,
    /// Average frame rate (fps)
    pub frame_rate: f64,
    /// Whether the average rate differs from the stream's base rate
    pub variable_frame_rate: bool,
    pub codec_name: String,
    /// Pixel format the decoder produces before RGBA conversion
    pub source_pixel_format: String,
    /// Container bitrate in bits per second (0 if unknown)
    pub bit_rate: i64,
    /// Decoder reports a field order other than progressive
    pub interlaced: bool,
}

impl StreamInfo {
    /// Nominal duration of one frame, if the frame rate is known
    pub fn frame_duration(&self) -> Option<Duration> {
        if self.frame_rate > 0.0 {
            Some(Duration::from_secs_f64(1.0 / self.frame_rate))
        } else {
            None
        }
    }

    /// Log the stream details once, after a successful open
    pub fn log_summary(&self) {
        tracing::info!(
            path = %self.path.display(),
            width = self.width,
            height = self.height,
            duration_secs = self.duration.as_secs_f64(),
            bitrate_kbps = self.bit_rate as f64 / 1000.0,
            fps = self.frame_rate,
            frame_rate_mode = if self.variable_frame_rate { "average" } else { "constant" },
            codec = %self.codec_name,
            pixel_format = %self.source_pixel_format,
            interlaced = self.interlaced,
            "Video stream opened"
        );
    }
}

/// A decoded video stream that can be sampled by timestamp
pub trait FrameSource {
    /// Metadata for the opened stream
    fn info(&self) -> &StreamInfo;

    /// Return the frame covering `timestamp`.
    ///
    /// `Ok(None)` means no frame is available there (end of data).
    fn frame_at(&mut self, timestamp: Duration) -> Result<Option<VideoFrame<'_>>, VideoDecoderError>;
}

/// Opens frame sources from paths
pub trait MediaBackend {
    type Source: FrameSource;

    fn open(&mut self, path: &Path, options: &MediaOptions) -> Result<Self::Source, VideoDecoderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_error_display() {
        let err = VideoDecoderError::NoVideoStream;
        assert_eq!(err.to_string(), "No video stream found in file");
    }

    #[test]
    fn test_default_options_force_rgba() {
        let options = MediaOptions::default();
        assert_eq!(options.pixel_format, PixelFormat::Rgba8);
        assert!(options.video_only);
    }

    #[test]
    fn test_frame_duration() {
        let mut info = StreamInfo {
            path: PathBuf::from("clip.mp4"),
            width: 2,
            height: 2,
            duration: Duration::from_secs(1),
            frame_rate: 4.0,
            variable_frame_rate: false,
            codec_name: "h264".to_string(),
            source_pixel_format: "yuv420p".to_string(),
            bit_rate: 0,
            interlaced: false,
        };
        assert_eq!(info.frame_duration(), Some(Duration::from_millis(250)));
        info.frame_rate = 0.0;
        assert_eq!(info.frame_duration(), None);
    }
}
