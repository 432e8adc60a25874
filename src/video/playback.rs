//! Playback clock controller
//!
//! [`VideoTexture`] ties a frame source to a GPU texture. The host calls
//! [`VideoTexture::update`] once per rendered frame with its wall-clock time;
//! the controller decides whether a new frame is needed, decodes it, flips it
//! bottom-up and replaces the texture contents.
//!
//! States are `Unloaded` and `Loaded`. An update runs entirely inside
//! `&mut self`, so updates can never overlap.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::frame::PixelFormat;
use super::normalize::flip_rows;
use super::source::{FrameSource, MediaBackend, MediaOptions, StreamInfo, VideoDecoderError};
use super::texture::{TextureError, TextureSink, TextureSpec};
use crate::telemetry::accumulator::{PerformanceAccumulator, Phase, UpdateCounts, DEFAULT_SAMPLE_CAP};

/// What to do when the requested time is past the end of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfStreamPolicy {
    /// Jump back to zero
    #[default]
    Loop,
    /// Use the requested time modulo the duration
    Wrap,
    /// Hold the final frame
    Clamp,
    /// Ignore the update
    Stop,
}

impl EndOfStreamPolicy {
    /// Map a requested time onto the stream, `None` if nothing should play.
    ///
    /// `frame_duration` places the start of the last frame for `Clamp`.
    pub fn resolve(self, time: Duration, duration: Duration, frame_duration: Duration) -> Option<Duration> {
        if time <= duration {
            return Some(time);
        }
        match self {
            EndOfStreamPolicy::Loop => Some(Duration::ZERO),
            EndOfStreamPolicy::Wrap => {
                if duration.is_zero() {
                    Some(Duration::ZERO)
                } else {
                    let nanos = time.as_nanos() % duration.as_nanos();
                    Some(Duration::from_nanos(nanos as u64))
                }
            }
            EndOfStreamPolicy::Clamp => Some(duration.saturating_sub(frame_duration)),
            EndOfStreamPolicy::Stop => None,
        }
    }
}

/// Errors that leave the controller unloaded
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Decoder(#[from] VideoDecoderError),
    #[error("failed to allocate video texture: {0}")]
    Texture(#[from] TextureError),
}

/// Why an update left the texture untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source had no frame for the requested time
    Empty,
    /// The source returned the frame that is already applied
    Duplicate,
    /// The source failed or produced an unreadable frame
    DecodeError,
}

/// Result of a single [`VideoTexture::update`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NotLoaded,
    /// Same timestamp as the last applied frame
    Unchanged,
    /// Past the end of the stream with [`EndOfStreamPolicy::Stop`]
    Stopped,
    Skipped(SkipReason),
    /// The texture sink rejected the upload
    UploadFailed,
    Applied,
}

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Unloaded,
    Loaded,
}

/// Per-stream playback bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Playback time of the frame currently in the texture
    pub applied_time: Option<Duration>,
    /// Stream position of the frame currently in the texture
    pub applied_position: Option<Duration>,
    pub applied_frames: u64,
    /// Updates where the source had no data (end of stream, errors)
    pub skipped_empty: u64,
    /// Updates where the source had not advanced
    pub skipped_duplicate: u64,
    /// Subset of `skipped_empty` caused by decode failures
    pub decode_errors: u64,
    pub upload_errors: u64,
}

impl PlaybackState {
    /// Total skipped updates
    pub fn skipped(&self) -> u64 {
        self.skipped_empty + self.skipped_duplicate
    }

    fn counts(&self) -> UpdateCounts {
        UpdateCounts {
            applied: self.applied_frames,
            skipped: self.skipped(),
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub media: MediaOptions,
    pub end_of_stream: EndOfStreamPolicy,
    /// Applied updates to profile after each load (0 disables)
    pub sample_cap: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            media: MediaOptions::default(),
            end_of_stream: EndOfStreamPolicy::default(),
            sample_cap: DEFAULT_SAMPLE_CAP,
        }
    }
}

struct LoadedStream<Src, H> {
    source: Src,
    info: StreamInfo,
    texture: H,
    playback: PlaybackState,
    stats: PerformanceAccumulator,
}

enum StreamState<Src, H> {
    Unloaded,
    Loaded(LoadedStream<Src, H>),
}

impl<Src: FrameSource, H: Copy> LoadedStream<Src, H> {
    fn apply<S: TextureSink<Handle = H>>(&mut self, sink: &mut S, time: Duration) -> UpdateOutcome {
        let recording = self.stats.is_recording();
        let started = recording.then(Instant::now);

        let frame = match self.source.frame_at(time) {
            Ok(Some(frame)) if !frame.is_empty() => frame,
            Ok(_) => {
                self.playback.skipped_empty += 1;
                tracing::trace!(?time, "No frame at requested time");
                return UpdateOutcome::Skipped(SkipReason::Empty);
            }
            Err(e) => {
                self.playback.skipped_empty += 1;
                self.playback.decode_errors += 1;
                tracing::debug!(?time, error = %e, "Frame decode failed, skipping");
                return UpdateOutcome::Skipped(SkipReason::DecodeError);
            }
        };
        let decode_time = started.map(|s| s.elapsed());

        if self.playback.applied_position == Some(frame.position) {
            self.playback.skipped_duplicate += 1;
            return UpdateOutcome::Skipped(SkipReason::Duplicate);
        }
        let position = frame.position;

        let flip_start = recording.then(Instant::now);
        let normalized = match flip_rows(frame.data, frame.stride, self.info.width, self.info.height) {
            Ok(normalized) => normalized,
            Err(e) => {
                self.playback.skipped_empty += 1;
                self.playback.decode_errors += 1;
                tracing::debug!(?time, error = %e, "Unreadable frame layout, skipping");
                return UpdateOutcome::Skipped(SkipReason::DecodeError);
            }
        };
        let flip_time = flip_start.map(|s| s.elapsed());

        let copy_start = recording.then(Instant::now);
        if let Err(e) = sink.upload_sub_image(
            self.texture,
            normalized.width,
            normalized.height,
            PixelFormat::Rgba8,
            &normalized.data,
        ) {
            self.playback.upload_errors += 1;
            tracing::warn!(?time, error = %e, "Texture upload failed");
            return UpdateOutcome::UploadFailed;
        }
        let copy_time = copy_start.map(|s| s.elapsed());

        self.playback.applied_time = Some(time);
        self.playback.applied_position = Some(position);
        self.playback.applied_frames += 1;
        tracing::trace!(?time, ?position, frame = self.playback.applied_frames, "Applied frame");

        if let (Some(started), Some(decode), Some(flip), Some(copy)) = (started, decode_time, flip_time, copy_time) {
            self.stats.record(Phase::Decode, decode);
            self.stats.record(Phase::Flip, flip);
            self.stats.record(Phase::Copy, copy);
            self.stats.record(Phase::Total, started.elapsed());
            self.stats.sample(self.playback.counts());
        }

        UpdateOutcome::Applied
    }
}

/// A video stream rendered into a single GPU texture
pub struct VideoTexture<M: MediaBackend, S: TextureSink> {
    backend: M,
    sink: S,
    config: PlaybackConfig,
    stream: StreamState<M::Source, S::Handle>,
}

impl<M: MediaBackend, S: TextureSink> VideoTexture<M, S> {
    pub fn new(backend: M, sink: S) -> Self {
        Self::with_config(backend, sink, PlaybackConfig::default())
    }

    pub fn with_config(backend: M, sink: S, config: PlaybackConfig) -> Self {
        Self {
            backend,
            sink,
            config,
            stream: StreamState::Unloaded,
        }
    }

    /// Open `path`, replacing any loaded stream.
    ///
    /// Failures are logged and leave the controller unloaded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error loading video");
                false
            }
        }
    }

    /// Open `path`, replacing any loaded stream
    pub fn try_load(&mut self, path: impl AsRef<Path>) -> Result<StreamInfo, LoadError> {
        self.dispose();

        let source = self.backend.open(path.as_ref(), &self.config.media)?;
        let info = source.info().clone();
        // On failure the source is dropped here, closing the media file
        let texture = self.sink.create_texture(&TextureSpec::video(info.width, info.height))?;

        info.log_summary();
        self.stream = StreamState::Loaded(LoadedStream {
            source,
            info: info.clone(),
            texture,
            playback: PlaybackState::default(),
            stats: PerformanceAccumulator::new(self.config.sample_cap),
        });
        Ok(info)
    }

    /// Bring the texture up to date with `current_time`
    pub fn update(&mut self, current_time: Duration) -> UpdateOutcome {
        let StreamState::Loaded(stream) = &mut self.stream else {
            return UpdateOutcome::NotLoaded;
        };

        let frame_duration = stream.info.frame_duration().unwrap_or_default();
        let Some(time) = self
            .config
            .end_of_stream
            .resolve(current_time, stream.info.duration, frame_duration)
        else {
            return UpdateOutcome::Stopped;
        };
        if stream.playback.applied_time == Some(time) {
            return UpdateOutcome::Unchanged;
        }

        stream.apply(&mut self.sink, time)
    }

    /// Bind the video texture to `unit` for drawing
    pub fn bind(&mut self, unit: u32) {
        if let StreamState::Loaded(stream) = &self.stream {
            self.sink.bind(stream.texture, unit);
        }
    }

    /// Release the texture and media source. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let StreamState::Loaded(stream) = std::mem::replace(&mut self.stream, StreamState::Unloaded) {
            self.sink.destroy_texture(stream.texture);
            tracing::debug!(path = %stream.info.path.display(), "Video texture disposed");
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        match self.stream {
            StreamState::Unloaded => PlaybackStatus::Unloaded,
            StreamState::Loaded(_) => PlaybackStatus::Loaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status() == PlaybackStatus::Loaded
    }

    pub fn info(&self) -> Option<&StreamInfo> {
        match &self.stream {
            StreamState::Loaded(stream) => Some(&stream.info),
            StreamState::Unloaded => None,
        }
    }

    /// Video width in pixels (0 when unloaded)
    pub fn width(&self) -> u32 {
        self.info().map_or(0, |info| info.width)
    }

    /// Video height in pixels (0 when unloaded)
    pub fn height(&self) -> u32 {
        self.info().map_or(0, |info| info.height)
    }

    /// Stream duration (zero when unloaded)
    pub fn duration(&self) -> Duration {
        self.info().map_or(Duration::ZERO, |info| info.duration)
    }

    pub fn state(&self) -> Option<&PlaybackState> {
        match &self.stream {
            StreamState::Loaded(stream) => Some(&stream.playback),
            StreamState::Unloaded => None,
        }
    }

    pub fn performance(&self) -> Option<&PerformanceAccumulator> {
        match &self.stream {
            StreamState::Loaded(stream) => Some(&stream.stats),
            StreamState::Unloaded => None,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Change the end-of-stream policy for subsequent updates
    pub fn set_end_of_stream(&mut self, policy: EndOfStreamPolicy) {
        self.config.end_of_stream = policy;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn backend(&self) -> &M {
        &self.backend
    }
}

impl<M: MediaBackend, S: TextureSink> Drop for VideoTexture<M, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
