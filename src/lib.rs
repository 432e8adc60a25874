//! Video Texture Library
//!
//! Real-time playback of a video file into a GPU texture drawn on a
//! full-window quad. The playback controller ([`VideoTexture`]) is
//! independent of the window host and of the decoder backend.

pub mod app;
pub mod gpu_context;
#[cfg(feature = "ffmpeg")]
pub mod player;
pub mod settings;
pub mod shaders;
pub mod telemetry;
pub mod video;

pub use app::{RenderHooks, WindowOptions};
pub use gpu_context::GpuContext;
#[cfg(feature = "ffmpeg")]
pub use player::PlayerScene;
pub use settings::{PlayerSettings, SettingsError};
pub use video::{
    EndOfStreamPolicy, FrameSource, LoadError, MediaBackend, PlaybackConfig, PlaybackState, StreamInfo, TextureSink,
    UpdateOutcome, VideoDecoderError, VideoTexture, WgpuTextureSink,
};
#[cfg(feature = "ffmpeg")]
pub use video::{FfmpegBackend, VideoDecoder};
