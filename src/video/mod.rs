//! Video decoding, texture upload and rendering
//!
//! [`VideoTexture`] drives playback: it asks a [`FrameSource`] for the frame
//! at the current time, flips it to bottom-up row order and refreshes a
//! texture through a [`TextureSink`]. FFmpeg decoding lives behind the
//! `ffmpeg` feature so the playback logic builds without native libraries.

#[cfg(feature = "ffmpeg")]
mod decoder;
mod frame;
mod normalize;
mod playback;
mod renderer;
mod source;
mod texture;

#[cfg(test)]
mod test_support;

#[cfg(feature = "ffmpeg")]
pub use decoder::{FfmpegBackend, VideoDecoder};
pub use frame::{NormalizedFrame, PixelFormat, VideoFrame, BYTES_PER_PIXEL};
pub use normalize::{flip_rows, required_len, FrameLayoutError};
pub use playback::{
    EndOfStreamPolicy, LoadError, PlaybackConfig, PlaybackState, PlaybackStatus, SkipReason, UpdateOutcome,
    VideoTexture,
};
pub use renderer::QuadRenderer;
pub use source::{FrameSource, MediaBackend, MediaOptions, StreamInfo, VideoDecoderError};
pub use texture::{FilterMode, GpuTexture, TextureError, TextureId, TextureSink, TextureSpec, WgpuTextureSink, WrapMode};
