//! In-memory frame source and recording texture sink for tests

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use super::frame::{PixelFormat, VideoFrame};
use super::source::{FrameSource, MediaBackend, MediaOptions, StreamInfo, VideoDecoderError};
use super::texture::{TextureError, TextureSink, TextureSpec};

/// A single-colour frame with `pad` bytes of padding per row
pub fn solid(width: u32, height: u32, rgba: [u8; 4], pad: usize) -> (Vec<u8>, usize) {
    let stride = width as usize * 4 + pad;
    let mut data = Vec::with_capacity(stride * height as usize);
    for _ in 0..height {
        data.extend(rgba.repeat(width as usize));
        data.extend(std::iter::repeat(0xAB).take(pad));
    }
    (data, stride)
}

/// Opens [`SyntheticSource`]s over a fixed list of equally spaced frames
pub struct SyntheticBackend {
    pub width: u32,
    pub height: u32,
    pub frame_duration: Duration,
    pub duration: Duration,
    /// (data, stride) per frame
    pub frames: Rc<Vec<(Vec<u8>, usize)>>,
    pub fail_open: bool,
    /// Requests for exactly this time return a decode error
    pub fail_at: Option<Duration>,
    decode_calls: Rc<Cell<usize>>,
    open_sources: Rc<Cell<usize>>,
}

impl SyntheticBackend {
    pub fn new(width: u32, height: u32, frame_duration: Duration, frames: Vec<(Vec<u8>, usize)>) -> Self {
        Self {
            width,
            height,
            frame_duration,
            duration: frame_duration * frames.len() as u32,
            frames: Rc::new(frames),
            fail_open: false,
            fail_at: None,
            decode_calls: Rc::new(Cell::new(0)),
            open_sources: Rc::new(Cell::new(0)),
        }
    }

    /// Total `frame_at` calls across all opened sources
    pub fn decode_calls(&self) -> usize {
        self.decode_calls.get()
    }

    /// Sources opened and not yet dropped
    pub fn open_sources(&self) -> usize {
        self.open_sources.get()
    }
}

impl MediaBackend for SyntheticBackend {
    type Source = SyntheticSource;

    fn open(&mut self, path: &Path, _options: &MediaOptions) -> Result<SyntheticSource, VideoDecoderError> {
        if self.fail_open {
            return Err(VideoDecoderError::OpenFailed(path.display().to_string()));
        }
        self.open_sources.set(self.open_sources.get() + 1);
        Ok(SyntheticSource {
            info: StreamInfo {
                path: PathBuf::from(path),
                width: self.width,
                height: self.height,
                duration: self.duration,
                frame_rate: 1.0 / self.frame_duration.as_secs_f64(),
                variable_frame_rate: false,
                codec_name: "rawvideo".to_string(),
                source_pixel_format: "rgba".to_string(),
                bit_rate: 0,
                interlaced: false,
            },
            frame_duration: self.frame_duration,
            frames: Rc::clone(&self.frames),
            fail_at: self.fail_at,
            decode_calls: Rc::clone(&self.decode_calls),
            open_sources: Rc::clone(&self.open_sources),
        })
    }
}

pub struct SyntheticSource {
    info: StreamInfo,
    frame_duration: Duration,
    frames: Rc<Vec<(Vec<u8>, usize)>>,
    fail_at: Option<Duration>,
    decode_calls: Rc<Cell<usize>>,
    open_sources: Rc<Cell<usize>>,
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn frame_at(&mut self, timestamp: Duration) -> Result<Option<VideoFrame<'_>>, VideoDecoderError> {
        self.decode_calls.set(self.decode_calls.get() + 1);
        if self.fail_at == Some(timestamp) {
            return Err(VideoDecoderError::DecodeFailed("corrupt frame".to_string()));
        }

        let index = (timestamp.as_nanos() / self.frame_duration.as_nanos()) as usize;
        Ok(self.frames.get(index).map(|(data, stride)| {
            VideoFrame::new(data, *stride, self.frame_duration * index as u32)
        }))
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.open_sources.set(self.open_sources.get() - 1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub handle: u32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Texture sink that records every call
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub created: Vec<TextureSpec>,
    pub uploads: Vec<Upload>,
    /// (handle, unit)
    pub bound: Vec<(u32, u32)>,
    pub destroyed: Vec<u32>,
    pub fail_create: bool,
    pub fail_uploads: bool,
}

impl TextureSink for RecordingSink {
    type Handle = u32;

    fn create_texture(&mut self, spec: &TextureSpec) -> Result<u32, TextureError> {
        if self.fail_create {
            return Err(TextureError::EmptyExtent {
                width: spec.width,
                height: spec.height,
            });
        }
        self.created.push(*spec);
        Ok(self.created.len() as u32 - 1)
    }

    fn upload_sub_image(
        &mut self,
        handle: u32,
        width: u32,
        height: u32,
        _format: PixelFormat,
        data: &[u8],
    ) -> Result<(), TextureError> {
        if self.fail_uploads {
            return Err(TextureError::UnknownHandle(handle.to_string()));
        }
        self.uploads.push(Upload {
            handle,
            width,
            height,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn bind(&mut self, handle: u32, unit: u32) {
        self.bound.push((handle, unit));
    }

    fn destroy_texture(&mut self, handle: u32) {
        self.destroyed.push(handle);
    }
}
