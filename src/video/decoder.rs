//! Frame source backed by FFmpeg
//!
//! Opens a media file with the `ffmpeg-next` crate, decodes its best video
//! stream in software and converts each frame to RGBA. Frames are looked up
//! by timestamp: requests close ahead of the current position decode
//! forward, anything else seeks to the nearest keyframe first.

use std::path::Path;
use std::time::Duration;

use super::frame::{PixelFormat, VideoFrame};
use super::source::{FrameSource, MediaBackend, MediaOptions, StreamInfo, VideoDecoderError};

/// Opens [`VideoDecoder`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    type Source = VideoDecoder;

    fn open(&mut self, path: &Path, options: &MediaOptions) -> Result<VideoDecoder, VideoDecoderError> {
        VideoDecoder::open_with_options(path, options)
    }
}

/// The most recently decoded frame, already converted to RGBA
struct CurrentFrame {
    rgba: ffmpeg_next::frame::Video,
    position: Duration,
}

impl CurrentFrame {
    /// Whether `timestamp` is within one frame of this frame's position
    fn covers(&self, timestamp: Duration, frame_duration: Duration) -> bool {
        timestamp < self.position + frame_duration && self.position < timestamp + frame_duration
    }

    fn as_video_frame(&self) -> VideoFrame<'_> {
        VideoFrame::new(self.rgba.data(0), self.rgba.stride(0), self.position)
    }
}

/// Indices of the streams the demuxer should drop when only `keep` is read
fn streams_to_discard(indices: impl IntoIterator<Item = usize>, keep: usize) -> Vec<usize> {
    indices.into_iter().filter(|&index| index != keep).collect()
}

/// Tell the demuxer to drop packets of every stream except `keep`.
///
/// Returns the number of streams discarded.
fn discard_other_streams(input: &mut ffmpeg_next::format::context::Input, keep: usize) -> usize {
    let others = streams_to_discard(input.streams().map(|stream| stream.index()), keep);
    // SAFETY: every index came from `streams()`, so it is below `nb_streams`
    unsafe {
        let context = input.as_mut_ptr();
        for &index in &others {
            let stream = *(*context).streams.add(index);
            (*stream).discard = ffmpeg_next::ffi::AVDiscard::AVDISCARD_ALL;
        }
    }
    others.len()
}

/// Whether a decoder field order describes interlaced content
fn is_interlaced(order: ffmpeg_next::FieldOrder) -> bool {
    use ffmpeg_next::FieldOrder;
    !matches!(order, FieldOrder::Progressive | FieldOrder::Unknown)
}

/// Video decoder that serves RGBA frames by timestamp
pub struct VideoDecoder {
    /// The input format context
    input: ffmpeg_next::format::context::Input,
    /// Index of the video stream
    video_stream_index: usize,
    decoder: ffmpeg_next::decoder::Video,
    /// Scaler for converting to RGBA
    scaler: ffmpeg_next::software::scaling::Context,
    output_format: ffmpeg_next::format::Pixel,
    info: StreamInfo,
    /// Time base for PTS conversion
    time_base: f64,
    frame_duration: Duration,
    seek_threshold: Duration,
    /// Position of the last decoded frame, or the last seek target
    cursor: Duration,
    current: Option<CurrentFrame>,
    /// No packets left; the decoder has been sent EOF
    draining: bool,
    /// The decoder has returned its last frame
    eof: bool,
}

impl VideoDecoder {
    /// Open a video file with default options (RGBA output)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoDecoderError> {
        Self::open_with_options(path, &MediaOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &MediaOptions) -> Result<Self, VideoDecoderError> {
        // Initialize FFmpeg (safe to call multiple times)
        ffmpeg_next::init()?;

        let path = path.as_ref();
        let mut input = ffmpeg_next::format::input(&path)
            .map_err(|e| VideoDecoderError::OpenFailed(format!("{}: {}", path.display(), e)))?;

        let video_stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(VideoDecoderError::NoVideoStream)?;
        let video_stream_index = video_stream.index();

        let time_base = video_stream.time_base();
        let time_base_f64 = time_base.numerator() as f64 / time_base.denominator() as f64;

        let avg_frame_rate = video_stream.avg_frame_rate();
        let frame_rate = if avg_frame_rate.denominator() > 0 && avg_frame_rate.numerator() > 0 {
            avg_frame_rate.numerator() as f64 / avg_frame_rate.denominator() as f64
        } else {
            30.0 // Default fallback
        };
        let variable_frame_rate = avg_frame_rate != video_stream.rate();

        let duration_secs = if video_stream.duration() > 0 {
            video_stream.duration() as f64 * time_base_f64
        } else if input.duration() > 0 {
            input.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        let parameters = video_stream.parameters();
        let codec_name = ffmpeg_next::decoder::find(parameters.id())
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let context = ffmpeg_next::codec::context::Context::from_parameters(parameters)?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| VideoDecoderError::DecoderCreationFailed(e.to_string()))?;

        let interlaced = is_interlaced(decoder.field_order());

        if options.video_only {
            let discarded = discard_other_streams(&mut input, video_stream_index);
            tracing::debug!(stream = video_stream_index, discarded, "Decoding video stream only");
        }

        let output_format = match options.pixel_format {
            PixelFormat::Rgba8 => ffmpeg_next::format::Pixel::RGBA,
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = Self::create_scaler(decoder.format(), width, height, output_format)?;

        let info = StreamInfo {
            path: path.to_path_buf(),
            width,
            height,
            duration: Duration::from_secs_f64(duration_secs.max(0.0)),
            frame_rate,
            variable_frame_rate,
            codec_name,
            source_pixel_format: format!("{:?}", decoder.format()).to_lowercase(),
            bit_rate: input.bit_rate(),
            interlaced,
        };

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            scaler,
            output_format,
            frame_duration: Duration::from_secs_f64(1.0 / frame_rate),
            seek_threshold: options.seek_threshold,
            info,
            time_base: time_base_f64,
            cursor: Duration::ZERO,
            current: None,
            draining: false,
            eof: false,
        })
    }

    fn create_scaler(
        format: ffmpeg_next::format::Pixel,
        width: u32,
        height: u32,
        output_format: ffmpeg_next::format::Pixel,
    ) -> Result<ffmpeg_next::software::scaling::Context, VideoDecoderError> {
        ffmpeg_next::software::scaling::Context::get(
            format,
            width,
            height,
            output_format,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoDecoderError::ScalerCreationFailed(e.to_string()))
    }

    fn should_seek(&self, timestamp: Duration) -> bool {
        timestamp < self.cursor || timestamp > self.cursor + self.seek_threshold
    }

    /// Seek to the keyframe at or before `timestamp`
    fn seek(&mut self, timestamp: Duration) -> Result<(), VideoDecoderError> {
        // FFmpeg's input.seek() uses AV_TIME_BASE (microseconds)
        let timestamp_us = timestamp.as_micros() as i64;
        self.input.seek(timestamp_us, ..timestamp_us)?;
        self.decoder.flush();
        self.cursor = timestamp;
        self.current = None;
        self.draining = false;
        self.eof = false;
        tracing::trace!(?timestamp, "Seeked");
        Ok(())
    }

    /// Decode forward until the current frame covers `timestamp`.
    ///
    /// Returns false if the stream ended first.
    fn decode_until(&mut self, timestamp: Duration) -> Result<bool, VideoDecoderError> {
        while let Some(frame) = self.decode_next_frame()? {
            let done = timestamp < frame.position + self.frame_duration;
            self.cursor = frame.position;
            self.current = Some(frame);
            if done {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn next_video_packet(&mut self) -> Option<ffmpeg_next::Packet> {
        let index = self.video_stream_index;
        self.input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == index).then_some(packet))
    }

    /// Decode the next frame in stream order, `None` at end of file
    fn decode_next_frame(&mut self) -> Result<Option<CurrentFrame>, VideoDecoderError> {
        if self.eof {
            return Ok(None);
        }

        let mut decoded = ffmpeg_next::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let pts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
                    let position = Duration::from_secs_f64((pts as f64 * self.time_base).max(0.0));

                    // Recreate scaler if format changed
                    if decoded.format() != self.scaler.input().format {
                        self.scaler =
                            Self::create_scaler(decoded.format(), self.info.width, self.info.height, self.output_format)?;
                    }

                    let mut rgba = ffmpeg_next::frame::Video::empty();
                    self.scaler.run(&decoded, &mut rgba)?;
                    return Ok(Some(CurrentFrame { rgba, position }));
                }
                Err(ffmpeg_next::Error::Other {
                    errno: ffmpeg_next::error::EAGAIN,
                }) => {
                    // Need more input
                    if self.draining {
                        self.eof = true;
                        return Ok(None);
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.eof = true;
                    return Ok(None);
                }
                Err(e) => {
                    return Err(VideoDecoderError::DecodeFailed(e.to_string()));
                }
            }

            match self.next_video_packet() {
                Some(packet) => self.decoder.send_packet(&packet)?,
                None => {
                    self.decoder.send_eof()?;
                    self.draining = true;
                }
            }
        }
    }
}

impl FrameSource for VideoDecoder {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn frame_at(&mut self, timestamp: Duration) -> Result<Option<VideoFrame<'_>>, VideoDecoderError> {
        let covered = self
            .current
            .as_ref()
            .is_some_and(|current| current.covers(timestamp, self.frame_duration));

        if !covered {
            if self.should_seek(timestamp) {
                self.seek(timestamp)?;
            }
            if !self.decode_until(timestamp)? {
                return Ok(None);
            }
        }

        Ok(self.current.as_ref().map(CurrentFrame::as_video_frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_fails() {
        let result = VideoDecoder::open("/nonexistent/clip.mp4");
        assert!(matches!(result, Err(VideoDecoderError::OpenFailed(_))));
    }

    #[test]
    fn test_video_only_discards_other_streams() {
        // audio 0, video 1, subtitles 2
        assert_eq!(streams_to_discard(0..3, 1), vec![0, 2]);
        assert!(streams_to_discard([4], 4).is_empty());
    }

    #[test]
    fn test_field_order_maps_to_interlaced() {
        use ffmpeg_next::FieldOrder;
        assert!(!is_interlaced(FieldOrder::Progressive));
        assert!(!is_interlaced(FieldOrder::Unknown));
        assert!(is_interlaced(FieldOrder::TT));
        assert!(is_interlaced(FieldOrder::BT));
    }
}
