//! Decoded and normalized video frame representations
//!
//! A [`VideoFrame`] is a borrowed view into the frame source's current
//! decode buffer. A [`NormalizedFrame`] is the owned, bottom-up copy that
//! gets uploaded to the GPU.

use std::time::Duration;

/// Bytes per pixel for every frame handled by this crate (RGBA8)
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel layout of frame and texture data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8 bits per channel, R G B A byte order
    #[default]
    Rgba8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => BYTES_PER_PIXEL,
        }
    }
}

/// A decoded frame borrowed from a frame source
///
/// Only valid until the next call into the source that produced it.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    /// Row-major RGBA pixel data, top row first
    pub data: &'a [u8],
    /// Bytes per row in `data` (may include padding)
    pub stride: usize,
    /// Decoder-reported stream position of this frame
    pub position: Duration,
}

impl<'a> VideoFrame<'a> {
    pub fn new(data: &'a [u8], stride: usize, position: Duration) -> Self {
        Self {
            data,
            stride,
            position,
        }
    }

    /// Whether the decoder produced any pixel data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A tightly packed frame with row 0 at the bottom of the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NormalizedFrame {
    /// Expected byte length for the given dimensions (width * height * 4)
    pub fn expected_size(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * BYTES_PER_PIXEL
    }

    /// Bytes per row (no padding)
    pub fn stride(&self) -> usize {
        (self.width as usize) * BYTES_PER_PIXEL
    }

    /// Borrow row `y`, counted from the bottom of the image
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_size() {
        assert_eq!(NormalizedFrame::expected_size(1920, 1080), 1920 * 1080 * 4);
        assert_eq!(NormalizedFrame::expected_size(2, 2), 16);
    }

    #[test]
    fn test_empty_frame() {
        let frame = VideoFrame::new(&[], 0, Duration::ZERO);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_row_access() {
        let frame = NormalizedFrame {
            data: (0..16).collect(),
            width: 2,
            height: 2,
        };
        assert_eq!(frame.row(0), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(frame.row(1), &[8, 9, 10, 11, 12, 13, 14, 15]);
    }
}
