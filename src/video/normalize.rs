//! Row-order normalization for decoded frames
//!
//! Decoders hand out frames top row first, possibly with per-row padding.
//! The quad samples textures with a bottom-left origin, so every frame is
//! flipped vertically and repacked without padding before upload.
//!
//! The copy is deliberately single-threaded. At the frame sizes this player
//! targets, handing rows to worker threads costs more than the copy itself;
//! see `benches/normalize.rs` before changing that.

use super::frame::{NormalizedFrame, BYTES_PER_PIXEL};

/// Frame geometry that cannot be read from the given buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameLayoutError {
    #[error("stride {stride} is smaller than a {width}px row ({row_bytes} bytes)")]
    StrideTooSmall {
        stride: usize,
        width: u32,
        row_bytes: usize,
    },
    #[error("frame buffer holds {actual} bytes, {required} required for {width}x{height}")]
    BufferTooShort {
        actual: usize,
        required: usize,
        width: u32,
        height: u32,
    },
}

/// Minimum number of bytes a `height`-row buffer with `stride` must hold.
///
/// The final row does not need trailing padding. `None` if the size does not
/// fit in `usize`.
pub fn required_len(stride: usize, width: u32, height: u32) -> Option<usize> {
    if height == 0 {
        return Some(0);
    }
    (height as usize - 1)
        .checked_mul(stride)?
        .checked_add((width as usize).checked_mul(BYTES_PER_PIXEL)?)
}

/// Copy `src` into a new bottom-up, unpadded buffer.
///
/// Output row `y` is input row `height - 1 - y`, truncated to
/// `width * 4` bytes.
pub fn flip_rows(
    src: &[u8],
    stride: usize,
    width: u32,
    height: u32,
) -> Result<NormalizedFrame, FrameLayoutError> {
    let row_bytes = (width as usize) * BYTES_PER_PIXEL;
    if stride < row_bytes {
        return Err(FrameLayoutError::StrideTooSmall {
            stride,
            width,
            row_bytes,
        });
    }

    let required = required_len(stride, width, height).unwrap_or(usize::MAX);
    if src.len() < required {
        return Err(FrameLayoutError::BufferTooShort {
            actual: src.len(),
            required,
            width,
            height,
        });
    }

    let mut data = Vec::with_capacity(NormalizedFrame::expected_size(width, height));
    for y in (0..height as usize).rev() {
        let row_start = y * stride;
        data.extend_from_slice(&src[row_start..row_start + row_bytes]);
    }

    Ok(NormalizedFrame {
        data,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a frame where every byte encodes its row, with `pad` filler bytes per row
    fn patterned(width: u32, height: u32, pad: usize) -> (Vec<u8>, usize) {
        let stride = width as usize * 4 + pad;
        let mut data = Vec::with_capacity(stride * height as usize);
        for y in 0..height as usize {
            for x in 0..width as usize * 4 {
                data.push((y * 31 + x) as u8);
            }
            data.extend(std::iter::repeat(0xEE).take(pad));
        }
        (data, stride)
    }

    fn assert_flipped(src: &[u8], stride: usize, out: &NormalizedFrame) {
        let row_bytes = out.width as usize * 4;
        let h = out.height as usize;
        for y in 0..h {
            let src_row = &src[(h - 1 - y) * stride..(h - 1 - y) * stride + row_bytes];
            assert_eq!(out.row(y), src_row, "row {} mismatch", y);
        }
    }

    #[test]
    fn test_flip_unpadded() {
        let (src, stride) = patterned(5, 4, 0);
        let out = flip_rows(&src, stride, 5, 4).unwrap();
        assert_eq!(out.data.len(), 5 * 4 * 4);
        assert_flipped(&src, stride, &out);
    }

    #[test]
    fn test_flip_padded_excludes_padding() {
        let (src, stride) = patterned(3, 3, 16);
        let out = flip_rows(&src, stride, 3, 3).unwrap();
        assert_eq!(out.data.len(), 3 * 3 * 4);
        assert!(!out.data.contains(&0xEE));
        assert_flipped(&src, stride, &out);
    }

    #[test]
    fn test_flip_is_deterministic() {
        let (src, stride) = patterned(7, 5, 4);
        let a = flip_rows(&src, stride, 7, 5).unwrap();
        let b = flip_rows(&src, stride, 7, 5).unwrap();
        assert_eq!(a, b);
        assert_flipped(&src, stride, &a);
    }

    #[test]
    fn test_last_row_without_padding() {
        let (mut src, stride) = patterned(2, 3, 8);
        src.truncate(required_len(stride, 2, 3).unwrap());
        let out = flip_rows(&src, stride, 2, 3).unwrap();
        assert_flipped(&src, stride, &out);
    }

    #[test]
    fn test_rejects_small_stride() {
        let err = flip_rows(&[0; 64], 4, 2, 2).unwrap_err();
        assert!(matches!(err, FrameLayoutError::StrideTooSmall { .. }));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = flip_rows(&[0; 10], 8, 2, 2).unwrap_err();
        assert_eq!(
            err,
            FrameLayoutError::BufferTooShort {
                actual: 10,
                required: 16,
                width: 2,
                height: 2,
            }
        );
    }

    #[test]
    fn test_overflowing_stride_is_rejected() {
        let stride = usize::MAX / 2;
        assert_eq!(required_len(stride, 2, 3), None);

        let err = flip_rows(&[0; 64], stride, 2, 3).unwrap_err();
        assert_eq!(
            err,
            FrameLayoutError::BufferTooShort {
                actual: 64,
                required: usize::MAX,
                width: 2,
                height: 3,
            }
        );
    }

    #[test]
    fn test_zero_height() {
        let out = flip_rows(&[], 8, 2, 0).unwrap();
        assert!(out.data.is_empty());
    }
}
