//! GPU texture sink for video frames
//!
//! The playback controller only talks to [`TextureSink`]. [`WgpuTextureSink`]
//! is the real implementation: one wgpu texture plus sampler per handle,
//! allocated once and then refreshed with full-extent `write_texture` calls.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use super::frame::PixelFormat;
use crate::gpu_context::GpuContext;

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Texture coordinate wrap behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// Everything needed to allocate a video texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSpec {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

impl TextureSpec {
    /// Linear-filtered, edge-clamped RGBA texture
    pub fn video(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            filter: FilterMode::Linear,
            wrap: WrapMode::ClampToEdge,
        }
    }

    /// Byte length of a full-extent upload
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Errors from texture allocation and upload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    #[error("texture dimensions {width}x{height} are empty")]
    EmptyExtent { width: u32, height: u32 },
    #[error("texture {width}x{height} exceeds device limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("unknown texture handle {0}")]
    UnknownHandle(String),
    #[error("upload extent {width}x{height} does not match texture {expected_width}x{expected_height}")]
    ExtentMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error("upload holds {actual} bytes, expected {expected}")]
    SizeMismatch { actual: usize, expected: usize },
}

/// Destination for decoded frames
pub trait TextureSink {
    type Handle: Copy + Eq + Debug;

    /// Allocate a texture. Called once per loaded stream.
    fn create_texture(&mut self, spec: &TextureSpec) -> Result<Self::Handle, TextureError>;

    /// Replace the full extent of an existing texture
    fn upload_sub_image(
        &mut self,
        handle: Self::Handle,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<(), TextureError>;

    /// Make `handle` the texture sampled from `unit`
    fn bind(&mut self, handle: Self::Handle, unit: u32);

    /// Release a texture. Unknown handles are ignored.
    fn destroy_texture(&mut self, handle: Self::Handle);
}

/// Identifier for a texture owned by [`WgpuTextureSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

/// A wgpu texture with its view and sampler
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    spec: TextureSpec,
}

impl GpuTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// Texture sink backed by a shared wgpu device and queue
pub struct WgpuTextureSink {
    gpu: Arc<GpuContext>,
    textures: HashMap<TextureId, GpuTexture>,
    bound: HashMap<u32, TextureId>,
    next_id: u64,
}

impl WgpuTextureSink {
    pub fn new(gpu: Arc<GpuContext>) -> Self {
        Self {
            gpu,
            textures: HashMap::new(),
            bound: HashMap::new(),
            next_id: 0,
        }
    }

    /// The texture currently bound to `unit`, with its id
    pub fn bound(&self, unit: u32) -> Option<(TextureId, &GpuTexture)> {
        let id = *self.bound.get(&unit)?;
        self.textures.get(&id).map(|texture| (id, texture))
    }

    fn wgpu_format(format: PixelFormat) -> wgpu::TextureFormat {
        match format {
            // sRGB to match video color space
            PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }

    fn filter(mode: FilterMode) -> wgpu::FilterMode {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }

    fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
        match mode {
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

impl TextureSink for WgpuTextureSink {
    type Handle = TextureId;

    fn create_texture(&mut self, spec: &TextureSpec) -> Result<TextureId, TextureError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(TextureError::EmptyExtent {
                width: spec.width,
                height: spec.height,
            });
        }
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        if spec.width > max || spec.height > max {
            return Err(TextureError::TooLarge {
                width: spec.width,
                height: spec.height,
                max,
            });
        }

        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Video Texture"),
            size: wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::wgpu_format(spec.format),
            // COPY_DST for uploading data, TEXTURE_BINDING for shader sampling
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let address_mode = Self::address_mode(spec.wrap);
        let filter = Self::filter(spec.filter);
        let sampler = self.gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Video Sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                view,
                sampler,
                spec: *spec,
            },
        );

        tracing::debug!(?id, width = spec.width, height = spec.height, "Created video texture");
        Ok(id)
    }

    fn upload_sub_image(
        &mut self,
        handle: TextureId,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<(), TextureError> {
        let entry = self
            .textures
            .get(&handle)
            .ok_or_else(|| TextureError::UnknownHandle(format!("{:?}", handle)))?;

        if width != entry.spec.width || height != entry.spec.height {
            return Err(TextureError::ExtentMismatch {
                width,
                height,
                expected_width: entry.spec.width,
                expected_height: entry.spec.height,
            });
        }
        let expected = entry.spec.byte_len();
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                actual: data.len(),
                expected,
            });
        }

        self.gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * format.bytes_per_pixel() as u32),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn bind(&mut self, handle: TextureId, unit: u32) {
        if self.textures.contains_key(&handle) {
            self.bound.insert(unit, handle);
        } else {
            tracing::warn!(?handle, unit, "Ignoring bind of unknown texture");
        }
    }

    fn destroy_texture(&mut self, handle: TextureId) {
        if let Some(entry) = self.textures.remove(&handle) {
            entry.texture.destroy();
            self.bound.retain(|_, id| *id != handle);
            tracing::debug!(?handle, "Destroyed video texture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_spec_defaults() {
        let spec = TextureSpec::video(1920, 1080);
        assert_eq!(spec.format, PixelFormat::Rgba8);
        assert_eq!(spec.filter, FilterMode::Linear);
        assert_eq!(spec.wrap, WrapMode::ClampToEdge);
        assert_eq!(spec.byte_len(), 1920 * 1080 * 4);
    }

    // wgpu-backed tests need an adapter, which is exercised by the headless demo in demos/
}
