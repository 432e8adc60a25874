//! Video player scene
//!
//! Plays one file into a [`VideoTexture`] and draws it over the whole window.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app::RenderHooks;
use crate::gpu_context::GpuContext;
use crate::video::{FfmpegBackend, PlaybackConfig, QuadRenderer, UpdateOutcome, VideoTexture, WgpuTextureSink};

/// Texture unit the video is bound to
const VIDEO_UNIT: u32 = 0;

struct Loaded {
    video: VideoTexture<FfmpegBackend, WgpuTextureSink>,
    renderer: QuadRenderer,
}

pub struct PlayerScene {
    path: PathBuf,
    config: PlaybackConfig,
    loaded: Option<Loaded>,
}

impl PlayerScene {
    pub fn new(path: impl Into<PathBuf>, config: PlaybackConfig) -> Self {
        Self {
            path: path.into(),
            config,
            loaded: None,
        }
    }
}

impl RenderHooks for PlayerScene {
    fn on_load(&mut self, gpu: &Arc<GpuContext>) -> anyhow::Result<()> {
        let sink = WgpuTextureSink::new(Arc::clone(gpu));
        let mut video = VideoTexture::with_config(FfmpegBackend, sink, self.config.clone());
        video.try_load(&self.path)?;

        let renderer = QuadRenderer::new(&gpu.device, gpu.surface_format);
        self.loaded = Some(Loaded { video, renderer });
        Ok(())
    }

    fn on_update_frame(&mut self, elapsed: Duration) {
        if let Some(loaded) = &mut self.loaded {
            let outcome = loaded.video.update(elapsed);
            if outcome != UpdateOutcome::Applied {
                tracing::trace!(?elapsed, ?outcome, "Frame not applied");
            }
        }
    }

    fn on_render_frame(&mut self, gpu: &GpuContext, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        if let Some(loaded) = &mut self.loaded {
            loaded.video.bind(VIDEO_UNIT);
            loaded
                .renderer
                .render(&gpu.device, encoder, view, loaded.video.sink(), VIDEO_UNIT);
        }
    }
}
