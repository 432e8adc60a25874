//! Window host
//!
//! Owns the winit window, the wgpu surface and the frame clock. Everything
//! the window shows is delegated to a [`RenderHooks`] implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::gpu_context::GpuContext;
use crate::settings::PlayerSettings;
use crate::telemetry::FrameProfiler;

/// Scene callbacks driven by the host loop
pub trait RenderHooks {
    /// Called once the GPU is ready. An error closes the window.
    fn on_load(&mut self, gpu: &Arc<GpuContext>) -> anyhow::Result<()>;

    /// Called before each frame with the time since loading finished
    fn on_update_frame(&mut self, elapsed: Duration);

    /// Record draw commands targeting `view`
    fn on_render_frame(&mut self, gpu: &GpuContext, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView);
}

/// Initial window setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl From<&PlayerSettings> for WindowOptions {
    fn from(settings: &PlayerSettings) -> Self {
        Self {
            title: settings.title.clone(),
            width: settings.window_width,
            height: settings.window_height,
            fullscreen: settings.fullscreen,
        }
    }
}

/// What a key release asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Exit,
    ToggleFullscreen,
}

fn key_action(key: PhysicalKey, state: ElementState) -> Option<KeyAction> {
    if state != ElementState::Released {
        return None;
    }
    match key {
        PhysicalKey::Code(KeyCode::Escape) => Some(KeyAction::Exit),
        PhysicalKey::Code(KeyCode::Space) => Some(KeyAction::ToggleFullscreen),
        _ => None,
    }
}

/// Window and surface, created on first resume
struct WindowTarget {
    window: Arc<Window>,
    gpu: Arc<GpuContext>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl WindowTarget {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.gpu.device, &self.config);
        }
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.gpu.device, &self.config);
    }
}

struct Host<H> {
    options: WindowOptions,
    hooks: H,
    target: Option<WindowTarget>,
    start: Instant,
    profiler: FrameProfiler,
    error: Option<anyhow::Error>,
}

impl<H: RenderHooks> Host<H> {
    fn new(options: WindowOptions, hooks: H) -> Self {
        Self {
            options,
            hooks,
            target: None,
            start: Instant::now(),
            profiler: FrameProfiler::default(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let mut attributes = WindowAttributes::default()
            .with_title(self.options.title.clone())
            .with_inner_size(LogicalSize::new(self.options.width, self.options.height));
        if self.options.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(attributes)?);

        let (gpu, surface) = pollster::block_on(GpuContext::for_window(window.clone()))?;
        let size = window.inner_size();
        let config = gpu.surface_config(&surface, size.width, size.height);
        surface.configure(&gpu.device, &config);

        let gpu = Arc::new(gpu);
        self.hooks.on_load(&gpu)?;

        self.target = Some(WindowTarget {
            window,
            gpu,
            surface,
            config,
        });
        self.start = Instant::now();
        Ok(())
    }

    fn log_frame_rate(&self) {
        let stats = self.profiler.stats();
        tracing::info!(
            fps = self.profiler.fps(),
            average_fps = self.profiler.average_fps(),
            avg_frame_ms = stats.avg_ms,
            p95_frame_ms = stats.p95_ms,
            "Final frame rate"
        );
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(target) = &mut self.target else {
            return;
        };

        self.profiler.begin_frame();
        self.hooks.on_update_frame(self.start.elapsed());

        let output = match target.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface lost, reconfiguring");
                target.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("Surface out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => {
                tracing::warn!("Surface error: {:?}", e);
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = target
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.hooks.on_render_frame(&target.gpu, &mut encoder, &view);

        target.gpu.queue.submit(std::iter::once(encoder.finish()));
        target.window.pre_present_notify();
        output.present();
    }
}

impl<H: RenderHooks> ApplicationHandler for Host<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.target.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("Failed to start: {:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.log_frame_rate();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => match key_action(event.physical_key, event.state) {
                Some(KeyAction::Exit) => {
                    self.log_frame_rate();
                    event_loop.exit();
                }
                Some(KeyAction::ToggleFullscreen) => {
                    if let Some(target) = &self.target {
                        let fullscreen = match target.window.fullscreen() {
                            Some(_) => None,
                            None => Some(Fullscreen::Borderless(None)),
                        };
                        tracing::debug!(fullscreen = fullscreen.is_some(), "Toggling fullscreen");
                        target.window.set_fullscreen(fullscreen);
                    }
                }
                None => {}
            },
            WindowEvent::Resized(size) => {
                if let Some(target) = &mut self.target {
                    target.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(target) = &self.target {
            target.window.request_redraw();
        }
    }
}

/// Open the window and drive `hooks` until the window closes
pub fn run<H: RenderHooks>(options: WindowOptions, hooks: H) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut host = Host::new(options, hooks);
    event_loop.run_app(&mut host)?;

    match host.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_releases() {
        let escape = PhysicalKey::Code(KeyCode::Escape);
        let space = PhysicalKey::Code(KeyCode::Space);
        assert_eq!(key_action(escape, ElementState::Released), Some(KeyAction::Exit));
        assert_eq!(key_action(space, ElementState::Released), Some(KeyAction::ToggleFullscreen));
    }

    #[test]
    fn test_presses_are_ignored() {
        assert_eq!(key_action(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed), None);
        assert_eq!(key_action(PhysicalKey::Code(KeyCode::KeyA), ElementState::Released), None);
    }

    #[test]
    fn test_window_options_from_settings() {
        let options = WindowOptions::from(&PlayerSettings::default());
        assert_eq!(options.width, 960);
        assert_eq!(options.height, 540);
        assert!(!options.fullscreen);
    }
}
