//! GPU context wrapper.
//!
//! Owns the wgpu instance/adapter/device/queue, the window surface and its
//! configuration, and the window handle itself, so demo states only carry a
//! `Gpu` around. Presentation details (sRGB view format, vsync, resize
//! safety) live here rather than in every state.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

pub struct Gpu {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub surface_format: wgpu::TextureFormat,

    pub size: winit::dpi::PhysicalSize<u32>,
    pub config: wgpu::SurfaceConfiguration,
}

impl Gpu {
    /// Create a GPU context for the given window and configure its surface.
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: None,
                ..Default::default()
            })
            .await
            .context("wgpu: failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .context("wgpu: failed to request device")?;

        let size = window.inner_size();

        // The surface borrows the window; cloning the Arc keeps the window
        // alive for as long as this context exists.
        let surface = instance
            .create_surface(window.clone())
            .context("wgpu: failed to create surface")?;

        let caps = surface.get_capabilities(&adapter);

        // Prefer a format with an sRGB view available; fall back to whatever
        // the surface offers first.
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("wgpu: surface reported no supported formats")?;

        let config = Self::make_surface_config(size, surface_format);

        surface.configure(&device, &config);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            window,
            surface,
            surface_format,
            size,
            config,
        })
    }

    /// Reconfigure the surface for a new size.
    ///
    /// Call this on `WindowEvent::Resized`. Zero-sized surfaces (reported
    /// during minimize) are recorded but not configured.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            self.size = new_size;
            self.config.width = 0;
            self.config.height = 0;
            return;
        }

        self.size = new_size;
        self.config = Self::make_surface_config(new_size, self.surface_format);
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquire the next frame and an sRGB view of it.
    ///
    /// Acquisition fails transiently around resizes; the `SurfaceError` is
    /// returned as-is so callers can decide to reconfigure, retry, or exit.
    pub fn acquire_frame(
        &self,
    ) -> Result<(wgpu::SurfaceTexture, wgpu::TextureView), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                format: Some(self.surface_format.add_srgb_suffix()),
                ..Default::default()
            });

        Ok((surface_texture, view))
    }

    /// Submit encoded work and present the frame.
    pub fn present(&self, encoder: wgpu::CommandEncoder, frame: wgpu::SurfaceTexture) {
        self.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
    }

    /// Ask the window for another frame (continuous animation).
    #[inline]
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn make_surface_config(
        size: winit::dpi::PhysicalSize<u32>,
        surface_format: wgpu::TextureFormat,
    ) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            // Rendering goes through the sRGB view for correct gamma.
            view_formats: vec![surface_format.add_srgb_suffix()],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            width: size.width,
            height: size.height,
            desired_maximum_frame_latency: 2,
            // Animation smoothness over latency: follow the display refresh.
            present_mode: wgpu::PresentMode::AutoVsync,
        }
    }
}
