//! Reusable state-only implementation of the scroll narrative demo.
//!
//! This file is intentionally **not** an example binary (no `fn main()`).
//! It is used by `demos/story_slides.rs`.
//!
//! A stack of slide cards driven by the segment timeline:
//! - the mouse wheel feeds a `ScrollObserver`, whose clamped progress is the
//!   only animation input (no elapsed-time motion here),
//! - slide 0 is a backdrop in `Stacked` mode, fully visible at progress 0,
//! - each following slide fades in, slides up into its hold, then fades out
//!   while the next one arrives,
//! - a progress rail at the bottom mirrors the raw progress value.

use std::sync::Arc;

use winit::window::Window;

use orrery::geom;
use orrery::render::{app::AppState, gpu::Gpu, marker_renderer::MarkerRenderer};
use orrery::scene::{Aabb2, Affine2, Camera2D, DrawItem2D, Mesh2D, Rgba};
use orrery::timeline::{ScrollObserver, SegmentTrack, SlideMode};

/// Viewport-height units advanced per wheel line.
const WHEEL_STEP: f32 = 0.12;

/// Slide travel in world units (enter from below, exit above).
const TRAVEL: f32 = 140.0;

const SLIDE_FILLS: [Rgba; 4] = [
    Rgba::new(0.16, 0.18, 0.24, 1.0), // backdrop panel
    Rgba::new(0.45, 0.75, 1.0, 1.0),
    Rgba::new(1.0, 0.62, 0.40, 1.0),
    Rgba::new(0.62, 0.93, 0.70, 1.0),
];

pub struct State {
    gpu: Gpu,
    renderer: MarkerRenderer,
    camera: Camera2D,

    scroll: ScrollObserver,
    tracks: Vec<SegmentTrack>,

    backdrop: Mesh2D,
    card: Mesh2D,
    rail: Mesh2D,
}

impl State {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window).await?;

        let total = SLIDE_FILLS.len();
        let tracks = (0..total)
            .map(|i| SegmentTrack::with_entry_exit(i, total, SlideMode::Stacked, TRAVEL, -TRAVEL))
            .collect();

        let mut camera = Camera2D::default();
        camera.set_viewport_px(gpu.size.width.max(1), gpu.size.height.max(1));
        camera.frame_bounds(Aabb2::centered([240.0, 180.0]), 20.0, 0.9);

        let renderer = MarkerRenderer::new(&gpu)?;

        Ok(Self {
            gpu,
            renderer,
            camera,
            scroll: ScrollObserver::for_segments(total),
            tracks,
            backdrop: geom::rect([420.0, 280.0]),
            card: geom::rect([340.0, 190.0]),
            rail: geom::rect([300.0, 3.0]),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.camera
            .set_viewport_px(self.gpu.size.width.max(1), self.gpu.size.height.max(1));
    }

    /// Evaluate every track at the current progress into draw items.
    fn compose(&self) -> Vec<DrawItem2D> {
        let progress = self.scroll.progress();
        let mut items = Vec::new();

        for (i, track) in self.tracks.iter().enumerate() {
            let opacity = track.opacity(progress);
            if opacity <= 0.0 {
                continue;
            }
            let offset = track.offset(progress);

            // The backdrop never travels (Stacked gives it zero offset while
            // it holds); cards enter from below and leave upward.
            let mesh = if i == 0 { &self.backdrop } else { &self.card };
            items.push(DrawItem2D {
                mesh: mesh.clone(),
                fill: SLIDE_FILLS[i].with_alpha(opacity),
                world_from_local: Affine2::translate(0.0, -offset),
                z: i as i32,
            });
        }

        // Progress rail, anchored to the bottom edge of the backdrop.
        let p = progress.max(1e-3);
        items.push(DrawItem2D {
            mesh: self.rail.clone(),
            fill: Rgba::WHITE.with_alpha(0.15),
            world_from_local: Affine2::translate(0.0, -160.0),
            z: 10,
        });
        items.push(DrawItem2D {
            mesh: self.rail.clone(),
            fill: Rgba::WHITE.with_alpha(0.8),
            world_from_local: Affine2::translate(-150.0 * (1.0 - p), -160.0)
                .mul(Affine2::scale(p, 1.0)),
            z: 11,
        });

        items
    }

    pub fn render(&mut self) -> anyhow::Result<()> {
        let (frame, view) = match self.gpu.acquire_frame() {
            Ok(v) => v,
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                self.gpu.resize(self.gpu.size);
                self.gpu.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                self.gpu.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow::anyhow!("wgpu SurfaceError::OutOfMemory"));
            }
            Err(wgpu::SurfaceError::Other) => {
                self.gpu.resize(self.gpu.size);
                self.gpu.request_redraw();
                return Ok(());
            }
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Story Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Story Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.04,
                            g: 0.04,
                            b: 0.06,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut items = self.compose();
            items.sort_by_key(|it| it.z);

            self.renderer
                .draw_items(&self.gpu, &mut pass, &self.camera, &items)?;
        }

        self.gpu.present(encoder, frame);
        self.gpu.request_redraw();

        Ok(())
    }
}

impl AppState for State {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        Self::resize(self, new_size)
    }

    fn tick(&mut self, _dt: f32, _t: f32) {
        // Scroll-driven only: progress is the sole animation input.
    }

    fn render(&mut self) -> anyhow::Result<()> {
        Self::render(self)
    }

    fn request_redraw(&self) {
        self.gpu.request_redraw();
    }

    fn scrolled(&mut self, lines: f32) {
        // Wheel-down reports negative lines; that advances the story.
        self.scroll.scroll_by(-lines * WHEEL_STEP);
    }
}
