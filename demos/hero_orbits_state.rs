//! Reusable state-only implementation of the hero orbit demo.
//!
//! This file is intentionally **not** an example binary (no `fn main()`).
//! It is reused by:
//! - `demos/hero_orbits.rs` (thin wrapper that calls the library runner)
//! - `src/main.rs` (default `cargo run` entrypoint)
//!
//! The state builds the kind of composition the hero sections use:
//! - a slowly spinning hub carrying two planet orbits
//! - a moon and a station nested under the first planet (epicycles)
//! - a wide ambient particle ring plus a ring attached to the first planet
//! - pointer tilt on the whole scene, plus a gentle camera breathe
//!
//! Everything is parameterized here, at construction time; the per-frame
//! path only feeds `tick(dt, t)` into the composer and redraws.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use orrery::geom::{self, TessellateOptions};
use orrery::orbit::{OrbitComposition, OrbitNode, OrbitSpec};
use orrery::particles::RingField;
use orrery::render::{app::AppState, gpu::Gpu, marker_renderer::MarkerRenderer, util};
use orrery::scene::{Aabb2, Rgba, SceneComposer, TiltConfig};

const INK: Rgba = Rgba::new(0.92, 0.94, 0.98, 1.0);
const ACCENT: Rgba = Rgba::new(0.45, 0.75, 1.0, 1.0);
const EMBER: Rgba = Rgba::new(1.0, 0.62, 0.40, 1.0);
const GUIDE: Rgba = Rgba::new(0.92, 0.94, 0.98, 0.16);

pub struct State {
    gpu: Gpu,
    composer: SceneComposer,
    renderer: MarkerRenderer,

    /// Absolute time of the last tick, consumed by `render`.
    t: f32,
    base_zoom: f32,
}

impl State {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window).await?;

        let opts = TessellateOptions::default();

        let mut composer = SceneComposer::new(TiltConfig {
            roll: 0.06,
            shift: [18.0, 12.0],
            responsiveness: 6.0,
        });
        composer
            .camera
            .set_viewport_px(gpu.size.width.max(1), gpu.size.height.max(1));

        // --- Orbit tree: hub -> planets -> moon -> station ---
        let station = OrbitNode::new("station", OrbitSpec::new(14.0, 2.2, 0.0))
            .with_marker(geom::disc(2.4, opts).context("station marker")?)
            .with_fill(EMBER)
            .with_z(4);

        let moon = OrbitNode::new("moon", OrbitSpec::new(42.0, 0.9, 1.3))
            .with_marker(geom::disc(5.0, opts).context("moon marker")?)
            .with_fill(INK)
            .with_guide(geom::ring(42.0, 1.0, opts).context("moon guide")?, GUIDE)
            .with_z(3)
            .with_child(station);

        // Planet A wears a halo: disc and ring merged into one marker mesh.
        let mut planet_a_marker = geom::disc(10.0, opts).context("planet-a marker")?;
        planet_a_marker.append(&geom::ring(15.0, 1.0, opts).context("planet-a halo")?);

        let planet_a = OrbitNode::new("planet-a", OrbitSpec::new(160.0, 0.25, 0.0))
            .with_marker(planet_a_marker)
            .with_fill(ACCENT)
            .with_guide(geom::ring(160.0, 1.2, opts).context("planet-a guide")?, GUIDE)
            .with_z(2)
            .with_child(moon);

        let planet_b = OrbitNode::new("planet-b", OrbitSpec::new(240.0, -0.12, 2.0))
            .with_marker(geom::disc(7.0, opts).context("planet-b marker")?)
            .with_fill(INK)
            .with_guide(geom::ring(240.0, 1.2, opts).context("planet-b guide")?, GUIDE)
            .with_z(2);

        // Zero radius: the hub spins in place and its rotation carries both
        // planet orbits, so the whole system slowly precesses.
        let hub = OrbitNode::new("hub", OrbitSpec::new(0.0, 0.03, 0.0))
            .with_marker(geom::disc(16.0, opts).context("hub marker")?)
            .with_fill(INK)
            .with_z(1)
            .with_child(planet_a)
            .with_child(planet_b);

        composer.add_composition(OrbitComposition::new().with_root(hub));

        // --- Particle rings ---
        // A wide ambient dust ring around everything.
        composer.add_field(
            RingField::uniform(56, 320.0, 0.05)
                .with_marker(geom::disc(1.4, opts).context("dust marker")?)
                .with_fill(INK.with_alpha(0.5))
                .with_z(0),
        );
        // A tight debris ring riding the first planet's frame.
        composer.add_field(
            RingField::uniform(10, 24.0, 0.6)
                .with_marker(geom::disc(1.8, opts).context("debris marker")?)
                .with_fill(ACCENT.with_alpha(0.8))
                .with_z(3)
                .attached_to("planet-a"),
        );

        // Frame the camera on the whole system, with margin for the tilt
        // shift so edges never clip while the scene leans.
        let reach = composer.reach() + 40.0;
        composer
            .camera
            .frame_bounds(Aabb2::centered([reach, reach]), 0.0, 0.9);
        let base_zoom = composer.camera.zoom;

        let renderer = MarkerRenderer::new(&gpu)?;

        Ok(Self {
            gpu,
            composer,
            renderer,
            t: 0.0,
            base_zoom,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.composer
            .camera
            .set_viewport_px(self.gpu.size.width.max(1), self.gpu.size.height.max(1));
    }

    pub fn render(&mut self) -> anyhow::Result<()> {
        // Gentle camera breathe relative to the framed baseline so the zoom
        // never accumulates drift.
        self.composer.camera.zoom = self.base_zoom * util::breathe(self.t, 0.04, 0.2);

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
                label: Some("Hero Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Hero Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.025,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut items = self.composer.compose_at(self.t);
            items.sort_by_key(|it| it.z);

            self.renderer
                .draw_items(&self.gpu, &mut pass, &self.composer.camera, &items)?;
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

    fn tick(&mut self, dt: f32, t: f32) {
        self.t = t;
        self.composer.advance(dt);
    }

    fn render(&mut self) -> anyhow::Result<()> {
        Self::render(self)
    }

    fn request_redraw(&self) {
        self.gpu.request_redraw();
    }

    fn pointer_moved(&mut self, ndc: [f32; 2]) {
        self.composer.set_pointer(Some(ndc));
    }

    fn pointer_left(&mut self) {
        self.composer.set_pointer(None);
    }
}
