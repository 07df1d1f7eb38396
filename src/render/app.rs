//! App entrypoint: the per-frame scheduler.
//!
//! This module owns:
//! - the winit application lifecycle + event loop
//! - window creation and input normalization (pointer to NDC, wheel to lines)
//! - the frame clock, and with it the `tick(dt, t) -> render()` cadence
//!
//! Scheduling contract (what the animation core relies on):
//! - Single-threaded and cooperative: the registered state is invoked once
//!   per display refresh, first `tick(dt, t)`, then `render()`. Nothing here
//!   blocks; `tick` is pure arithmetic over the clock values.
//! - Registration is explicit: the injected async builder constructs the
//!   state when the window appears, and a fresh `FrameClock` is attached to
//!   it. Deregistration is equally explicit: on close the state (and its
//!   clock) are dropped before the event loop exits, so no callback can run
//!   against torn-down resources.
//! - Pointer data is optional by design. `pointer_moved` delivers normalized
//!   device coordinates while a cursor is over the window; `pointer_left`
//!   signals its absence (touch-only devices simply never deliver either).
//!
//! The runner is generic over a user state `S: AppState`, so demos supply
//! their own scenes without duplicating event-loop boilerplate.

use std::{future::Future, pin::Pin, sync::Arc};

use anyhow::Context as _;
use log::info;
use winit::{
    application::ApplicationHandler,
    event::{MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::render::util::FrameClock;

/// Pixels-per-line fallback when a wheel reports pixel deltas.
const WHEEL_PIXELS_PER_LINE: f64 = 40.0;

/// App-facing configuration for running the winit event loop.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// ControlFlow for the event loop.
    pub control_flow: ControlFlow,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "orrery".to_string(),
            control_flow: ControlFlow::Poll,
        }
    }
}

/// What a state must implement to be driven by the scheduler.
///
/// `tick` receives the clamped delta since the last frame and the absolute
/// elapsed time since registration; animation code should derive everything
/// it can from `t` and reserve `dt` for smoothing filters.
pub trait AppState: 'static {
    /// Handle window resize.
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>);

    /// Advance animation state. Called exactly once before each `render`.
    fn tick(&mut self, dt: f32, t: f32);

    /// Render one frame.
    fn render(&mut self) -> anyhow::Result<()>;

    /// Request a redraw on the underlying window (continuous animation).
    fn request_redraw(&self);

    /// Pointer position in NDC (-1..1, y up). Default: ignore.
    fn pointer_moved(&mut self, _ndc: [f32; 2]) {}

    /// The pointer left the window (or never existed). Default: ignore.
    fn pointer_left(&mut self) {}

    /// Scroll input in line units (pixel deltas are converted). Default:
    /// ignore.
    fn scrolled(&mut self, _lines: f32) {}
}

/// Run the winit event loop with an explicit configuration and the library's
/// default state (an empty scene that just clears the window).
pub fn run_with_config(config: AppConfig) -> anyhow::Result<()> {
    run_with_builder::<DefaultState, _, _>(config, |window| async move {
        DefaultState::new(window).await
    })
}

/// Run the winit event loop using defaults.
pub fn run() -> anyhow::Result<()> {
    run_with_config(AppConfig::default())
}

/// Run the winit event loop with an injected async state builder.
///
/// This is the recommended entrypoint for demos: the builder is called once
/// when the app is resumed (after the window exists) and runs on the current
/// thread via `pollster::block_on`.
pub fn run_with_builder<S, B, Fut>(config: AppConfig, builder: B) -> anyhow::Result<()>
where
    S: AppState,
    B: FnOnce(Arc<Window>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<S>> + 'static,
{
    let event_loop = EventLoop::new().context("winit: failed to create EventLoop")?;
    event_loop.set_control_flow(config.control_flow);

    let mut app = App::<S>::new_with_builder(config, builder);
    event_loop
        .run_app(&mut app)
        .context("winit: run_app failed")?;

    Ok(())
}

/// Type-erased async builder for creating a state `S` from a created window.
///
/// The future is boxed and pinned so `pollster::block_on` can drive it
/// (`dyn Future` is not `Unpin`).
type BoxedStateBuilder<S> = Box<
    dyn FnOnce(Arc<Window>) -> Pin<Box<dyn Future<Output = anyhow::Result<S>> + 'static>> + 'static,
>;

/// Application driver used by winit.
struct App<S: AppState> {
    config: AppConfig,
    builder: Option<BoxedStateBuilder<S>>,

    /// Registered state + its clock. Present between `resumed` and close.
    state: Option<(S, FrameClock)>,

    /// Tracked window size for pointer-to-NDC conversion.
    size: winit::dpi::PhysicalSize<u32>,

    exiting: bool,
}

impl<S: AppState> App<S> {
    fn new_with_builder<B, Fut>(config: AppConfig, builder: B) -> Self
    where
        B: FnOnce(Arc<Window>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<S>> + 'static,
    {
        Self {
            config,
            builder: Some(Box::new(|window| Box::pin(builder(window)))),
            state: None,
            size: winit::dpi::PhysicalSize::new(1, 1),
            exiting: false,
        }
    }
}

impl<S: AppState> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = Arc::new(
            event_loop
                .create_window(WindowAttributes::default().with_title(self.config.title.as_str()))
                .expect("winit: failed to create window"),
        );
        self.size = window.inner_size();

        // Register the state: build it, attach a fresh clock so `t` counts
        // from registration.
        let builder = self
            .builder
            .take()
            .expect("app state builder can only be consumed once");
        let state = pollster::block_on(builder(window)).expect("failed to initialize state");
        self.state = Some((state, FrameClock::new()));

        // Kick off rendering.
        self.state.as_ref().unwrap().0.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some((state, clock)) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested; exiting");
                self.exiting = true;
                // Deregister: drop the state and its clock before exiting so
                // no further frame callback can fire.
                self.state = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if self.exiting {
                    return;
                }
                self.size = size;
                state.resize(size);
                state.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let ndc = {
                    let w = self.size.width.max(1) as f64;
                    let h = self.size.height.max(1) as f64;
                    [
                        ((position.x / w) * 2.0 - 1.0) as f32,
                        (1.0 - (position.y / h) * 2.0) as f32,
                    ]
                };
                state.pointer_moved(ndc);
            }
            WindowEvent::CursorLeft { .. } => {
                state.pointer_left();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / WHEEL_PIXELS_PER_LINE) as f32,
                };
                state.scrolled(lines);
            }
            WindowEvent::RedrawRequested => {
                if self.exiting {
                    return;
                }
                let dt = clock.tick();
                let t = clock.elapsed_s();
                state.tick(dt, t);
                if let Err(err) = state.render() {
                    info!("render error: {:#}", err);
                }
            }
            _ => {}
        }
    }
}

/// Default library state: empty scene, just clears the window.
///
/// Real demos provide their own `AppState` via `run_with_builder(...)`.
struct DefaultState {
    gpu: crate::render::gpu::Gpu,
}

impl DefaultState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gpu = crate::render::gpu::Gpu::new(window).await?;
        Ok(Self { gpu })
    }
}

impl AppState for DefaultState {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    fn tick(&mut self, _dt: f32, _t: f32) {}

    fn render(&mut self) -> anyhow::Result<()> {
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
                label: Some("Clear Encoder"),
            });

        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.gpu.present(encoder, frame);
        Ok(())
    }

    fn request_redraw(&self) {
        self.gpu.request_redraw();
    }
}
