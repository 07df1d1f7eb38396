//! `orrery` library crate root.
//!
//! A scroll-driven orbital animation engine: deterministic timelines mapped
//! onto scroll progress, epicyclic orbit trees and particle rings evaluated
//! from absolute time, and a scene composer with pointer tilt, presented
//! through a winit/wgpu layer.
//!
//! This crate is intended to be used primarily as a **library**. The binary
//! target stays thin and calls into these exported entrypoints.
//!
//! Layering:
//! - `timeline`, `orbit`, `particles`, `scene` are pure arithmetic over
//!   progress and elapsed time; they never touch the GPU or the window.
//! - `geom` builds marker meshes at construction time (lyon tessellation).
//! - `render` owns the event loop (the per-frame scheduler), the GPU
//!   context, and the batched marker renderer.

pub mod geom;
pub mod orbit;
pub mod particles;
pub mod render;
pub mod scene;
pub mod timeline;

/// Run the default winit/wgpu application (an empty clear-only scene).
///
/// Demos supply their own state through `render::app::run_with_builder`.
///
/// Note: this function does **not** initialize logging; callers decide their
/// own logging setup.
pub fn run_app() -> anyhow::Result<()> {
    render::app::run()
}
