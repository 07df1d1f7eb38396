//! Rendering module root.
//!
//! The `render` module owns window/event-loop integration (the per-frame
//! scheduler) and the GPU presentation of composed frames. The animation
//! core never imports from here except `util` (pure math helpers).
//!
//! Current entrypoint: `render::app::run()`.

pub mod app;

/// GPU context shared across render submodules.
pub mod gpu;

/// Batched renderer for marker draw items.
pub mod marker_renderer;

/// Time tracking, interpolation and smoothing helpers.
pub mod util;
