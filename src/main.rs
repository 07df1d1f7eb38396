//! Thin binary wrapper for local development.
//!
//! Project direction: `orrery` is primarily a **library**. This binary exists
//! only to preserve the convenience of `cargo run`.
//!
//! Default behavior:
//! - Run the hero orbit demo via the library runner (`run_with_builder`).
//! - The actual demo state lives in `demos/hero_orbits_state.rs` and is
//!   included here to avoid duplicating event loop/renderer boilerplate.
//!
//! Run:
//! - `cargo run`

fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    orrery::render::app::run_with_builder(
        orrery::render::app::AppConfig {
            title: "orrery: hero_orbits (default)".to_string(),
            ..Default::default()
        },
        |window| async move { hero_orbits_state::State::new(window).await },
    )
}

// Include the shared state-only demo implementation.
// This file must not define `fn main()`.
#[path = "../demos/hero_orbits_state.rs"]
mod hero_orbits_state;
