//! Example: epicyclic hero composition with pointer tilt.
//!
//! Run:
//! - `cargo run --example hero_orbits`
//!
//! The demo state lives in `demos/hero_orbits_state.rs` so `src/main.rs` can
//! reuse it without duplicating event loop boilerplate.

fn main() -> anyhow::Result<()> {
    env_logger::init();

    orrery::render::app::run_with_builder(
        orrery::render::app::AppConfig {
            title: "orrery: hero_orbits".to_string(),
            ..Default::default()
        },
        |window| async move { hero_orbits_state::State::new(window).await },
    )
}

// Shared state-only demo implementation (must not define `fn main()`).
mod hero_orbits_state;
