//! Example: wheel-scrolled narrative slides on the segment timeline.
//!
//! Run:
//! - `cargo run --example story_slides`
//!
//! Scroll the mouse wheel to move through the section; progress is clamped
//! at both ends.

fn main() -> anyhow::Result<()> {
    env_logger::init();

    orrery::render::app::run_with_builder(
        orrery::render::app::AppConfig {
            title: "orrery: story_slides".to_string(),
            ..Default::default()
        },
        |window| async move { story_slides_state::State::new(window).await },
    )
}

// Shared state-only demo implementation (must not define `fn main()`).
mod story_slides_state;
