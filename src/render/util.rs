//! Render utility helpers.
//!
//! Dependency-light helpers the frame loop and the demos lean on:
//! - time tracking (dt / elapsed)
//! - interpolation and exponential smoothing
//! - small oscillators for idle motion

use std::time::{Duration, Instant};

/// A frame timer tracking seconds since creation and since the last tick.
///
/// The app runner owns one clock per registered state and feeds both values
/// into `tick(dt, t)`. `dt` is clamped so a stall (breakpoint, window drag,
/// suspended laptop) cannot inject a giant step into smoothing filters;
/// absolute `t` is never clamped, since orbit evaluation is drift-free by
/// construction.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    /// Max dt allowed from `tick()` (in seconds).
    max_dt: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            max_dt: 0.1, // 100ms
        }
    }

    /// Set the `max_dt` clamp for `tick()`.
    #[inline]
    pub fn with_max_dt(mut self, max_dt: f32) -> Self {
        self.max_dt = max_dt.max(0.0);
        self
    }

    /// Seconds since this clock was created.
    #[inline]
    pub fn elapsed_s(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Duration since this clock was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Advance the clock and return `dt` in seconds, clamped to `[0, max_dt]`.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        dt.clamp(0.0, self.max_dt)
    }

    /// Reset the clock start time (and last tick) to now.
    #[inline]
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate-independent chase factor for exponential smoothing.
///
/// `lerp(current, target, damp(rate, dt))` each frame converges on `target`
/// at the same speed whether the display runs at 30 or 144 Hz, unlike a
/// fixed lerp factor. `rate` is in 1/seconds.
#[inline]
pub fn damp(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Smoothstep easing in `[0,1]`. Returns 0 at t<=0, 1 at t>=1.
#[inline]
pub fn smoothstep01(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// A sinusoidal oscillator in `[0, 1]`.
///
/// - `t`: time in seconds
/// - `hz`: cycles per second
#[inline]
pub fn osc_01(t: f32, hz: f32) -> f32 {
    0.5 + 0.5 * (std::f32::consts::TAU * hz * t).sin()
}

/// A sinusoidal oscillator in `[-1, 1]`.
#[inline]
pub fn osc_pm1(t: f32, hz: f32) -> f32 {
    (std::f32::consts::TAU * hz * t).sin()
}

/// A "breathing" scale around 1.0 (e.g. `amplitude = 0.04` for +/-4%).
#[inline]
pub fn breathe(t: f32, amplitude: f32, hz: f32) -> f32 {
    1.0 + amplitude * osc_pm1(t, hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damp_is_step_size_invariant() {
        // Chasing with two half steps must land where one full step lands.
        let rate = 4.0;
        let target = 1.0;

        let one_step = lerp(0.0, target, damp(rate, 0.2));

        let half = lerp(0.0, target, damp(rate, 0.1));
        let two_steps = lerp(half, target, damp(rate, 0.1));

        assert!((one_step - two_steps).abs() < 1e-5);
    }

    #[test]
    fn damp_bounds() {
        assert_eq!(damp(5.0, 0.0), 0.0);
        assert!(damp(5.0, 100.0) > 0.999);
    }

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep01(-1.0), 0.0);
        assert_eq!(smoothstep01(0.0), 0.0);
        assert_eq!(smoothstep01(1.0), 1.0);
        assert_eq!(smoothstep01(2.0), 1.0);
        assert!((smoothstep01(0.5) - 0.5).abs() < 1e-6);
    }
}
