//! Scroll-driven segment timelines.
//!
//! A narrative section maps normalized scroll progress in [0, 1] onto a
//! sequence of slides. Each slide owns a sub-range of progress: it fades and
//! slides in, holds, then fades and slides out as the next one arrives.
//! The mapping is:
//! - `step = 1 / (total + 1)`
//! - slide `i` activates across the breakpoints
//!   `start = (i + 0.8) * step`, `in_peak = (i + 1.0) * step`,
//!   `out_peak = (i + 1.8) * step`, `end = (i + 2.0) * step`
//!
//! Adjacent slides overlap only in their fade edges, never at peak, and the
//! last slide's `end` lands exactly on 1.0. The caller sizes the scrollable
//! section to `(total + 1)` viewport heights so one viewport of scrolling
//! maps to one `step` (see [`required_span`]).
//!
//! Outputs are continuous piecewise-linear functions of progress, clamped
//! outside [0, 1]. Degenerate input is not an error: a zero-slide track is a
//! single always-visible segment.
//!
//! Usage sketch:
//! ```ignore
//! use orrery::timeline::{ScrollObserver, SegmentTrack, SlideMode};
//! let track = SegmentTrack::new(1, 3, SlideMode::Split).with_travel(80.0);
//! let mut scroll = ScrollObserver::for_segments(3);
//! // per wheel event: scroll.scroll_by(lines * LINE_HEIGHT_FRACTION);
//! // per frame:
//! let p = scroll.progress();
//! let alpha = track.opacity(p);
//! let shift = track.offset(p);
//! ```

/// How to map a normalized [0,1] ramp parameter into an eased value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    #[inline]
    pub fn sample(self, x: f32) -> f32 {
        let t = x.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InQuad => t * t,
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
            Ease::InCubic => t * t * t,
            Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
            Ease::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
                }
            }
        }
    }
}

/// A keyframe in the progress domain: a scalar value pinned at `at ∈ [0,1]`.
#[derive(Debug, Copy, Clone)]
pub struct Keyframe {
    pub at: f32,
    pub value: f32,
    pub ease: Ease,
}

impl Keyframe {
    #[inline]
    pub fn at(at: f32, value: f32) -> Self {
        Self {
            at: at.clamp(0.0, 1.0),
            value,
            ease: Ease::Linear,
        }
    }

    #[inline]
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

/// Interpolate a keyframe table at `p`.
///
/// Values hold at the ends (no extrapolation). Frames must be sorted by
/// `at`; the track constructors below always produce sorted tables.
fn sample_keyframes(frames: &[Keyframe], p: f32) -> Option<f32> {
    if frames.is_empty() {
        return None;
    }
    if frames.len() == 1 {
        return Some(frames[0].value);
    }

    let mut prev = frames[0];
    if p <= prev.at {
        return Some(prev.value);
    }

    // O(n) segment walk; tracks hold four or five frames.
    for next in &frames[1..] {
        if p < next.at {
            let dp = (next.at - prev.at).max(1e-6);
            let u = (p - prev.at) / dp;
            let k = prev.ease.sample(u);
            return Some(lerp(prev.value, next.value, k));
        }
        prev = *next;
    }

    Some(frames[frames.len() - 1].value)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Width of the opacity fade-in, as an absolute fraction of progress. Capped
/// at the start-to-peak distance so opacity always reaches 1 by `in_peak`.
const FADE_IN_WIDTH: f32 = 0.1;

/// Section layout, fixed at construction.
///
/// The two layouts the page templates use:
/// - `Split`: every slide enters, holds and exits the same way.
/// - `Stacked`: slides pile onto a persistent background; the first slide is
///   fully visible at progress 0 with no entry travel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlideMode {
    Split,
    Stacked,
}

/// The four progress breakpoints of one slide.
///
/// Invariant: `start < in_peak < out_peak < end` for every valid index, and
/// `end <= 1.0` with equality on the last index.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SegmentTiming {
    pub start: f32,
    pub in_peak: f32,
    pub out_peak: f32,
    pub end: f32,
}

impl SegmentTiming {
    /// Breakpoints for slide `index` of `total`.
    ///
    /// `total == 0` has no meaningful schedule; [`SegmentTrack`] handles it
    /// before ever asking for timing.
    pub fn for_segment(index: usize, total: usize) -> Self {
        let step = 1.0 / (total + 1) as f32;
        let i = index as f32;
        Self {
            start: (i + 0.8) * step,
            in_peak: (i + 1.0) * step,
            out_peak: (i + 1.8) * step,
            end: (i + 2.0) * step,
        }
    }

    /// End of the opacity fade-in ramp.
    #[inline]
    pub fn fade_in_end(&self) -> f32 {
        (self.start + FADE_IN_WIDTH).min(self.in_peak)
    }
}

/// Maps section progress to one slide's opacity and positional offset.
///
/// The keyframe tables are built once at construction (per mode, per index)
/// and sampled per frame; only `progress` varies afterwards.
#[derive(Debug, Clone)]
pub struct SegmentTrack {
    pub index: usize,
    pub total: usize,
    pub mode: SlideMode,

    opacity_frames: Vec<Keyframe>,
    offset_frames: Vec<Keyframe>,
}

impl SegmentTrack {
    /// A track with symmetric travel: slides enter from `+travel` and exit
    /// toward `-travel` (the common slide-up motion). Use
    /// [`SegmentTrack::with_entry_exit`] for asymmetric values.
    pub fn new(index: usize, total: usize, mode: SlideMode) -> Self {
        Self::with_entry_exit(index, total, mode, 100.0, -100.0)
    }

    /// Symmetric travel: entry `travel`, exit `-travel`.
    pub fn with_travel(self, travel: f32) -> Self {
        Self::with_entry_exit(self.index, self.total, self.mode, travel, -travel)
    }

    /// Build a track with explicit entry/exit offsets (any unit the caller
    /// renders with: px, pt, percent).
    pub fn with_entry_exit(
        index: usize,
        total: usize,
        mode: SlideMode,
        entry: f32,
        exit: f32,
    ) -> Self {
        let (opacity_frames, offset_frames) = build_tables(index, total, mode, entry, exit);
        Self {
            index,
            total,
            mode,
            opacity_frames,
            offset_frames,
        }
    }

    /// Apply an ease to the opacity ramps (endpoints are unaffected, so the
    /// continuity and peak contracts hold for every ease).
    pub fn with_fade_ease(mut self, ease: Ease) -> Self {
        for k in &mut self.opacity_frames {
            k.ease = ease;
        }
        self
    }

    #[inline]
    pub fn timing(&self) -> SegmentTiming {
        SegmentTiming::for_segment(self.index, self.total)
    }

    /// Opacity in [0, 1] at `progress` (clamped before evaluation).
    pub fn opacity(&self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        sample_keyframes(&self.opacity_frames, p).unwrap_or(1.0)
    }

    /// Positional offset at `progress` (clamped before evaluation): `entry`
    /// before the slide arrives, 0 across the hold, `exit` once it has left.
    pub fn offset(&self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        sample_keyframes(&self.offset_frames, p).unwrap_or(0.0)
    }
}

/// Keyframe tables per mode. Each arm is a complete, self-contained schedule
/// rather than conditionals sprinkled through one evaluator.
fn build_tables(
    index: usize,
    total: usize,
    mode: SlideMode,
    entry: f32,
    exit: f32,
) -> (Vec<Keyframe>, Vec<Keyframe>) {
    // No slides: a single always-visible segment that never travels.
    if total == 0 {
        return (vec![Keyframe::at(0.0, 1.0)], vec![Keyframe::at(0.0, 0.0)]);
    }

    let timing = SegmentTiming::for_segment(index, total);

    match (mode, index) {
        // Stacked background slide: visible from progress 0, no entry
        // travel, normal exit.
        (SlideMode::Stacked, 0) => (
            vec![
                Keyframe::at(0.0, 1.0),
                Keyframe::at(timing.out_peak, 1.0),
                Keyframe::at(timing.end, 0.0),
            ],
            vec![
                Keyframe::at(0.0, 0.0),
                Keyframe::at(timing.out_peak, 0.0),
                Keyframe::at(timing.end, exit),
            ],
        ),

        _ => (
            vec![
                Keyframe::at(timing.start, 0.0),
                Keyframe::at(timing.fade_in_end(), 1.0),
                Keyframe::at(timing.out_peak, 1.0),
                Keyframe::at(timing.end, 0.0),
            ],
            vec![
                Keyframe::at(timing.start, entry),
                Keyframe::at(timing.in_peak, 0.0),
                Keyframe::at(timing.out_peak, 0.0),
                Keyframe::at(timing.end, exit),
            ],
        ),
    }
}

/// Scroll span (in viewport-height units) a section needs so that its
/// `total` slides all complete: one extra viewport beyond the slide count.
#[inline]
pub fn required_span(total: usize) -> f32 {
    (total + 1) as f32
}

/// Accumulates scroll input into clamped, normalized progress.
///
/// The observer is the one mutable piece of timeline state; tracks stay pure.
/// `span` is in viewport-height units ([`required_span`] for a slide
/// section); deltas arrive in the same units (the app layer converts wheel
/// lines or pixels before calling in).
#[derive(Debug, Clone)]
pub struct ScrollObserver {
    position: f32,
    span: f32,
}

impl ScrollObserver {
    pub fn new(span: f32) -> Self {
        Self {
            position: 0.0,
            // Zero or negative spans would make progress undefined; treat
            // them as an already-complete section.
            span: span.max(f32::EPSILON),
        }
    }

    /// An observer sized for a `total`-slide section.
    pub fn for_segments(total: usize) -> Self {
        Self::new(required_span(total))
    }

    /// Advance (or rewind) by `delta` viewport-heights, clamping to the span.
    pub fn scroll_by(&mut self, delta: f32) {
        self.position = (self.position + delta).clamp(0.0, self.span);
    }

    /// Jump straight to a progress value (e.g. restoring a deep link).
    pub fn set_progress(&mut self, progress: f32) {
        self.position = progress.clamp(0.0, 1.0) * self.span;
    }

    /// Normalized progress in [0, 1].
    #[inline]
    pub fn progress(&self) -> f32 {
        self.position / self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn breakpoints_are_monotonic_and_bounded() {
        for total in 1..=8 {
            for index in 0..total {
                let t = SegmentTiming::for_segment(index, total);
                assert!(t.start < t.in_peak, "total={total} index={index}");
                assert!(t.in_peak < t.out_peak, "total={total} index={index}");
                assert!(t.out_peak < t.end, "total={total} index={index}");
                assert!(t.end <= 1.0 + EPS, "total={total} index={index}");
            }

            // Last slide completes exactly at full progress.
            let last = SegmentTiming::for_segment(total - 1, total);
            assert!((last.end - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn neighbors_overlap_only_in_fade_edges() {
        // Slide i is fading out over [out_peak, end] while slide i+1 fades in
        // over [start, fade_in_end]; the peaks themselves never overlap.
        for total in 2..=6 {
            for index in 0..total - 1 {
                let a = SegmentTiming::for_segment(index, total);
                let b = SegmentTiming::for_segment(index + 1, total);
                assert!(a.out_peak <= b.start + EPS);
                assert!(a.end <= b.fade_in_end() + EPS);
            }
        }
    }

    #[test]
    fn worked_scenario_total_3_index_1() {
        let t = SegmentTiming::for_segment(1, 3);
        assert!((t.start - 0.45).abs() < EPS);
        assert!((t.in_peak - 0.5).abs() < EPS);
        assert!((t.out_peak - 0.7).abs() < EPS);
        assert!((t.end - 0.75).abs() < EPS);

        let track = SegmentTrack::with_entry_exit(1, 3, SlideMode::Split, 100.0, -100.0);
        assert!((track.opacity(0.5) - 1.0).abs() < EPS);
        assert!(track.offset(0.5).abs() < EPS);
        assert!(track.opacity(0.4).abs() < EPS);

        // Partway up the entry ramp.
        let mid = track.opacity(0.46);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn opacity_hits_endpoints_and_peaks() {
        for total in 1..=5 {
            for index in 0..total {
                let track = SegmentTrack::new(index, total, SlideMode::Split);
                let t = track.timing();
                assert!(track.opacity(t.start).abs() < EPS);
                assert!((track.opacity(t.in_peak) - 1.0).abs() < EPS);
                assert!((track.opacity(t.out_peak) - 1.0).abs() < EPS);
                assert!(track.opacity(t.end).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn opacity_is_continuous() {
        // No jump discontinuities: adjacent samples on a fine grid stay
        // within the ramp's worst-case slope.
        let track = SegmentTrack::new(2, 4, SlideMode::Split);
        let steps = 4000;
        let max_slope = 1.0 / (0.2 / 5.0); // steepest ramp: fade over 0.2*step

        let mut prev = track.opacity(0.0);
        for i in 1..=steps {
            let p = i as f32 / steps as f32;
            let cur = track.opacity(p);
            assert!((cur - prev).abs() <= max_slope / steps as f32 + EPS);
            prev = cur;
        }
    }

    #[test]
    fn progress_clamps_instead_of_extrapolating() {
        let track = SegmentTrack::new(0, 3, SlideMode::Split);
        assert_eq!(track.opacity(-0.5), track.opacity(0.0));
        assert_eq!(track.opacity(1.5), track.opacity(1.0));
        assert_eq!(track.offset(-0.5), track.offset(0.0));
        assert_eq!(track.offset(1.5), track.offset(1.0));
    }

    #[test]
    fn offset_travels_entry_hold_exit() {
        let track = SegmentTrack::with_entry_exit(1, 3, SlideMode::Split, 80.0, -80.0);
        let t = track.timing();

        assert!((track.offset(0.0) - 80.0).abs() < EPS);
        assert!((track.offset(t.start) - 80.0).abs() < EPS);
        assert!(track.offset((t.in_peak + t.out_peak) * 0.5).abs() < EPS);
        assert!((track.offset(1.0) + 80.0).abs() < 1e-3);
    }

    #[test]
    fn zero_total_is_always_visible() {
        let track = SegmentTrack::new(0, 0, SlideMode::Split);
        for p in [-1.0f32, 0.0, 0.33, 1.0, 2.0] {
            assert_eq!(track.opacity(p), 1.0);
            assert_eq!(track.offset(p), 0.0);
        }
    }

    #[test]
    fn stacked_first_slide_visible_from_zero() {
        let track = SegmentTrack::new(0, 3, SlideMode::Stacked);
        assert_eq!(track.opacity(0.0), 1.0);
        assert_eq!(track.offset(0.0), 0.0);

        // It still exits on schedule.
        let t = track.timing();
        assert!((track.opacity(t.out_peak) - 1.0).abs() < EPS);
        assert!(track.opacity(t.end).abs() < 1e-3);

        // Later slides behave as in split mode.
        let second = SegmentTrack::new(1, 3, SlideMode::Stacked);
        assert!(second.opacity(0.0).abs() < EPS);
    }

    #[test]
    fn eased_fade_keeps_endpoints() {
        let track = SegmentTrack::new(1, 3, SlideMode::Split).with_fade_ease(Ease::InOutCubic);
        let t = track.timing();
        assert!(track.opacity(t.start).abs() < EPS);
        assert!((track.opacity(t.in_peak) - 1.0).abs() < EPS);
        assert!(track.opacity(t.end).abs() < 1e-3);
    }

    #[test]
    fn scroll_observer_clamps_and_normalizes() {
        let mut scroll = ScrollObserver::for_segments(3);
        assert_eq!(scroll.progress(), 0.0);

        scroll.scroll_by(2.0);
        assert!((scroll.progress() - 0.5).abs() < EPS);

        scroll.scroll_by(100.0);
        assert!((scroll.progress() - 1.0).abs() < EPS);

        scroll.scroll_by(-100.0);
        assert_eq!(scroll.progress(), 0.0);

        scroll.set_progress(0.25);
        assert!((scroll.progress() - 0.25).abs() < EPS);
    }
}
