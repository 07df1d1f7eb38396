//! The scene composer: one visual frame assembled from orbit compositions
//! and particle rings, under a pointer-driven global tilt.
//!
//! Ownership model:
//! - A composer instance exclusively owns every composition and field it
//!   holds. All mutation happens inside the owner's per-frame callback;
//!   nothing is shared between composer instances, so several sections of a
//!   page can each run their own composer without ordering hazards.
//! - `advance(dt)` mutates only the tilt filter. Everything else is a pure
//!   function of absolute time, evaluated in `compose_at(t)`.
//!
//! The tilt is the one intentionally stateful piece: pointer-move events are
//! discrete and jittery, so the target is chased with an exponential filter
//! instead of snapping. Absent pointer data (touch-only devices, cursor off
//! the window) the target falls back to zero and the scene settles level.

use crate::orbit::OrbitComposition;
use crate::particles::RingField;
use crate::render::util::{damp, lerp};
use crate::scene::{Affine2, Camera2D, DrawItem2D};

/// Construction-time tilt gains.
#[derive(Debug, Copy, Clone)]
pub struct TiltConfig {
    /// Roll around the view center per unit of pointer x, in radians.
    pub roll: f32,
    /// Parallax shift per unit of pointer x/y, in world units.
    pub shift: [f32; 2],
    /// Exponential responsiveness of the filter, in 1/seconds. Higher
    /// values track the pointer more eagerly.
    pub responsiveness: f32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            roll: 0.05,
            shift: [12.0, 8.0],
            responsiveness: 6.0,
        }
    }
}

/// A composed frame source: compositions, fields, camera, tilt.
#[derive(Debug, Default)]
pub struct SceneComposer {
    pub camera: Camera2D,

    compositions: Vec<OrbitComposition>,
    fields: Vec<RingField>,

    tilt_config: TiltConfig,
    tilt_target: [f32; 2],
    tilt_current: [f32; 2],
}

impl SceneComposer {
    pub fn new(tilt_config: TiltConfig) -> Self {
        Self {
            camera: Camera2D::default(),
            compositions: Vec::new(),
            fields: Vec::new(),
            tilt_config,
            tilt_target: [0.0, 0.0],
            tilt_current: [0.0, 0.0],
        }
    }

    pub fn add_composition(&mut self, composition: OrbitComposition) {
        self.compositions.push(composition);
    }

    pub fn add_field(&mut self, field: RingField) {
        self.fields.push(field);
    }

    #[inline]
    pub fn compositions(&self) -> &[OrbitComposition] {
        &self.compositions
    }

    /// Feed the latest pointer position in normalized device coordinates,
    /// or `None` when there is no pointer (the tilt then settles to zero).
    pub fn set_pointer(&mut self, ndc: Option<[f32; 2]>) {
        let [x, y] = ndc.unwrap_or([0.0, 0.0]);
        self.tilt_target = [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)];
    }

    /// Advance the tilt filter by `dt` seconds.
    ///
    /// The chase factor is `1 - exp(-responsiveness * dt)`, so the filter
    /// converges at the same rate regardless of frame cadence.
    pub fn advance(&mut self, dt: f32) {
        let k = damp(self.tilt_config.responsiveness, dt);
        self.tilt_current = [
            lerp(self.tilt_current[0], self.tilt_target[0], k),
            lerp(self.tilt_current[1], self.tilt_target[1], k),
        ];
    }

    /// The smoothed tilt value currently applied (mostly for tests/debug).
    #[inline]
    pub fn tilt(&self) -> [f32; 2] {
        self.tilt_current
    }

    /// The global transform every composition and field hangs off.
    pub fn tilt_transform(&self) -> Affine2 {
        let [x, y] = self.tilt_current;
        let cfg = self.tilt_config;

        Affine2::translate(x * cfg.shift[0], y * cfg.shift[1]).mul(Affine2::rotate(x * cfg.roll))
    }

    /// Flatten the whole scene into draw items at absolute time `t`.
    ///
    /// Parent frames are composed before their children by traversal order;
    /// attached fields resolve their orbit node by name at the same `t`, so
    /// no stale transform can be observed. Callers sort by `z` before
    /// drawing.
    pub fn compose_at(&self, t: f32) -> Vec<DrawItem2D> {
        let base = self.tilt_transform();
        let mut items = Vec::new();

        for composition in &self.compositions {
            composition.flatten_at(base, t, &mut items);
        }

        for field in &self.fields {
            let frame = field
                .attach
                .as_deref()
                .and_then(|name| {
                    self.compositions
                        .iter()
                        .find_map(|c| c.world_of(name, base, t))
                })
                .unwrap_or(base);

            field.emit(frame, t, &mut items);
        }

        items
    }

    /// Widest reach of any owned composition (camera framing helper).
    pub fn reach(&self) -> f32 {
        let comp = self
            .compositions
            .iter()
            .map(OrbitComposition::reach)
            .fold(0.0f32, f32::max);
        let field = self
            .fields
            .iter()
            .map(|f| f.radius)
            .fold(0.0f32, f32::max);
        comp.max(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::{OrbitNode, OrbitSpec};
    use crate::scene::Mesh2D;

    fn dot_mesh() -> Mesh2D {
        Mesh2D {
            positions: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn missing_pointer_means_level_scene() {
        let mut composer = SceneComposer::new(TiltConfig::default());
        composer.set_pointer(None);
        for _ in 0..100 {
            composer.advance(1.0 / 60.0);
        }

        assert_eq!(composer.tilt(), [0.0, 0.0]);
        assert_eq!(composer.tilt_transform(), Affine2::IDENTITY);
    }

    #[test]
    fn tilt_chases_pointer_without_snapping() {
        let mut composer = SceneComposer::new(TiltConfig::default());
        composer.set_pointer(Some([1.0, 0.5]));

        composer.advance(1.0 / 60.0);
        let after_one = composer.tilt();
        assert!(after_one[0] > 0.0 && after_one[0] < 1.0);

        for _ in 0..600 {
            composer.advance(1.0 / 60.0);
        }
        let settled = composer.tilt();
        assert!((settled[0] - 1.0).abs() < 1e-3);
        assert!((settled[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn pointer_values_are_clamped() {
        let mut composer = SceneComposer::new(TiltConfig::default());
        composer.set_pointer(Some([5.0, -9.0]));
        for _ in 0..600 {
            composer.advance(1.0 / 60.0);
        }
        let t = composer.tilt();
        assert!((t[0] - 1.0).abs() < 1e-3);
        assert!((t[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn compose_applies_tilt_to_every_item() {
        let mut composer = SceneComposer::new(TiltConfig {
            roll: 0.0,
            shift: [10.0, 0.0],
            responsiveness: 1e6, // effectively instant for the test
        });

        composer.add_composition(OrbitComposition::new().with_root(
            OrbitNode::new("p", OrbitSpec::fixed(50.0, 0.0)).with_marker(dot_mesh()),
        ));

        composer.set_pointer(Some([1.0, 0.0]));
        composer.advance(1.0);

        let items = composer.compose_at(0.0);
        assert_eq!(items.len(), 1);

        // Marker origin: tilt shift (10, 0) plus orbit radius 50 along +x.
        let [x, y] = items[0].world_from_local.origin();
        assert!((x - 60.0).abs() < 1e-2);
        assert!(y.abs() < 1e-4);
    }

    #[test]
    fn attached_field_rides_its_node() {
        let mut composer = SceneComposer::new(TiltConfig::default());
        composer.add_composition(OrbitComposition::new().with_root(OrbitNode::new(
            "planet",
            OrbitSpec::fixed(100.0, 0.0),
        )));
        composer.add_field(
            RingField::uniform(1, 10.0, 0.0)
                .with_marker(dot_mesh())
                .attached_to("planet"),
        );

        let items = composer.compose_at(0.0);
        assert_eq!(items.len(), 1);

        let [x, y] = items[0].world_from_local.origin();
        assert!((x - 110.0).abs() < 1e-3);
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn unattached_and_unresolvable_fields_use_the_base_frame() {
        let mut composer = SceneComposer::new(TiltConfig::default());
        composer.add_field(
            RingField::uniform(1, 10.0, 0.0)
                .with_marker(dot_mesh())
                .attached_to("no-such-node"),
        );

        let items = composer.compose_at(0.0);
        assert_eq!(items.len(), 1);
        let [x, _] = items[0].world_from_local.origin();
        assert!((x - 10.0).abs() < 1e-3);
    }
}
