//! Particle rings: many small markers sharing one circular path.
//!
//! A ring assigns each particle a fixed phase around the circle and advances
//! every particle at the same angular speed, so the spacing laid down at
//! construction time is preserved for all `t` (the phases differ by
//! constants, the speed is shared). Like the orbit module, positions are
//! pure functions of absolute time.
//!
//! A ring with `speed == 0` and polygon-vertex phases doubles as a static
//! vertex field, which is how the demos pin markers to polyhedron-style
//! outlines.

use std::f32::consts::TAU;

use crate::scene::{Affine2, DrawItem2D, Mesh2D, Rgba};

/// A ring of `phases.len()` particles with a shared radius and speed.
///
/// `attach` optionally names an orbit node; the composer then evaluates the
/// ring inside that node's rotating frame instead of the scene base, which
/// strings markers along an orbit path.
#[derive(Debug, Clone)]
pub struct RingField {
    pub radius: f32,
    /// Angular speed in radians per second, shared by every particle.
    pub speed: f32,
    phases: Vec<f32>,

    pub marker: Mesh2D,
    pub fill: Rgba,
    pub z: i32,
    pub attach: Option<String>,
}

impl RingField {
    /// A ring of `count` particles spaced uniformly: particle `i` gets phase
    /// `i / count * 2π`.
    ///
    /// `count == 0` yields an empty field (no division by zero, nothing to
    /// draw), which is the degenerate-input contract for this module.
    pub fn uniform(count: usize, radius: f32, speed: f32) -> Self {
        let phases = (0..count)
            .map(|i| (i as f32 / count as f32) * TAU)
            .collect();
        Self::with_phases(phases, radius, speed)
    }

    /// Markers pinned to the vertices of a regular polygon (a static ring).
    pub fn polygon_vertices(sides: usize, radius: f32) -> Self {
        Self::uniform(sides, radius, 0.0)
    }

    /// A ring with explicit per-particle phases (radians).
    pub fn with_phases(phases: Vec<f32>, radius: f32, speed: f32) -> Self {
        Self {
            radius,
            speed,
            phases,
            marker: Mesh2D::default(),
            fill: Rgba::WHITE,
            z: 0,
            attach: None,
        }
    }

    #[inline]
    pub fn with_marker(mut self, mesh: Mesh2D) -> Self {
        self.marker = mesh;
        self
    }

    #[inline]
    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = fill;
        self
    }

    #[inline]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    /// Evaluate this ring inside the named orbit node's frame.
    #[inline]
    pub fn attached_to(mut self, node_name: impl Into<String>) -> Self {
        self.attach = Some(node_name.into());
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    #[inline]
    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    /// Angle of particle `i` at time `t`.
    #[inline]
    pub fn angle_at(&self, i: usize, t: f32) -> f32 {
        self.phases[i] + t * self.speed
    }

    /// Position of particle `i` at time `t`, in the ring's local frame.
    #[inline]
    pub fn position_at(&self, i: usize, t: f32) -> [f32; 2] {
        let (s, c) = self.angle_at(i, t).sin_cos();
        [self.radius * c, self.radius * s]
    }

    /// All particle positions at time `t`.
    pub fn positions_at(&self, t: f32) -> Vec<[f32; 2]> {
        (0..self.len()).map(|i| self.position_at(i, t)).collect()
    }

    /// Emit one draw item per particle, placed inside `frame`.
    ///
    /// An empty marker mesh emits nothing; the field then only exists for
    /// callers that read positions directly.
    pub fn emit(&self, frame: Affine2, t: f32, out: &mut Vec<DrawItem2D>) {
        if self.marker.positions.is_empty() {
            return;
        }

        for i in 0..self.len() {
            let [x, y] = self.position_at(i, t);
            out.push(DrawItem2D {
                mesh: self.marker.clone(),
                fill: self.fill,
                world_from_local: frame.mul(Affine2::translate(x, y)),
                z: self.z,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reduce an angle to [0, 2π).
    fn wrap(a: f32) -> f32 {
        let mut a = a % TAU;
        if a < 0.0 {
            a += TAU;
        }
        a
    }

    #[test]
    fn uniform_spacing_holds_for_all_t() {
        let ring = RingField::uniform(7, 30.0, 1.3);
        let expected_gap = TAU / 7.0;

        for &t in &[0.0f32, 0.37, 12.0, 5000.5] {
            let mut angles: Vec<f32> = (0..ring.len()).map(|i| wrap(ring.angle_at(i, t))).collect();
            angles.sort_by(|a, b| a.partial_cmp(b).unwrap());

            for w in angles.windows(2) {
                assert!((w[1] - w[0] - expected_gap).abs() < 1e-3);
            }
            // Closing gap wraps around 2π.
            let closing = angles[0] + TAU - angles[angles.len() - 1];
            assert!((closing - expected_gap).abs() < 1e-3);
        }
    }

    #[test]
    fn empty_ring_is_safe() {
        let ring = RingField::uniform(0, 30.0, 1.0);
        assert!(ring.is_empty());
        assert!(ring.positions_at(5.0).is_empty());

        let mut out = Vec::new();
        ring.emit(Affine2::IDENTITY, 5.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_radius_collapses_to_frame_origin() {
        let ring = RingField::uniform(4, 0.0, 2.0);
        for p in ring.positions_at(9.0) {
            assert_eq!(p, [0.0, 0.0]);
        }
    }

    #[test]
    fn positions_are_pure_in_t() {
        let ring = RingField::uniform(5, 12.0, 0.9);
        assert_eq!(ring.positions_at(42.0), ring.positions_at(42.0));
    }

    #[test]
    fn polygon_vertices_are_static() {
        let ring = RingField::polygon_vertices(6, 10.0);
        assert_eq!(ring.positions_at(0.0), ring.positions_at(100.0));
        assert_eq!(ring.len(), 6);
    }

    #[test]
    fn emit_places_particles_inside_frame() {
        let marker = Mesh2D {
            positions: vec![[0.0, 0.0]],
            indices: vec![],
        };
        let ring = RingField::uniform(1, 10.0, 0.0).with_marker(marker);

        let mut out = Vec::new();
        ring.emit(Affine2::translate(100.0, 0.0), 0.0, &mut out);

        assert_eq!(out.len(), 1);
        let [x, y] = out[0].world_from_local.origin();
        assert!((x - 110.0).abs() < 1e-4);
        assert!(y.abs() < 1e-4);
    }
}
