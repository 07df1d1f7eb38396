//! Orbit frames and their composition into epicyclic trees.
//!
//! An orbit frame is a rotating reference frame: given a radius, an angular
//! speed, and a phase offset, its orientation at time `t` is
//! `phase_offset + t * angular_speed`. Frames nest: a child frame's world
//! transform is its parent's world transform composed with the child's own
//! rotate-then-translate step, so a moon rides its planet's rotating frame
//! and a station rides the moon's. That nesting is the whole trick behind
//! the hero compositions.
//!
//! Determinism contract:
//! - Orientation is recomputed from absolute `t` every evaluation. Nothing
//!   here accumulates per-frame deltas, so there is no floating-point drift
//!   over long sessions and evaluation at a given `t` is repeatable.
//! - Tree shape, radii and speeds are fixed at construction; `t` is the only
//!   thing that varies between frames.
//! - Evaluating a tree is O(nodes): one fused `Affine2::orbit` per node,
//!   parents composed before children by the traversal itself.

use crate::scene::{Affine2, DrawItem2D, Mesh2D, Rgba};

/// The construction-time parameters of one rotating frame.
///
/// `angular_speed` is in radians per second; negative values orbit clockwise.
/// `radius` may be zero, which makes a frame that spins in place at the
/// parent origin (useful for a rotating hub carrying child orbits).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitSpec {
    pub radius: f32,
    pub angular_speed: f32,
    pub phase_offset: f32,
}

impl OrbitSpec {
    #[inline]
    pub fn new(radius: f32, angular_speed: f32, phase_offset: f32) -> Self {
        Self {
            radius,
            angular_speed,
            phase_offset,
        }
    }

    /// A frame that holds a fixed bearing (no rotation over time).
    #[inline]
    pub fn fixed(radius: f32, phase_offset: f32) -> Self {
        Self::new(radius, 0.0, phase_offset)
    }

    /// Orientation in radians at absolute time `t`.
    ///
    /// Not reduced mod 2π; the trig in the transform wraps implicitly and
    /// callers comparing orientations should reduce themselves.
    #[inline]
    pub fn orientation(&self, t: f32) -> f32 {
        self.phase_offset + t * self.angular_speed
    }

    /// This frame's transform relative to its parent at time `t`.
    #[inline]
    pub fn frame_from_parent(&self, t: f32) -> Affine2 {
        Affine2::orbit(self.orientation(t), self.radius)
    }

    /// Position on the parent's circle at time `t`, without the rotation
    /// (handy for tests and for placing labels next to a node).
    #[inline]
    pub fn position(&self, t: f32) -> [f32; 2] {
        let (s, c) = self.orientation(t).sin_cos();
        [self.radius * c, self.radius * s]
    }
}

/// One node in an orbit tree.
///
/// A node may carry:
/// - `marker`: geometry drawn in the node's own rotating frame (the visible
///   planet/moon body),
/// - `guide`: geometry drawn in the *parent* frame, centered on the pivot
///   (typically a `geom::ring` tracing the node's path),
/// - `children`: nested orbits that inherit this node's full rotating frame.
#[derive(Debug, Clone)]
pub struct OrbitNode {
    pub name: String,
    pub spec: OrbitSpec,
    pub z: i32,

    pub fill: Rgba,
    pub marker: Option<Mesh2D>,

    pub guide_fill: Rgba,
    pub guide: Option<Mesh2D>,

    pub children: Vec<OrbitNode>,
}

impl OrbitNode {
    pub fn new(name: impl Into<String>, spec: OrbitSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            z: 0,
            fill: Rgba::WHITE,
            marker: None,
            guide_fill: Rgba::new(1.0, 1.0, 1.0, 0.25),
            guide: None,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn with_marker(mut self, mesh: Mesh2D) -> Self {
        self.marker = Some(mesh);
        self
    }

    #[inline]
    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = fill;
        self
    }

    #[inline]
    pub fn with_guide(mut self, mesh: Mesh2D, fill: Rgba) -> Self {
        self.guide = Some(mesh);
        self.guide_fill = fill;
        self
    }

    #[inline]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    #[inline]
    pub fn with_child(mut self, child: OrbitNode) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn add_child(&mut self, child: OrbitNode) {
        self.children.push(child);
    }

    /// World transform of this node at time `t`, given the parent's world
    /// transform.
    #[inline]
    pub fn world_at(&self, parent_world: Affine2, t: f32) -> Affine2 {
        parent_world.mul(self.spec.frame_from_parent(t))
    }

    /// Flatten this subtree into draw items at time `t`.
    ///
    /// Guides are emitted in the parent frame (they trace the path, they do
    /// not ride it); markers and children ride the rotating frame.
    pub fn flatten_at(&self, parent_world: Affine2, t: f32, out: &mut Vec<DrawItem2D>) {
        if let Some(guide) = &self.guide {
            out.push(DrawItem2D {
                mesh: guide.clone(),
                fill: self.guide_fill,
                world_from_local: parent_world,
                z: self.z - 1,
            });
        }

        let world = self.world_at(parent_world, t);

        if let Some(marker) = &self.marker {
            out.push(DrawItem2D {
                mesh: marker.clone(),
                fill: self.fill,
                world_from_local: world,
                z: self.z,
            });
        }

        for child in &self.children {
            child.flatten_at(world, t, out);
        }
    }

    /// Find `name` in this subtree and return its world transform at `t`.
    pub fn world_of(&self, name: &str, parent_world: Affine2, t: f32) -> Option<Affine2> {
        let world = self.world_at(parent_world, t);
        if self.name == name {
            return Some(world);
        }
        self.children
            .iter()
            .find_map(|child| child.world_of(name, world, t))
    }

    /// Largest radius reachable by this subtree (sum of radii down the
    /// deepest chain). Used by demos to frame the camera.
    pub fn reach(&self) -> f32 {
        let child_reach = self
            .children
            .iter()
            .map(OrbitNode::reach)
            .fold(0.0f32, f32::max);
        self.spec.radius + child_reach
    }
}

/// A set of orbit trees evaluated together under one base transform.
///
/// Node names are resolved by depth-first search at lookup time; trees are
/// small (a hero composition is a handful of nodes), so no index is kept.
#[derive(Debug, Clone, Default)]
pub struct OrbitComposition {
    pub roots: Vec<OrbitNode>,
}

impl OrbitComposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: OrbitNode) {
        self.roots.push(node);
    }

    #[inline]
    pub fn with_root(mut self, node: OrbitNode) -> Self {
        self.roots.push(node);
        self
    }

    /// Flatten every tree into draw items at time `t`.
    pub fn flatten_at(&self, base: Affine2, t: f32, out: &mut Vec<DrawItem2D>) {
        for root in &self.roots {
            root.flatten_at(base, t, out);
        }
    }

    /// World transform of the named node at time `t`, or `None` if no node
    /// carries that name.
    pub fn world_of(&self, name: &str, base: Affine2, t: f32) -> Option<Affine2> {
        self.roots
            .iter()
            .find_map(|root| root.world_of(name, base, t))
    }

    /// Largest radius reachable by any tree.
    pub fn reach(&self) -> f32 {
        self.roots.iter().map(OrbitNode::reach).fold(0.0f32, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn orientation_is_phase_plus_elapsed() {
        let spec = OrbitSpec::new(10.0, 0.5, 1.0);
        assert!((spec.orientation(0.0) - 1.0).abs() < 1e-6);
        assert!((spec.orientation(4.0) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn evaluation_is_deterministic() {
        // Same t twice must give bit-identical results: position is a pure
        // function of absolute time, with no hidden per-frame state.
        let spec = OrbitSpec::new(120.0, 0.73, 0.2);
        let a = spec.position(1234.5);
        let b = spec.position(1234.5);
        assert_eq!(a, b);

        let node = OrbitNode::new("p", spec);
        let wa = node.world_at(Affine2::IDENTITY, 777.7);
        let wb = node.world_at(Affine2::IDENTITY, 777.7);
        assert_eq!(wa.m, wb.m);
    }

    #[test]
    fn no_drift_at_large_t() {
        // Recomputing from absolute time means t = many revolutions later is
        // exactly the closed-form answer, not an accumulation of deltas.
        let spec = OrbitSpec::new(50.0, TAU, 0.0); // one revolution per second
        let p = spec.position(1000.25); // quarter revolution past whole turns

        let expected_angle = TAU * 1000.25;
        assert!((p[0] - 50.0 * expected_angle.cos()).abs() < 1e-2);
        assert!((p[1] - 50.0 * expected_angle.sin()).abs() < 1e-2);
    }

    #[test]
    fn child_rides_parent_frame() {
        // Planet at phase pi/2 (straight up), not rotating. Moon at phase 0
        // relative to the planet, also static. The planet frame is rotated
        // by pi/2, so the moon's "x axis" points up in world space.
        let planet = OrbitNode::new("planet", OrbitSpec::fixed(100.0, FRAC_PI_2))
            .with_child(OrbitNode::new("moon", OrbitSpec::fixed(20.0, 0.0)));

        let world = planet
            .world_of("moon", Affine2::IDENTITY, 0.0)
            .expect("moon resolves");
        let [x, y] = world.origin();

        assert!(x.abs() < 1e-4);
        assert!((y - 120.0).abs() < 1e-4);
    }

    #[test]
    fn nested_orientations_add() {
        // Both levels at phase pi/2: planet straight up, moon's bearing is
        // rotated another pi/2 inside the planet frame, so the moon sits at
        // planet_pos + r_moon * (cos pi, sin pi) rotated into world space.
        let planet = OrbitNode::new("planet", OrbitSpec::fixed(100.0, FRAC_PI_2))
            .with_child(OrbitNode::new("moon", OrbitSpec::fixed(20.0, FRAC_PI_2)));

        let world = planet
            .world_of("moon", Affine2::IDENTITY, 0.0)
            .expect("moon resolves");
        let [x, y] = world.origin();

        // Total bearing pi relative to the world x axis: the moon sits 20
        // units in -x from the planet at (0, 100).
        assert!((x - 20.0 * PI.cos()).abs() < 1e-4);
        assert!((y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn zero_radius_spins_in_place() {
        let hub = OrbitNode::new("hub", OrbitSpec::new(0.0, 2.0, 0.0));
        let world = hub.world_at(Affine2::IDENTITY, 3.0);
        let [x, y] = world.origin();
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);

        // The frame still rotates, carrying children with it.
        let (cx, cy) = world.transform_point(1.0, 0.0);
        assert!((cx - 6.0f32.cos()).abs() < 1e-4);
        assert!((cy - 6.0f32.sin()).abs() < 1e-4);
    }

    #[test]
    fn flatten_emits_guides_markers_and_children() {
        let mesh = Mesh2D {
            positions: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
        };

        let root = OrbitNode::new("a", OrbitSpec::fixed(10.0, 0.0))
            .with_marker(mesh.clone())
            .with_guide(mesh.clone(), Rgba::WHITE)
            .with_child(OrbitNode::new("b", OrbitSpec::fixed(5.0, 0.0)).with_marker(mesh));

        let comp = OrbitComposition::new().with_root(root);
        let mut items = Vec::new();
        comp.flatten_at(Affine2::IDENTITY, 0.0, &mut items);

        assert_eq!(items.len(), 3);

        // Child marker sits at the sum of radii along +x.
        let [x, y] = items[2].world_from_local.origin();
        assert!((x - 15.0).abs() < 1e-4);
        assert!(y.abs() < 1e-4);
    }

    #[test]
    fn reach_sums_deepest_chain() {
        let root = OrbitNode::new("a", OrbitSpec::fixed(100.0, 0.0))
            .with_child(OrbitNode::new("b", OrbitSpec::fixed(20.0, 0.0)))
            .with_child(
                OrbitNode::new("c", OrbitSpec::fixed(30.0, 0.0))
                    .with_child(OrbitNode::new("d", OrbitSpec::fixed(5.0, 0.0))),
            );

        assert!((root.reach() - 135.0).abs() < 1e-6);
    }
}
