//! Scene-level types shared by the animation core and the renderer.
//!
//! The engine composes rotating frames (orbits) and particle rings into one
//! visual frame. This module provides the pieces that composition is built
//! from:
//! - `Affine2`: explicit, composable 2D transforms (matrix order matters).
//! - `Mesh2D` / `DrawItem2D`: renderer-agnostic geometry plus per-item style.
//! - `Camera2D`: maps world coordinates to clip space, with bounds framing.
//! - `composer::SceneComposer`: owns orbit compositions and particle fields
//!   and flattens them into draw items once per frame.
//!
//! Conventions:
//! - World units are arbitrary; demos use a pt-like scale. Be consistent.
//! - Column vectors (x, y, 1); composition is `world_from_local = parent * local`.
//! - Depth is painter's order only: callers sort draw items by `z`.
//!
//! Nothing in this module touches the GPU or the window. It is pure data and
//! arithmetic, safe to evaluate unconditionally every frame.

pub mod composer;

pub use composer::{SceneComposer, TiltConfig};

/// 2D affine transform stored as a 3x3 matrix in column-major order.
///
/// A 3x3 affine is all the engine needs: rotation about an origin, translation
/// along a radius, and the camera's scale/translate. It embeds into a 4x4 MVP
/// for the GPU via [`Affine2::to_mat4`].
///
/// Convention:
/// - Column vectors (x, y, 1)
/// - `self.mul(rhs)` applies `rhs` first, then `self`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    /// Column-major 3x3 matrix.
    pub m: [[f32; 3]; 3],
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    #[inline]
    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [tx, ty, 1.0]],
        }
    }

    #[inline]
    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            m: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    #[inline]
    pub fn rotate(rad: f32) -> Self {
        let (s, c) = rad.sin_cos();
        Self {
            m: [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// The orbital frame step: rotate by `rad`, then carry the origin out to
    /// `radius` along the rotated x axis.
    ///
    /// Equivalent to `rotate(rad).mul(translate(radius, 0.0))`, fused so the
    /// per-node cost in the orbit traversal is one trig pair rather than a
    /// full matrix multiply. The frame's axes stay rotated by `rad`, which is
    /// what nests epicycles: a child orbit rides the rotated frame.
    #[inline]
    pub fn orbit(rad: f32, radius: f32) -> Self {
        let (s, c) = rad.sin_cos();
        Self {
            m: [[c, s, 0.0], [-s, c, 0.0], [radius * c, radius * s, 1.0]],
        }
    }

    /// Compose transforms: `self * rhs` (rhs applies first).
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        let a = self.m;
        let b = rhs.m;

        // Column-major 3x3 multiply: out = a * b.
        let mut out = [[0.0f32; 3]; 3];
        for col in 0..3 {
            for row in 0..3 {
                out[col][row] =
                    a[0][row] * b[col][0] + a[1][row] * b[col][1] + a[2][row] * b[col][2];
            }
        }
        Self { m: out }
    }

    #[inline]
    pub fn transform_point(self, x: f32, y: f32) -> (f32, f32) {
        // Column vector [x, y, 1]
        let nx = self.m[0][0] * x + self.m[1][0] * y + self.m[2][0];
        let ny = self.m[0][1] * x + self.m[1][1] * y + self.m[2][1];
        (nx, ny)
    }

    /// This frame's origin in the parent space, i.e. the translation column.
    #[inline]
    pub fn origin(self) -> [f32; 2] {
        [self.m[2][0], self.m[2][1]]
    }

    /// Embed into a column-major 4x4 for GPU MVP use (z passes through, w = 1).
    #[inline]
    pub fn to_mat4(self) -> [[f32; 4]; 4] {
        let m = self.m;
        [
            [m[0][0], m[0][1], 0.0, m[0][2]],
            [m[1][0], m[1][1], 0.0, m[1][2]],
            [0.0, 0.0, 1.0, 0.0],
            [m[2][0], m[2][1], 0.0, m[2][2]],
        ]
    }
}

/// Axis-aligned bounding box in world units.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Aabb2 {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Aabb2 {
    #[inline]
    pub fn from_min_max(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    /// A box centered on the origin, e.g. the reach of an orbit composition
    /// whose outermost radius is known.
    #[inline]
    pub fn centered(half_extent: [f32; 2]) -> Self {
        Self {
            min: [-half_extent[0], -half_extent[1]],
            max: [half_extent[0], half_extent[1]],
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY, f32::INFINITY],
            max: [f32::NEG_INFINITY, f32::NEG_INFINITY],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    #[inline]
    pub fn include_point(&mut self, p: [f32; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    #[inline]
    pub fn size(&self) -> [f32; 2] {
        [self.max[0] - self.min[0], self.max[1] - self.min[1]]
    }
}

/// Simple RGBA color (linear space assumed; your renderer may treat as sRGB).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// The same color at a different opacity, clamped to [0, 1].
    ///
    /// Timeline-driven fades go through here so a transient out-of-range
    /// opacity can never reach the blender.
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// A CPU-side triangle mesh with 2D positions and u16 indices.
///
/// Marker geometry is small (discs, rings, slide cards), built once at
/// construction time by `geom` and reused every frame. The batch renderer
/// widens indices as it appends, so u16 bounds one mesh, not one frame.
#[derive(Debug, Clone, Default)]
pub struct Mesh2D {
    pub positions: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl Mesh2D {
    /// Append another mesh, offsetting its indices.
    ///
    /// Panics if the combined vertex count no longer fits u16 indices.
    pub fn append(&mut self, other: &Mesh2D) {
        let base = self.positions.len();
        assert!(
            base + other.positions.len() <= u16::MAX as usize,
            "Mesh2D::append: vertex count overflow for u16 indices"
        );

        self.positions.extend_from_slice(&other.positions);

        let base = base as u16;
        self.indices
            .extend(other.indices.iter().copied().map(|idx| base + idx));
    }

    /// Local-space bounds of the mesh positions.
    pub fn bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        for &p in &self.positions {
            b.include_point(p);
        }
        b
    }
}

/// A draw item produced by flattening a composed frame.
///
/// - `world_from_local` is fully composed for this item (parent frames and
///   global tilt already applied).
/// - `z` is painter's order; higher draws later.
#[derive(Debug, Clone)]
pub struct DrawItem2D {
    pub mesh: Mesh2D,
    pub fill: Rgba,
    pub world_from_local: Affine2,
    pub z: i32,
}

/// A simple 2D camera mapping world coordinates into clip space (-1..1).
///
/// Camera model:
/// - `center`: the world point that maps to the center of the viewport
/// - `zoom`: scale factor (world -> NDC)
/// - `viewport_aspect`: width/height, used for isotropic aspect correction
#[derive(Debug, Copy, Clone)]
pub struct Camera2D {
    pub center: [f32; 2],
    pub zoom: f32,
    pub viewport_aspect: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 1.0,
            viewport_aspect: 1.0,
        }
    }
}

impl Camera2D {
    /// Set the viewport size in pixels to update the aspect ratio.
    #[inline]
    pub fn set_viewport_px(&mut self, width: u32, height: u32) {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        self.viewport_aspect = w / h;
    }

    fn aspect_scale(&self) -> (f32, f32) {
        // Shrink the wider axis so zoom stays isotropic in world space.
        let ax = if self.viewport_aspect > 1.0 {
            1.0 / self.viewport_aspect
        } else {
            1.0
        };
        let ay = if self.viewport_aspect < 1.0 {
            self.viewport_aspect
        } else {
            1.0
        };
        (ax, ay)
    }

    /// Affine transform from world space to clip space.
    pub fn clip_from_world(&self) -> Affine2 {
        let t = Affine2::translate(-self.center[0], -self.center[1]);
        let (ax, ay) = self.aspect_scale();
        let s = Affine2::scale(self.zoom * ax, self.zoom * ay);

        // p_clip = s * t * p_world
        s.mul(t)
    }

    /// Frame the given world-space bounds into the viewport.
    ///
    /// - `padding`: extra margin around the bounds in world units.
    /// - `fill_ratio`: fraction of viewport to occupy (e.g. 0.8).
    ///
    /// Updates `center` and `zoom`. Empty bounds leave the camera untouched.
    pub fn frame_bounds(&mut self, bounds: Aabb2, padding: f32, fill_ratio: f32) {
        if bounds.is_empty() {
            return;
        }

        let mut b = bounds;
        b.min[0] -= padding;
        b.min[1] -= padding;
        b.max[0] += padding;
        b.max[1] += padding;

        let size = b.size();
        let size_x = size[0].max(1e-3);
        let size_y = size[1].max(1e-3);

        self.center = b.center();

        let fill = fill_ratio.clamp(0.05, 0.98);
        let (ax, ay) = self.aspect_scale();

        // Fit the padded box into clip space (2.0 units per axis) at the
        // requested fill, respecting the aspect correction on each axis.
        let zoom_x = (2.0 * fill) / (size_x * ax);
        let zoom_y = (2.0 * fill) / (size_y * ay);

        self.zoom = zoom_x.min(zoom_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_transform_matches_rotate_then_translate() {
        let theta = 0.7f32;
        let r = 42.0f32;

        let fused = Affine2::orbit(theta, r);
        let composed = Affine2::rotate(theta).mul(Affine2::translate(r, 0.0));

        for col in 0..3 {
            for row in 0..3 {
                assert!((fused.m[col][row] - composed.m[col][row]).abs() < 1e-5);
            }
        }

        // The frame origin lands on the circle of radius r.
        let [x, y] = fused.origin();
        assert!((x - r * theta.cos()).abs() < 1e-4);
        assert!((y - r * theta.sin()).abs() < 1e-4);
    }

    #[test]
    fn compose_applies_rhs_first() {
        // Rotate a unit-x point by 90 degrees, then translate it up.
        let xf = Affine2::translate(0.0, 1.0).mul(Affine2::rotate(std::f32::consts::FRAC_PI_2));
        let (x, y) = xf.transform_point(1.0, 0.0);
        assert!(x.abs() < 1e-6);
        assert!((y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn with_alpha_clamps() {
        assert_eq!(Rgba::WHITE.with_alpha(1.5).a, 1.0);
        assert_eq!(Rgba::WHITE.with_alpha(-0.2).a, 0.0);
    }

    #[test]
    fn camera_frames_centered_bounds() {
        let mut cam = Camera2D::default();
        cam.set_viewport_px(800, 800);
        cam.frame_bounds(Aabb2::centered([100.0, 100.0]), 0.0, 0.8);

        assert_eq!(cam.center, [0.0, 0.0]);
        // 200 world units should map to 1.6 clip units.
        assert!((cam.zoom - 1.6 / 200.0).abs() < 1e-6);
    }
}
