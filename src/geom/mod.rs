//! Marker geometry built on lyon tessellation.
//!
//! Everything the engine draws is a small CPU mesh produced here once at
//! construction time: filled discs for bodies and particles, stroked rings
//! for orbit guides, stroked regular polygons for the lab-style wireframe
//! accents, and plain rects for narrative slides.
//!
//! Circles are approximated by closed polygonal paths whose segment count is
//! derived from the chord-error tolerance, then handed to lyon's fill or
//! stroke tessellator. That keeps the output tolerance-driven without pulling
//! in arc flattening for shapes this simple.
//!
//! Errors from the tessellator indicate invalid construction parameters, not
//! runtime conditions; they surface as `anyhow::Result` so callers fail fast
//! during bring-up. Degenerate sizes (zero/negative radius) return an empty
//! mesh instead.

use anyhow::anyhow;
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

use crate::scene::Mesh2D;

/// Tessellation tolerance in world units (smaller means more triangles).
///
/// The default suits pt-scale scenes (markers tens of units across).
#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    pub tolerance: f32,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self { tolerance: 0.1 }
    }
}

/// Output vertex: position only; style lives on the draw item.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct GeomVertex {
    position: [f32; 2],
}

struct GeomVertexCtor;

impl FillVertexConstructor<GeomVertex> for GeomVertexCtor {
    fn new_vertex(&mut self, v: FillVertex) -> GeomVertex {
        let p = v.position();
        GeomVertex {
            position: [p.x, p.y],
        }
    }
}

impl StrokeVertexConstructor<GeomVertex> for GeomVertexCtor {
    fn new_vertex(&mut self, v: StrokeVertex) -> GeomVertex {
        let p = v.position();
        GeomVertex {
            position: [p.x, p.y],
        }
    }
}

fn mesh_from_buffers(buffers: VertexBuffers<GeomVertex, u16>) -> Mesh2D {
    Mesh2D {
        positions: buffers.vertices.iter().map(|v| v.position).collect(),
        indices: buffers.indices,
    }
}

/// Segment count for a polygonal circle whose chord error stays under
/// `tolerance` at the given radius. Clamped so tiny markers still look round
/// and huge guides stay bounded.
fn circle_segment_count(radius: f32, tolerance: f32) -> u32 {
    let tol = tolerance.max(1e-3).min(radius.max(1e-3));
    // Chord sagitta e = r(1 - cos(pi/n)) <= tol.
    let n = std::f32::consts::PI / (1.0 - tol / radius).max(-1.0).min(1.0).acos();
    (n.ceil() as u32).clamp(12, 256)
}

/// A closed regular polygon path with `sides` vertices on a circle.
fn polygon_path(radius: f32, sides: u32) -> Path {
    let mut builder = Path::builder();
    let step = std::f32::consts::TAU / sides as f32;

    builder.begin(point(radius, 0.0));
    for i in 1..sides {
        let a = step * i as f32;
        builder.line_to(point(radius * a.cos(), radius * a.sin()));
    }
    builder.close();
    builder.build()
}

/// A filled disc of the given radius, centered on the origin.
pub fn disc(radius: f32, opts: TessellateOptions) -> anyhow::Result<Mesh2D> {
    if radius <= 0.0 {
        return Ok(Mesh2D::default());
    }

    let path = polygon_path(radius, circle_segment_count(radius, opts.tolerance));

    let mut tess = FillTessellator::new();
    let mut buffers: VertexBuffers<GeomVertex, u16> = VertexBuffers::new();
    tess.tessellate_path(
        &path,
        &FillOptions::tolerance(opts.tolerance),
        &mut BuffersBuilder::new(&mut buffers, GeomVertexCtor),
    )
    .map_err(|e| anyhow!("disc tessellation failed: {e:?}"))?;

    Ok(mesh_from_buffers(buffers))
}

/// A stroked circle (an orbit guide) of the given radius and line width,
/// centered on the origin.
pub fn ring(radius: f32, line_width: f32, opts: TessellateOptions) -> anyhow::Result<Mesh2D> {
    if radius <= 0.0 || line_width <= 0.0 {
        return Ok(Mesh2D::default());
    }

    let path = polygon_path(radius, circle_segment_count(radius, opts.tolerance));
    stroke_path(&path, line_width, opts)
}

/// A stroked regular polygon outline with exactly `sides` vertices.
pub fn regular_polygon(
    radius: f32,
    sides: u32,
    line_width: f32,
    opts: TessellateOptions,
) -> anyhow::Result<Mesh2D> {
    if radius <= 0.0 || line_width <= 0.0 || sides < 3 {
        return Ok(Mesh2D::default());
    }

    stroke_path(&polygon_path(radius, sides), line_width, opts)
}

fn stroke_path(path: &Path, line_width: f32, opts: TessellateOptions) -> anyhow::Result<Mesh2D> {
    let mut tess = StrokeTessellator::new();
    let mut buffers: VertexBuffers<GeomVertex, u16> = VertexBuffers::new();

    let stroke = StrokeOptions::default()
        .with_line_width(line_width)
        .with_tolerance(opts.tolerance);

    tess.tessellate_path(
        path,
        &stroke,
        &mut BuffersBuilder::new(&mut buffers, GeomVertexCtor),
    )
    .map_err(|e| anyhow!("stroke tessellation failed: {e:?}"))?;

    Ok(mesh_from_buffers(buffers))
}

/// An axis-aligned rectangle (two triangles) centered on the origin.
///
/// Rects skip the tessellator; narrative slides are plain cards.
pub fn rect(size: [f32; 2]) -> Mesh2D {
    let hw = size[0] * 0.5;
    let hh = size[1] * 0.5;

    Mesh2D {
        positions: vec![[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(mesh: &Mesh2D) {
        assert!(!mesh.positions.is_empty());
        assert!(!mesh.indices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.positions.len());
        }
    }

    #[test]
    fn disc_covers_the_radius() {
        let mesh = disc(20.0, TessellateOptions::default()).unwrap();
        assert_valid(&mesh);

        let b = mesh.bounds();
        let size = b.size();
        assert!((size[0] - 40.0).abs() < 1.0);
        assert!((size[1] - 40.0).abs() < 1.0);
    }

    #[test]
    fn ring_vertices_hug_the_circle() {
        let mesh = ring(50.0, 2.0, TessellateOptions::default()).unwrap();
        assert_valid(&mesh);

        for &[x, y] in &mesh.positions {
            let r = (x * x + y * y).sqrt();
            // Inside [radius - width, radius + width] with a little slack for
            // join geometry.
            assert!(r > 48.0 && r < 52.0, "vertex at r={r}");
        }
    }

    #[test]
    fn degenerate_sizes_yield_empty_meshes() {
        assert!(disc(0.0, TessellateOptions::default()).unwrap().positions.is_empty());
        assert!(ring(-1.0, 2.0, TessellateOptions::default()).unwrap().positions.is_empty());
        assert!(
            regular_polygon(10.0, 2, 1.0, TessellateOptions::default())
                .unwrap()
                .positions
                .is_empty()
        );
    }

    #[test]
    fn rect_is_two_triangles() {
        let mesh = rect([10.0, 4.0]);
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.indices.len(), 6);

        let size = mesh.bounds().size();
        assert_eq!(size, [10.0, 4.0]);
    }

    #[test]
    fn segment_count_scales_with_tolerance() {
        let coarse = circle_segment_count(50.0, 1.0);
        let fine = circle_segment_count(50.0, 0.01);
        assert!(fine > coarse);
        assert!(coarse >= 12);
        assert!(fine <= 256);
    }
}
