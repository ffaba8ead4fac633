/// Sampling parametric surfaces into triangle lists
use nalgebra::{Point2, Point3};

use crate::geometry::Mesh;
use crate::surface::{ParametricSurface, ShapeParameters, ShapeSurface, SphereSurface};

/// Uniform scale applied to every vertex of the main surface
pub const SURFACE_SCALE: f32 = 0.75;

/// Grid for the main surface: 5 degree cells over the full u and v turns
pub const SURFACE_GRID: AngularGrid = AngularGrid {
    step: 5,
    u_span: 360,
    v_span: 360,
};

/// Coarser longitude/latitude grid for the small sphere
pub const SPHERE_GRID: AngularGrid = AngularGrid {
    step: 15,
    u_span: 360,
    v_span: 180,
};

/// Fixed angular sampling grid, in whole degrees.
///
/// Cells are visited with u in the outer loop and v in the inner loop. The
/// last cell ends exactly on `u_span`/`v_span`; those grid lines are evaluated
/// on their own and never stitched to the 0 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngularGrid {
    pub step: u32,
    pub u_span: u32,
    pub v_span: u32,
}

impl AngularGrid {
    fn lines(&self, span: u32) -> u32 {
        span.checked_div(self.step).unwrap_or(0)
    }

    pub fn cell_count(&self) -> usize {
        self.lines(self.u_span) as usize * self.lines(self.v_span) as usize
    }

    /// Lower (u, v) corner of every cell, in emission order
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let step = self.step;
        let v_lines = self.lines(self.v_span);
        (0..self.lines(self.u_span))
            .flat_map(move |i| (0..v_lines).map(move |j| (i * step, j * step)))
    }

    /// Texture coordinate of a grid point, as a fraction of the raw degree span
    pub fn tex_coord(&self, u: u32, v: u32) -> Point2<f32> {
        Point2::new(u as f32 / self.u_span as f32, v as f32 / self.v_span as f32)
    }
}

/// How a grid cell is split into two triangles.
///
/// Corner indices: 0 = (u, v), 1 = (u + step, v), 2 = (u, v + step),
/// 3 = (u + step, v + step).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangulation {
    pub triangles: [[usize; 3]; 2],
}

impl Triangulation {
    /// (V1, V2, V3) then (V3, V2, V4): both triangles share the V2-V3 diagonal
    pub const SHARED_DIAGONAL: Self = Self {
        triangles: [[0, 1, 2], [2, 1, 3]],
    };
}

impl Default for Triangulation {
    fn default() -> Self {
        Self::SHARED_DIAGONAL
    }
}

/// Evaluates a [`ParametricSurface`] over an [`AngularGrid`] and emits a
/// non-indexed triangle list with per-vertex texture coordinates.
///
/// Output depends only on the builder's fields.
#[derive(Debug, Clone)]
pub struct MeshBuilder<S> {
    surface: S,
    grid: AngularGrid,
    triangulation: Triangulation,
    scale: f32,
}

impl<S: ParametricSurface> MeshBuilder<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            grid: SURFACE_GRID,
            triangulation: Triangulation::default(),
            scale: 1.0,
        }
    }

    pub fn grid(mut self, grid: AngularGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn triangulation(mut self, triangulation: Triangulation) -> Self {
        self.triangulation = triangulation;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn build(&self) -> Mesh {
        let step = self.grid.step;
        let mut mesh = Mesh::with_capacity(self.grid.cell_count() * 6);

        for (u, v) in self.grid.cells() {
            let corners = [(u, v), (u + step, v), (u, v + step), (u + step, v + step)];
            let positions = corners.map(|(cu, cv)| self.vertex(cu, cv));
            let tex_coords = corners.map(|(cu, cv)| self.grid.tex_coord(cu, cv));

            for triangle in &self.triangulation.triangles {
                for &corner in triangle {
                    mesh.push_vertex(positions[corner], tex_coords[corner]);
                }
            }
        }

        mesh
    }

    fn vertex(&self, u: u32, v: u32) -> Point3<f32> {
        let p = self
            .surface
            .evaluate((u as f32).to_radians(), (v as f32).to_radians());
        Point3::from(p.coords * self.scale)
    }
}

/// Tessellate the main surface for the given coefficients.
///
/// Degenerate coefficients are not rejected; see [`ShapeSurface`].
pub fn build_mesh(params: ShapeParameters) -> Mesh {
    let mesh = MeshBuilder::new(ShapeSurface::new(params))
        .grid(SURFACE_GRID)
        .scale(SURFACE_SCALE)
        .build();

    log::debug!(
        "surface mesh for {:?}: {} triangles",
        params,
        mesh.triangle_count()
    );
    let degenerate = mesh.non_finite_triangles();
    if degenerate > 0 {
        log::warn!(
            "surface mesh for {:?} has {} non-finite triangles",
            params,
            degenerate
        );
    }

    mesh
}

/// Tessellate the small orbiting sphere; it is not scaled like the main surface
pub fn build_sphere_mesh(radius: f32, center: Point3<f32>) -> Mesh {
    MeshBuilder::new(SphereSurface::new(radius, center))
        .grid(SPHERE_GRID)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELLS_PER_AXIS: usize = 72;

    fn unit_mesh() -> Mesh {
        build_mesh(ShapeParameters::new(1.0, 1.0, 0.0, 0.0))
    }

    #[test]
    fn test_vertex_count() {
        let mesh = build_mesh(ShapeParameters::new(1.5, 0.8, 0.3, 0.6));
        assert_eq!(mesh.vertex_count(), 2 * CELLS_PER_AXIS * CELLS_PER_AXIS * 3);
        assert_eq!(mesh.vertex_count(), 31104);
        assert_eq!(mesh.tex_coords.len(), mesh.vertex_count());
        assert_eq!(mesh.position_buffer().len(), 93312);
        assert_eq!(mesh.tex_coord_buffer().len(), 62208);
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let params = ShapeParameters::new(1.2, 0.7, 0.4, 0.9);
        let first = build_mesh(params);
        let second = build_mesh(params);

        let bits = |m: &Mesh| -> Vec<u32> {
            m.position_buffer()
                .into_iter()
                .chain(m.tex_coord_buffer())
                .map(f32::to_bits)
                .collect()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_first_cell_winding() {
        let mesh = unit_mesh();
        let surface = ShapeSurface::new(ShapeParameters::new(1.0, 1.0, 0.0, 0.0));
        let corner = |u: f32, v: f32| {
            Point3::from(surface.evaluate(u.to_radians(), v.to_radians()).coords * SURFACE_SCALE)
        };
        let v1 = corner(0.0, 0.0);
        let v2 = corner(5.0, 0.0);
        let v3 = corner(0.0, 5.0);
        let v4 = corner(5.0, 5.0);

        assert_eq!(&mesh.positions[..6], &[v1, v2, v3, v3, v2, v4]);

        let s = 5.0 / 360.0;
        let expected_uv = [
            Point2::new(0.0, 0.0),
            Point2::new(s, 0.0),
            Point2::new(0.0, s),
            Point2::new(0.0, s),
            Point2::new(s, 0.0),
            Point2::new(s, s),
        ];
        assert_eq!(&mesh.tex_coords[..6], &expected_uv);
    }

    #[test]
    fn test_unit_shape_first_vertex() {
        let mesh = unit_mesh();
        let p = mesh.positions[0];
        assert!((p.x - SURFACE_SCALE * std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn test_closing_grid_line_is_evaluated() {
        let params = ShapeParameters::new(1.3, 0.9, 0.2, 0.5);
        let mesh = build_mesh(params);
        let surface = ShapeSurface::new(params);

        // Cell (u = 355, v = 0): its second corner lies on the u = 360 line.
        let cell = (CELLS_PER_AXIS - 1) * CELLS_PER_AXIS;
        let idx = cell * 6 + 1;
        let expected = Point3::from(
            surface
                .evaluate(360f32.to_radians(), 0.0)
                .coords
                * SURFACE_SCALE,
        );
        assert_eq!(mesh.positions[idx], expected);
        assert_eq!(mesh.tex_coords[idx], Point2::new(1.0, 0.0));

        // No seam triangles beyond the grid cells.
        assert_eq!(mesh.triangle_count(), CELLS_PER_AXIS * CELLS_PER_AXIS * 2);
        assert!(mesh.tex_coords.iter().all(|t| t.x <= 1.0 && t.y <= 1.0));
    }

    #[test]
    fn test_degenerate_parameters_propagate_nan() {
        let mesh = build_mesh(ShapeParameters::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(mesh.vertex_count(), 31104);
        let p = mesh.positions[0];
        assert!(p.x.is_nan() && p.y.is_nan() && p.z.is_nan());
        assert_eq!(mesh.non_finite_triangles(), mesh.triangle_count());
    }

    #[test]
    fn test_sphere_mesh() {
        let center = Point3::new(0.0, 1.0, 0.0);
        let mesh = build_sphere_mesh(0.1, center);
        assert_eq!(mesh.vertex_count(), SPHERE_GRID.cell_count() * 6);
        assert_eq!(SPHERE_GRID.cell_count(), 24 * 12);
        assert!(mesh
            .positions
            .iter()
            .all(|p| ((p - center).norm() - 0.1).abs() < 1e-5));
    }

    #[test]
    fn test_custom_triangulation() {
        let flipped = Triangulation {
            triangles: [[0, 1, 3], [0, 3, 2]],
        };
        let grid = AngularGrid {
            step: 90,
            u_span: 90,
            v_span: 90,
        };
        let mesh = MeshBuilder::new(SphereSurface::new(1.0, Point3::origin()))
            .grid(grid)
            .triangulation(flipped)
            .build();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.tex_coords[2], Point2::new(1.0, 1.0));
        assert_eq!(mesh.tex_coords[5], Point2::new(0.0, 1.0));
    }

    #[test]
    fn test_zero_step_grid_is_empty() {
        let grid = AngularGrid {
            step: 0,
            u_span: 360,
            v_span: 360,
        };
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(grid.cells().count(), 0);
    }
}
