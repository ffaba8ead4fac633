/// Geometry primitives for the triangle stream sent to the renderer
use nalgebra::{Point2, Point3, Vector3};

/// A triangle borrowed out of a [`Mesh`], positions and texture coordinates
/// in emission order
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub positions: [Point3<f32>; 3],
    pub tex_coords: [Point2<f32>; 3],
}

impl Triangle {
    /// Calculate the face normal from the triangle's positions.
    ///
    /// Degenerate triangles (collapsed grid corners) yield NaN components.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.positions;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    pub fn is_finite(&self) -> bool {
        self.positions
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite()))
    }
}

/// A non-indexed triangle list with a parallel texture-coordinate stream.
///
/// Every three consecutive positions form one triangle; `tex_coords[i]`
/// belongs to `positions[i]`. `normals` is never filled: surfaces are drawn
/// unlit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Point3<f32>>,
    pub tex_coords: Vec<Point2<f32>>,
    pub normals: Vec<Vector3<f32>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for `vertices` position/texcoord pairs
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            tex_coords: Vec::with_capacity(vertices),
            normals: Vec::new(),
        }
    }

    pub fn push_vertex(&mut self, position: Point3<f32>, tex_coord: Point2<f32>) {
        self.positions.push(position);
        self.tex_coords.push(tex_coord);
    }

    /// Two triangles covering clip space at z = 0, for drawing a camera
    /// frame behind the scene with the identity transform. Texture rows run
    /// top to bottom and columns are mirrored, like a selfie view.
    pub fn screen_quad() -> Self {
        let corners = [
            ((-1.0, -1.0), (1.0, 1.0)),
            ((1.0, 1.0), (0.0, 0.0)),
            ((1.0, -1.0), (0.0, 1.0)),
            ((1.0, 1.0), (0.0, 0.0)),
            ((-1.0, -1.0), (1.0, 1.0)),
            ((-1.0, 1.0), (1.0, 0.0)),
        ];

        let mut mesh = Self::with_capacity(corners.len());
        for ((x, y), (s, t)) in corners {
            mesh.push_vertex(Point3::new(x, y, 0.0), Point2::new(s, t));
        }
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.tex_coords.chunks_exact(3))
            .map(|(p, t)| Triangle {
                positions: [p[0], p[1], p[2]],
                tex_coords: [t[0], t[1], t[2]],
            })
    }

    /// Number of triangles with at least one NaN or infinite coordinate
    pub fn non_finite_triangles(&self) -> usize {
        self.triangles().filter(|t| !t.is_finite()).count()
    }

    /// Positions flattened to `x, y, z, x, y, z, ...` for vertex buffer upload
    pub fn position_buffer(&self) -> Vec<f32> {
        self.positions
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect()
    }

    /// Texture coordinates flattened to `s, t, s, t, ...`
    pub fn tex_coord_buffer(&self) -> Vec<f32> {
        self.tex_coords.iter().flat_map(|t| [t.x, t.y]).collect()
    }
}
