/// Parametric surfaces evaluated by the mesh builder
use nalgebra::{Point3, Vector3};

use crate::error::GeometryError;

/// A surface mapping an angle pair (radians) to a point in model space
pub trait ParametricSurface {
    fn evaluate(&self, u: f32, v: f32) -> Point3<f32>;
}

impl<S: ParametricSurface + ?Sized> ParametricSurface for &S {
    fn evaluate(&self, u: f32, v: f32) -> Point3<f32> {
        (**self).evaluate(u, v)
    }
}

/// The four coefficients of the shape family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParameters {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl ShapeParameters {
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Mutable access by index, 0..4 maps to a..d
    pub fn get_mut(&mut self, index: usize) -> Option<&mut f32> {
        match index {
            0 => Some(&mut self.a),
            1 => Some(&mut self.b),
            2 => Some(&mut self.c),
            3 => Some(&mut self.d),
            _ => None,
        }
    }

    /// Report inputs that make the surface evaluate to NaN or infinity.
    ///
    /// Not applied by the mesh builder, which stays permissive.
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (name, value) in ["a", "b", "c", "d"].into_iter().zip(self.as_array()) {
            if !value.is_finite() {
                return Err(GeometryError::NonFiniteParameter { name, value });
            }
        }
        // F = ab / sqrt(a² + sin²v + b²cos²v) is 0 for every v once a or b is
        // zero, and (d²-c²)/F then divides by it.
        if self.a == 0.0 || self.b == 0.0 {
            return Err(GeometryError::ZeroRadius);
        }
        Ok(())
    }
}

impl Default for ShapeParameters {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0)
    }
}

/// The four-parameter surface family.
///
/// ```text
/// F(v) = ab / sqrt(a² + sin²v + b²cos²v)
/// x = ½ (F(1 + cos u) + (d² - c²)(1 - cos u) / F) cos v
/// y = ½ (F(1 + cos u) + (d² - c²)(1 - cos u) / F) sin v
/// z = ½ (F - (d² - c²) / F) sin u
/// ```
///
/// No input is rejected: a = b = 0 makes F = 0/0 and every coordinate NaN,
/// which the renderer receives as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSurface {
    pub params: ShapeParameters,
}

impl ShapeSurface {
    pub fn new(params: ShapeParameters) -> Self {
        Self { params }
    }

    fn radius_term(&self, v: f32) -> f32 {
        let ShapeParameters { a, b, .. } = self.params;
        let (sin_v, cos_v) = v.sin_cos();
        (a * b) / (a * a + sin_v * sin_v + b * b * cos_v * cos_v).sqrt()
    }
}

impl ParametricSurface for ShapeSurface {
    fn evaluate(&self, u: f32, v: f32) -> Point3<f32> {
        let ShapeParameters { c, d, .. } = self.params;
        let f = self.radius_term(v);
        let k = d * d - c * c;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_v, cos_v) = v.sin_cos();

        let ring = 0.5 * (f * (1.0 + cos_u) + k * (1.0 - cos_u) / f);

        Point3::new(ring * cos_v, ring * sin_v, 0.5 * (f - k / f) * sin_u)
    }
}

/// A sphere of fixed radius around `center`, with u as longitude and v as
/// polar angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSurface {
    pub radius: f32,
    pub center: Point3<f32>,
}

impl SphereSurface {
    pub fn new(radius: f32, center: Point3<f32>) -> Self {
        Self { radius, center }
    }
}

impl ParametricSurface for SphereSurface {
    fn evaluate(&self, u: f32, v: f32) -> Point3<f32> {
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_v, cos_v) = v.sin_cos();
        self.center + Vector3::new(sin_v * cos_u, sin_v * sin_u, cos_v) * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_shape_at_origin() {
        let surface = ShapeSurface::new(ShapeParameters::new(1.0, 1.0, 0.0, 0.0));
        let p = surface.evaluate(0.0, 0.0);
        assert!((p.x - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_shape_is_nan() {
        let surface = ShapeSurface::new(ShapeParameters::new(0.0, 0.0, 1.0, 2.0));
        let p = surface.evaluate(0.3, 0.0);
        assert!(p.x.is_nan());
        assert!(p.y.is_nan());
        assert!(p.z.is_nan());
    }

    #[test]
    fn test_shape_validation() {
        assert!(ShapeParameters::default().validate().is_ok());
        assert_eq!(
            ShapeParameters::new(0.0, 0.0, 1.0, 1.0).validate(),
            Err(GeometryError::ZeroRadius)
        );
        assert_eq!(
            ShapeParameters::new(2.0, 0.0, 1.0, 1.0).validate(),
            Err(GeometryError::ZeroRadius)
        );
        assert!(matches!(
            ShapeParameters::new(1.0, f32::INFINITY, 0.0, 0.0).validate(),
            Err(GeometryError::NonFiniteParameter { name: "b", .. })
        ));
    }

    #[test]
    fn test_sphere_points_on_radius() {
        let center = Point3::new(1.0, -2.0, 0.5);
        let sphere = SphereSurface::new(0.1, center);
        for (u, v) in [(0.0, 0.0), (1.0, 0.5), (3.0, 2.0), (5.5, 3.1)] {
            let p = sphere.evaluate(u, v);
            assert!(((p - center).norm() - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn test_parameter_index_access() {
        let mut params = ShapeParameters::default();
        *params.get_mut(2).unwrap() = 3.0;
        assert_eq!(params.c, 3.0);
        assert!(params.get_mut(4).is_none());
    }
}
