/// Off-axis stereo camera for red/cyan anaglyph rendering
use nalgebra::{Matrix4, Vector3};

use crate::error::GeometryError;

/// Which eye a view is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Clip-plane extents of an off-axis perspective frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl FrustumBounds {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// OpenGL-convention perspective matrix for these planes (same layout as
    /// `glFrustum`)
    pub fn matrix(&self) -> Matrix4<f32> {
        let Self {
            left,
            right,
            bottom,
            top,
            near,
            far,
        } = *self;
        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;

        Matrix4::new(
            2.0 * near / dx, 0.0, (right + left) / dx, 0.0,
            0.0, 2.0 * near / dy, (top + bottom) / dy, 0.0,
            0.0, 0.0, -(far + near) / dz, -2.0 * near * far / dz,
            0.0, 0.0, -1.0, 0.0,
        )
    }
}

/// Projection and eye offset for one eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    pub eye: Eye,
    pub frustum: FrustumBounds,
    pub projection: Matrix4<f32>,
    pub model_view: Matrix4<f32>,
}

impl EyeView {
    /// Horizontal eye offset baked into `model_view`
    pub fn translation(&self) -> Vector3<f32> {
        self.model_view.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// `projection * model_view * base`, the matrix handed to the rasterizer
    pub fn combined(&self, base: &Matrix4<f32>) -> Matrix4<f32> {
        self.projection * self.model_view * base
    }
}

/// Camera values the UI may change between frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub convergence: f32,
    pub eye_separation: f32,
    pub fov_degrees: f32,
    pub near_plane: f32,
}

/// Parallel-axis stereo camera.
///
/// Both eyes look down -z; the zero-parallax plane sits at `convergence` and
/// each eye's frustum is sheared horizontally instead of toed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoCamera {
    pub convergence: f32,
    pub eye_separation: f32,
    pub aspect_ratio: f32,
    /// Vertical field of view in radians
    pub field_of_view: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl StereoCamera {
    pub fn new(
        convergence: f32,
        eye_separation: f32,
        aspect_ratio: f32,
        fov_degrees: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Self {
        Self {
            convergence,
            eye_separation,
            aspect_ratio,
            field_of_view: fov_degrees.to_radians(),
            near_plane,
            far_plane,
        }
    }

    /// Apply the per-frame UI values. Aspect ratio and far plane are kept.
    pub fn update(&mut self, settings: CameraSettings) {
        self.convergence = settings.convergence;
        self.eye_separation = settings.eye_separation;
        self.field_of_view = settings.fov_degrees.to_radians();
        self.near_plane = settings.near_plane;
    }

    pub fn settings(&self) -> CameraSettings {
        CameraSettings {
            convergence: self.convergence,
            eye_separation: self.eye_separation,
            fov_degrees: self.field_of_view.to_degrees(),
            near_plane: self.near_plane,
        }
    }

    /// Report values that make the frustum math divide by zero or invert.
    /// Projection itself never checks these.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.convergence == 0.0 {
            return Err(GeometryError::ZeroConvergence);
        }
        if !(self.near_plane > 0.0 && self.near_plane < self.far_plane) {
            return Err(GeometryError::InvalidClipPlanes {
                near: self.near_plane,
                far: self.far_plane,
            });
        }
        Ok(())
    }

    pub fn apply_left_frustum(&self) -> EyeView {
        self.eye_view(Eye::Left)
    }

    pub fn apply_right_frustum(&self) -> EyeView {
        self.eye_view(Eye::Right)
    }

    pub fn eye_view(&self, eye: Eye) -> EyeView {
        let near = self.near_plane;
        let half_tan = (self.field_of_view / 2.0).tan();
        let top = near * half_tan;

        // Half-width of the view at the convergence plane, widened or narrowed
        // by half the eye separation depending on the side.
        let a = self.aspect_ratio * half_tan * self.convergence;
        let b = a - self.eye_separation / 2.0;
        let c = a + self.eye_separation / 2.0;

        let (left, right, offset) = match eye {
            Eye::Left => (-b, c, self.eye_separation / 2.0),
            Eye::Right => (-c, b, -self.eye_separation / 2.0),
        };

        let frustum = FrustumBounds {
            left: left * near / self.convergence,
            right: right * near / self.convergence,
            bottom: -top,
            top,
            near,
            far: self.far_plane,
        };

        EyeView {
            eye,
            frustum,
            projection: frustum.matrix(),
            model_view: Matrix4::new_translation(&Vector3::new(offset, 0.0, 0.0)),
        }
    }
}

impl Default for StereoCamera {
    fn default() -> Self {
        Self::new(1000.0, 0.1, 1.0, 45.0, 1.0, 15.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_eye_translations() {
        let camera = StereoCamera::default();
        let left = camera.apply_left_frustum();
        let right = camera.apply_right_frustum();

        assert!((left.translation() - Vector3::new(0.05, 0.0, 0.0)).norm() < 1e-6);
        assert!((right.translation() - Vector3::new(-0.05, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_eyes_are_mirrored() {
        let camera = StereoCamera::new(12.0, 0.6, 1.6, 50.0, 0.5, 40.0);
        let left = camera.apply_left_frustum();
        let right = camera.apply_right_frustum();

        assert!((left.frustum.width() - right.frustum.width()).abs() < 1e-6);
        assert!((left.frustum.left + right.frustum.right).abs() < 1e-6);
        assert!((left.frustum.right + right.frustum.left).abs() < 1e-6);
        assert_eq!(left.translation(), -right.translation());
        assert_eq!(left.frustum.top, right.frustum.top);
        assert_eq!(left.frustum.bottom, right.frustum.bottom);
    }

    #[test]
    fn test_zero_separation_is_symmetric() {
        let camera = StereoCamera::new(10.0, 0.0, 1.0, 60.0, 1.0, 20.0);
        let left = camera.apply_left_frustum();
        let right = camera.apply_right_frustum();

        assert_eq!(left.projection, right.projection);
        assert!((left.frustum.left + left.frustum.right).abs() < 1e-6);
        // Without shear the frustum matches a symmetric perspective.
        let expected = Matrix4::new_perspective(1.0, 60f32.to_radians(), 1.0, 20.0);
        assert!((left.projection - expected).norm() < 1e-5);
    }

    #[test]
    fn test_zero_parallax_at_convergence() {
        // A point on the axis at the convergence distance projects to the
        // same x for both eyes once the eye offsets are applied.
        let camera = StereoCamera::new(8.0, 0.4, 1.0, 45.0, 1.0, 20.0);
        let point = nalgebra::Point3::new(0.0, 0.0, -8.0);
        let ndc_x = |view: EyeView| {
            let clip = view.combined(&Matrix4::identity()) * point.to_homogeneous();
            clip.x / clip.w
        };
        let lx = ndc_x(camera.apply_left_frustum());
        let rx = ndc_x(camera.apply_right_frustum());
        assert!((lx - rx).abs() < 1e-5);
    }

    #[test]
    fn test_zero_convergence_does_not_panic() {
        let camera = StereoCamera::new(0.0, 0.1, 1.0, 45.0, 1.0, 15.0);
        let left = camera.apply_left_frustum();
        assert!(!left.frustum.left.is_finite());
        assert_eq!(camera.validate(), Err(GeometryError::ZeroConvergence));
    }

    #[test]
    fn test_update_from_settings() {
        let mut camera = StereoCamera::default();
        camera.update(CameraSettings {
            convergence: 5.0,
            eye_separation: 0.3,
            fov_degrees: 90.0,
            near_plane: 2.0,
        });
        assert_eq!(camera.convergence, 5.0);
        assert!((camera.field_of_view - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(camera.far_plane, 15.0);
        assert!((camera.settings().fov_degrees - 90.0).abs() < 1e-4);
        assert!(camera.validate().is_ok());
    }

    #[test]
    fn test_invalid_clip_planes() {
        let camera = StereoCamera::new(10.0, 0.1, 1.0, 45.0, 20.0, 15.0);
        assert!(matches!(
            camera.validate(),
            Err(GeometryError::InvalidClipPlanes { .. })
        ));
    }
}
