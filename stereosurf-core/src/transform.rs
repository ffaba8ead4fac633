/// Model transforms and the rotation state fed by the user's rotator
use nalgebra::{Matrix4, Unit, Vector3};

/// Distance the scene is pushed in front of the eyes
pub const SCENE_DEPTH: f32 = 10.0;

/// Fixed tilt applied before the user's rotation so the surface is not seen
/// edge-on at start-up
pub const SCENE_TILT_AXIS: [f32; 3] = [0.707, 0.707, 0.0];
pub const SCENE_TILT_ANGLE: f32 = 0.7;

/// Anything that supplies the current view rotation as a 4x4 matrix
pub trait ViewRotator {
    fn view_matrix(&self) -> Matrix4<f32>;
}

impl ViewRotator for Matrix4<f32> {
    fn view_matrix(&self) -> Matrix4<f32> {
        *self
    }
}

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

impl ViewRotator for RotationState {
    fn view_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(self)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Rotation by `angle` radians around `axis` (normalized here)
    pub fn axis_rotation(axis: [f32; 3], angle: f32) -> Matrix4<f32> {
        let axis = Unit::new_normalize(Vector3::from(axis));
        Matrix4::from_axis_angle(&axis, angle)
    }

    /// Model-view shared by both eyes before the per-eye offset:
    /// `translate(0, 0, -SCENE_DEPTH) * tilt * view`
    pub fn base_model_view(view: &Matrix4<f32>) -> Matrix4<f32> {
        let tilt = Self::axis_rotation(SCENE_TILT_AXIS, SCENE_TILT_ANGLE);
        Self::translation_matrix(0.0, 0.0, -SCENE_DEPTH) * tilt * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        assert!((rotation.view_matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_base_model_view_pushes_scene_back() {
        let base = Transform::base_model_view(&Matrix4::identity());
        let origin = base.transform_point(&Point3::origin());
        assert!((origin - Point3::new(0.0, 0.0, -SCENE_DEPTH)).norm() < 1e-6);

        // The tilt keeps lengths.
        let p = base.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(((p - origin).norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_matrix_is_its_own_rotator() {
        let m = Transform::translation_matrix(1.0, 2.0, 3.0);
        assert_eq!(m.view_matrix(), m);
    }
}
