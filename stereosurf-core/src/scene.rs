/// Render context shared by the frontends' frame loops
use std::time::Duration;

use nalgebra::Matrix4;

use crate::anaglyph::{render_frame, RenderTarget};
use crate::config::ViewerConfig;
use crate::geometry::Mesh;
use crate::projection::{CameraSettings, StereoCamera};
use crate::sphere::{AudioSpatializer, SphereAnimator};
use crate::surface::ShapeParameters;
use crate::tessellation::build_mesh;
use crate::transform::{Transform, ViewRotator};

/// Everything a frame needs: shape, generated meshes, camera and sphere.
///
/// Owned by the frontend loop and borrowed mutably by both the frame callback
/// and the sphere timer, so the two never run at the same time.
pub struct Scene {
    shape: ShapeParameters,
    surface: Mesh,
    camera: StereoCamera,
    sphere: SphereAnimator,
    sphere_mesh: Mesh,
    surface_generation: u64,
}

impl Scene {
    pub fn new(config: ViewerConfig) -> Self {
        let sphere = SphereAnimator::default();
        Self {
            shape: config.shape,
            surface: build_mesh(config.shape),
            camera: config.camera,
            sphere_mesh: sphere.mesh(),
            sphere,
            surface_generation: 0,
        }
    }

    pub fn shape(&self) -> ShapeParameters {
        self.shape
    }

    pub fn surface(&self) -> &Mesh {
        &self.surface
    }

    pub fn sphere_mesh(&self) -> &Mesh {
        &self.sphere_mesh
    }

    pub fn camera(&self) -> &StereoCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut StereoCamera {
        &mut self.camera
    }

    pub fn sphere(&self) -> &SphereAnimator {
        &self.sphere
    }

    /// Bumped each time the surface mesh is rebuilt; frontends holding GPU
    /// copies compare it to know when to re-upload.
    pub fn surface_generation(&self) -> u64 {
        self.surface_generation
    }

    /// Replace the shape coefficients and rebuild the surface
    pub fn set_shape(&mut self, shape: ShapeParameters) {
        self.shape = shape;
        self.surface = build_mesh(shape);
        self.surface_generation += 1;
    }

    pub fn update_camera(&mut self, settings: CameraSettings) {
        self.camera.update(settings);
    }

    /// Sphere timer callback: advance, rebuild the sphere mesh, move the sound
    pub fn tick_sphere<A: AudioSpatializer + ?Sized>(&mut self, elapsed: Duration, audio: &mut A) {
        self.sphere.tick(elapsed, audio);
        self.sphere_mesh = self.sphere.mesh();
    }

    pub fn base_model_view<R: ViewRotator + ?Sized>(&self, rotator: &R) -> Matrix4<f32> {
        Transform::base_model_view(&rotator.view_matrix())
    }

    /// Draw the given target meshes for both eyes using the current camera,
    /// over `background` when the frontend has one
    pub fn render<T, R>(
        &self,
        target: &mut T,
        rotator: &R,
        background: Option<&T::Mesh>,
        meshes: &[&T::Mesh],
    ) where
        T: RenderTarget,
        R: ViewRotator + ?Sized,
    {
        let base = self.base_model_view(rotator);
        render_frame(target, background, &self.camera, &base, meshes);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}
