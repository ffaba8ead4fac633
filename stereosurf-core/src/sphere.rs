/// The small orbiting sphere and the audio source that follows it
use std::time::Duration;

use nalgebra::{Point3, Vector3};

use crate::geometry::Mesh;
use crate::tessellation::build_sphere_mesh;
use crate::transform::{RotationState, Transform};

/// Period of the sphere timer, independent of the frame rate
pub const SPHERE_TICK: Duration = Duration::from_millis(100);
pub const SPHERE_RADIUS: f32 = 0.1;

/// Receives the sound source position once per sphere tick.
///
/// Implemented by whatever drives the actual audio graph; the core never
/// touches audio APIs.
pub trait AudioSpatializer {
    fn set_position(&mut self, position: Point3<f32>);
    fn set_filter_enabled(&mut self, enabled: bool);
}

/// Spatializer that drops every update
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpatializer;

impl AudioSpatializer for SilentSpatializer {
    fn set_position(&mut self, _position: Point3<f32>) {}
    fn set_filter_enabled(&mut self, _enabled: bool) {}
}

/// How the sphere rotation advances per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereMotion {
    /// Radians added to each axis per tick
    pub step: Vector3<f32>,
    /// After this much elapsed time the z axis stops advancing
    pub axis_timeout: Duration,
    pub orbit_radius: f32,
}

impl Default for SphereMotion {
    fn default() -> Self {
        Self {
            step: Vector3::new(0.05, 0.05, 0.05),
            axis_timeout: Duration::from_secs(10),
            orbit_radius: 1.0,
        }
    }
}

/// Rotation of the sphere around the scene origin
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SphereState {
    pub rotation: RotationState,
}

#[derive(Debug, Clone)]
pub struct SphereAnimator {
    state: SphereState,
    motion: SphereMotion,
    z_enabled: bool,
}

impl SphereAnimator {
    pub fn new(motion: SphereMotion) -> Self {
        Self {
            state: SphereState::default(),
            motion,
            z_enabled: true,
        }
    }

    pub fn state(&self) -> SphereState {
        self.state
    }

    pub fn z_axis_enabled(&self) -> bool {
        self.z_enabled
    }

    /// Advance one tick and forward the new position to `audio`.
    ///
    /// `elapsed` is the time since the animation started; once it reaches the
    /// axis timeout the z axis is frozen for good.
    pub fn tick<A: AudioSpatializer + ?Sized>(&mut self, elapsed: Duration, audio: &mut A) {
        if self.z_enabled && elapsed >= self.motion.axis_timeout {
            log::debug!("sphere z-axis motion stopped after {:?}", elapsed);
            self.z_enabled = false;
        }

        let step = self.motion.step;
        let dz = if self.z_enabled { step.z } else { 0.0 };
        self.state.rotation.rotate(step.x, step.y, dz);

        let position = self.position();
        log::trace!("sphere tick: rotation {:?}, position {}", self.state.rotation, position);
        audio.set_position(position);
    }

    /// Orbit position: the sphere's rotation applied to a point on the x axis
    pub fn position(&self) -> Point3<f32> {
        let rotation = Transform::rotation_matrix(&self.state.rotation);
        rotation.transform_point(&Point3::new(self.motion.orbit_radius, 0.0, 0.0))
    }

    pub fn mesh(&self) -> Mesh {
        build_sphere_mesh(SPHERE_RADIUS, self.position())
    }
}

impl Default for SphereAnimator {
    fn default() -> Self {
        Self::new(SphereMotion::default())
    }
}
