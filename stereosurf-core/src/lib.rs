/// stereosurf core library - surface tessellation and stereo projection
///
/// This library provides the stateless math behind the anaglyph viewer:
/// sampling the parametric surface into a triangle list, the off-axis stereo
/// camera, and the pass ordering that composites both eyes. Rendering, input
/// and audio live in the frontends behind small traits.

pub mod anaglyph;
pub mod config;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod scene;
pub mod sphere;
pub mod surface;
pub mod tessellation;
pub mod transform;

// Re-export commonly used types
pub use anaglyph::{render_anaglyph, render_frame, ColorMask, RenderTarget};
pub use config::ViewerConfig;
pub use error::{ConfigError, GeometryError};
pub use geometry::{Mesh, Triangle};
pub use projection::{CameraSettings, Eye, EyeView, FrustumBounds, StereoCamera};
pub use scene::Scene;
pub use sphere::{AudioSpatializer, SilentSpatializer, SphereAnimator, SphereMotion, SphereState, SPHERE_TICK};
pub use surface::{ParametricSurface, ShapeParameters, ShapeSurface, SphereSurface};
pub use tessellation::{build_mesh, build_sphere_mesh, AngularGrid, MeshBuilder, Triangulation};
pub use transform::{RotationState, Transform, ViewRotator};
