/// stereosurf Web - WebGL anaglyph renderer for browsers
///
/// The page owns the canvas, the trackball, the camera stream and the Web
/// Audio graph. This module owns the scene: it builds the surface, draws the
/// camera frame behind it, runs the stereo passes against a WebGL context, and
/// hands the sphere position back to the page for the audio panner.
use std::time::Duration;

use nalgebra::{Matrix4, Point3};
use stereosurf_core::{
    build_mesh, AudioSpatializer, Mesh, Scene, ShapeParameters, StereoCamera, ViewerConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlImageElement, HtmlVideoElement, WebGlRenderingContext};

pub mod gl;

use gl::{create_texture, upload_image, upload_video, GlTarget, GpuMesh};

/// Sphere timer input in milliseconds; negative or NaN counts as zero and
/// anything past `Duration::MAX` saturates
fn elapsed_from_millis(elapsed_ms: f64) -> Duration {
    Duration::try_from_secs_f64(elapsed_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX)
}

/// Holds the latest audio update until the page reads it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioRelay {
    position: Point3<f32>,
    filter_enabled: bool,
}

impl Default for AudioRelay {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            filter_enabled: false,
        }
    }
}

impl AudioRelay {
    pub fn position(&self) -> [f32; 3] {
        [self.position.x, self.position.y, self.position.z]
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }
}

impl AudioSpatializer for AudioRelay {
    fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
    }

    fn set_filter_enabled(&mut self, enabled: bool) {
        self.filter_enabled = enabled;
    }
}

#[wasm_bindgen]
pub struct WebRenderer {
    scene: Scene,
    target: GlTarget,
    surface: GpuMesh,
    surface_generation: u64,
    sphere: GpuMesh,
    background: GpuMesh,
    video: Option<HtmlVideoElement>,
    view: Matrix4<f32>,
    audio: AudioRelay,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Attach to the canvas with id `canvas_id`. Fails if WebGL is missing or
    /// the shader program does not build.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebRenderer, JsValue> {
        let canvas = canvas(canvas_id)?;
        let context = canvas
            .get_context("webgl")?
            .ok_or_else(|| JsValue::from_str("Browser does not support WebGL"))?
            .dyn_into::<WebGlRenderingContext>()
            .map_err(|_| JsValue::from_str("canvas context is not WebGL"))?;

        let target = GlTarget::new(context).map_err(|e| {
            log::error!("could not initialize the WebGL program: {:?}", e);
            e
        })?;

        let mut config = ViewerConfig::default();
        if canvas.height() > 0 {
            config.camera.aspect_ratio = canvas.width() as f32 / canvas.height() as f32;
        }
        let scene = Scene::new(config);

        let surface = GpuMesh::new(target.context(), scene.surface())?;
        let sphere = GpuMesh::new(target.context(), scene.sphere_mesh())?;
        let mut background = GpuMesh::new(target.context(), &Mesh::screen_quad())?;
        background.set_texture(Some(create_texture(target.context())?));
        log::info!(
            "renderer ready: {} surface triangles",
            scene.surface().triangle_count()
        );

        Ok(WebRenderer {
            surface_generation: scene.surface_generation(),
            scene,
            target,
            surface,
            sphere,
            background,
            video: None,
            view: Matrix4::identity(),
            audio: AudioRelay::default(),
        })
    }

    /// Rebuild the surface for new coefficients
    #[wasm_bindgen(js_name = "setShape")]
    pub fn set_shape(&mut self, a: f32, b: f32, c: f32, d: f32) {
        let shape = ShapeParameters::new(a, b, c, d);
        if let Err(e) = shape.validate() {
            log::warn!("shape {:?}: {}", shape, e);
        }
        self.scene.set_shape(shape);
    }

    /// Per-frame camera fields; fov in degrees
    #[wasm_bindgen(js_name = "setCamera")]
    pub fn set_camera(&mut self, convergence: f32, eye_separation: f32, fov: f32, near: f32) {
        let mut settings = self.scene.camera().settings();
        settings.convergence = convergence;
        settings.eye_separation = eye_separation;
        settings.fov_degrees = fov;
        settings.near_plane = near;
        self.scene.update_camera(settings);
    }

    /// Column-major view matrix from the page's trackball
    #[wasm_bindgen(js_name = "setViewMatrix")]
    pub fn set_view_matrix(&mut self, matrix: Vec<f32>) -> Result<(), JsValue> {
        if matrix.len() != 16 {
            return Err(JsValue::from_str(&format!(
                "view matrix needs 16 values, got {}",
                matrix.len()
            )));
        }
        self.view = Matrix4::from_column_slice(&matrix);
        Ok(())
    }

    /// Camera stream drawn behind the surface; its current frame is copied
    /// into the background texture on every `render`
    #[wasm_bindgen(js_name = "setBackgroundVideo")]
    pub fn set_background_video(&mut self, video: HtmlVideoElement) {
        self.video = Some(video);
    }

    #[wasm_bindgen(js_name = "clearBackgroundVideo")]
    pub fn clear_background_video(&mut self) {
        self.video = None;
    }

    /// Texture the surface with a loaded image. Failures are logged and the
    /// surface keeps its previous look.
    #[wasm_bindgen(js_name = "setSurfaceImage")]
    pub fn set_surface_image(&mut self, image: &HtmlImageElement) {
        let gl = self.target.context();
        let texture = match self.surface.texture() {
            Some(texture) => Ok(texture.clone()),
            None => create_texture(gl),
        };
        let uploaded = texture.and_then(|texture| {
            upload_image(gl, &texture, image)?;
            Ok(texture)
        });
        match uploaded {
            Ok(texture) => self.surface.set_texture(Some(texture)),
            Err(e) => log::warn!("surface image not uploaded: {:?}", e),
        }
    }

    /// Draw one frame: clear, the camera frame if any, then both eyes over
    /// the surface and sphere
    pub fn render(&mut self) {
        if self.surface_generation != self.scene.surface_generation() {
            self.surface.write(self.target.context(), self.scene.surface());
            self.surface_generation = self.scene.surface_generation();
        }

        let has_background = match (&self.video, self.background.texture()) {
            (Some(video), Some(texture)) => {
                match upload_video(self.target.context(), texture, video) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("camera frame not uploaded: {:?}", e);
                        false
                    }
                }
            }
            _ => false,
        };

        self.target.begin_frame();
        let background = has_background.then_some(&self.background);
        let meshes = [&self.surface, &self.sphere];
        self.scene
            .render(&mut self.target, &self.view, background, &meshes);
    }

    /// Sphere timer callback. `elapsed_ms` counts from the start of the
    /// animation; returns the new sound source position `[x, y, z]`.
    #[wasm_bindgen(js_name = "tickSphere")]
    pub fn tick_sphere(&mut self, elapsed_ms: f64) -> Vec<f32> {
        self.scene
            .tick_sphere(elapsed_from_millis(elapsed_ms), &mut self.audio);
        self.sphere.write(self.target.context(), self.scene.sphere_mesh());
        self.audio.position().to_vec()
    }

    #[wasm_bindgen(js_name = "setFilterEnabled")]
    pub fn set_filter_enabled(&mut self, enabled: bool) {
        self.audio.set_filter_enabled(enabled);
    }

    #[wasm_bindgen(js_name = "filterEnabled")]
    pub fn filter_enabled(&self) -> bool {
        self.audio.filter_enabled()
    }
}

fn canvas(id: &str) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id `{id}`")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("element `{id}` is not a canvas")))
}

/// Flattened surface positions for the given coefficients
#[wasm_bindgen(js_name = "buildSurfaceMesh")]
pub fn build_surface_mesh(a: f32, b: f32, c: f32, d: f32) -> Vec<f32> {
    build_mesh(ShapeParameters::new(a, b, c, d)).position_buffer()
}

/// Flattened texture coordinates matching `buildSurfaceMesh`
#[wasm_bindgen(js_name = "surfaceTexCoords")]
pub fn surface_tex_coords(a: f32, b: f32, c: f32, d: f32) -> Vec<f32> {
    build_mesh(ShapeParameters::new(a, b, c, d)).tex_coord_buffer()
}

/// Left projection, left model-view, right projection, right model-view; 64
/// column-major floats
#[wasm_bindgen(js_name = "eyeMatrices")]
pub fn eye_matrices(
    convergence: f32,
    eye_separation: f32,
    aspect_ratio: f32,
    fov: f32,
    near: f32,
    far: f32,
) -> Vec<f32> {
    let camera = StereoCamera::new(convergence, eye_separation, aspect_ratio, fov, near, far);
    let left = camera.apply_left_frustum();
    let right = camera.apply_right_frustum();
    [left.projection, left.model_view, right.projection, right.model_view]
        .iter()
        .flat_map(|m| m.as_slice().to_vec())
        .collect()
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    Ok(())
}
