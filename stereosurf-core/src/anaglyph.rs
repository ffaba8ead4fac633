/// Two-pass red/cyan compositing on top of any rasterizer
use nalgebra::Matrix4;

use crate::projection::{EyeView, StereoCamera};

/// Per-channel color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl ColorMask {
    pub const ALL: Self = Self::new(true, true, true);
    /// Left eye
    pub const RED: Self = Self::new(true, false, false);
    /// Right eye
    pub const CYAN: Self = Self::new(false, true, true);

    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// The drawing surface the anaglyph passes are issued against.
///
/// `Mesh` is whatever the target needs to draw: a CPU mesh for the terminal
/// rasterizer, uploaded buffers for WebGL.
pub trait RenderTarget {
    type Mesh;

    fn clear_depth(&mut self);
    fn set_color_mask(&mut self, mask: ColorMask);
    fn draw(&mut self, mesh: &Self::Mesh, transform: &Matrix4<f32>);
}

fn eye_pass<T: RenderTarget>(
    target: &mut T,
    view: &EyeView,
    mask: ColorMask,
    base: &Matrix4<f32>,
    meshes: &[&T::Mesh],
) {
    let transform = view.combined(base);
    target.set_color_mask(mask);
    for mesh in meshes {
        target.draw(mesh, &transform);
    }
}

/// Draw `meshes` once per eye.
///
/// Order: clear depth, left eye into red, clear depth, right eye into green
/// and blue, restore the full mask. Dropping the second depth clear makes the
/// right eye fail the depth test against the left eye's fragments.
pub fn render_anaglyph<T: RenderTarget>(
    target: &mut T,
    camera: &StereoCamera,
    base: &Matrix4<f32>,
    meshes: &[&T::Mesh],
) {
    target.clear_depth();
    eye_pass(target, &camera.apply_left_frustum(), ColorMask::RED, base, meshes);

    target.clear_depth();
    eye_pass(target, &camera.apply_right_frustum(), ColorMask::CYAN, base, meshes);

    target.set_color_mask(ColorMask::ALL);
}

/// Full frame: optional flat background drawn with the identity transform,
/// then the stereo passes.
pub fn render_frame<T: RenderTarget>(
    target: &mut T,
    background: Option<&T::Mesh>,
    camera: &StereoCamera,
    base: &Matrix4<f32>,
    meshes: &[&T::Mesh],
) {
    if let Some(background) = background {
        target.set_color_mask(ColorMask::ALL);
        target.draw(background, &Matrix4::identity());
    }
    render_anaglyph(target, camera, base, meshes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        ClearDepth,
        Mask(ColorMask),
        Draw(&'static str, Matrix4<f32>),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl RenderTarget for Recorder {
        type Mesh = &'static str;

        fn clear_depth(&mut self) {
            self.calls.push(Call::ClearDepth);
        }

        fn set_color_mask(&mut self, mask: ColorMask) {
            self.calls.push(Call::Mask(mask));
        }

        fn draw(&mut self, mesh: &Self::Mesh, transform: &Matrix4<f32>) {
            self.calls.push(Call::Draw(*mesh, *transform));
        }
    }

    #[test]
    fn test_pass_order() {
        let camera = StereoCamera::default();
        let base = Matrix4::new_translation(&nalgebra::Vector3::new(0.0, 0.0, -10.0));
        let mut target = Recorder::default();

        render_anaglyph(&mut target, &camera, &base, &[&"surface", &"sphere"]);

        let left = camera.apply_left_frustum().combined(&base);
        let right = camera.apply_right_frustum().combined(&base);
        assert_eq!(
            target.calls,
            vec![
                Call::ClearDepth,
                Call::Mask(ColorMask::RED),
                Call::Draw("surface", left),
                Call::Draw("sphere", left),
                Call::ClearDepth,
                Call::Mask(ColorMask::CYAN),
                Call::Draw("surface", right),
                Call::Draw("sphere", right),
                Call::Mask(ColorMask::ALL),
            ]
        );
    }

    #[test]
    fn test_combined_transform_order() {
        let camera = StereoCamera::default();
        let base = Matrix4::new_rotation(nalgebra::Vector3::new(0.0, 0.4, 0.0));
        let view = camera.apply_left_frustum();
        let expected = view.projection * (view.model_view * base);
        assert!((view.combined(&base) - expected).norm() < 1e-6);
    }

    #[test]
    fn test_background_drawn_first() {
        let camera = StereoCamera::default();
        let mut target = Recorder::default();

        render_frame(
            &mut target,
            Some(&"webcam"),
            &camera,
            &Matrix4::identity(),
            &[&"surface"],
        );

        assert_eq!(target.calls[0], Call::Mask(ColorMask::ALL));
        assert_eq!(target.calls[1], Call::Draw("webcam", Matrix4::identity()));
        assert_eq!(target.calls[2], Call::ClearDepth);
        assert_eq!(target.calls.last(), Some(&Call::Mask(ColorMask::ALL)));
    }
}
