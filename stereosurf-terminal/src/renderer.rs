/// ASCII anaglyph rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use stereosurf_core::{ColorMask, Mesh, RenderTarget, Triangle};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// One terminal cell: the character written into each of the red, green and
/// blue channels, if any
pub type Channels = [Option<char>; 3];

/// Software rasterizer that keeps separate red, green and blue character
/// planes so the two eye passes can be composited like a masked framebuffer.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    channel_buffer: Vec<Channels>,
    mask: ColorMask,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            channel_buffer: vec![[None; 3]; size],
            mask: ColorMask::ALL,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Clear color and depth
    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.channel_buffer.fill([None; 3]);
    }

    pub fn channels(&self, x: usize, y: usize) -> Channels {
        self.channel_buffer[y * self.width + x]
    }

    fn render_triangle(&mut self, triangle: &Triangle, transform: &Matrix4<f32>) {
        // NaN/Inf vertices from degenerate shape parameters produce nothing.
        if !triangle.is_finite() {
            return;
        }

        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, position) in screen_coords.iter_mut().zip(&triangle.positions) {
            match self.project(position, transform) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        // Faces are double sided: shade by how directly they face the viewer
        let normal = triangle.calculate_normal();
        let light_dir = Vector3::new(0.0, 0.0, 1.0);
        let brightness = normal.dot(&light_dir).abs();
        if !brightness.is_finite() {
            return;
        }

        // Map brightness to character, skipping the blank entry
        let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
        let char_index = 1 + (brightness * steps) as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];

        self.rasterize_triangle(&screen_coords, character);
    }

    /// Clip-space transform and perspective divide to cell coordinates
    fn project(&self, point: &Point3<f32>, transform: &Matrix4<f32>) -> Option<(f32, f32, f32)> {
        let clip = transform * point.to_homogeneous();

        // Behind or on the eye plane
        if clip.w < 1e-6 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let ndc_z = clip.z / clip.w;

        // Clip test
        if !(-1.0..=1.0).contains(&ndc_x)
            || !(-1.0..=1.0).contains(&ndc_y)
            || !(-1.0..=1.0).contains(&ndc_z)
        {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc_x + 1.0) * 0.5 * self.width as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * self.height as f32;

        Some((screen_x, screen_y, ndc_z))
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        let mask = [self.mask.red, self.mask.green, self.mask.blue];

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Interpolate depth
                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    // Depth is written regardless of the color mask
                    self.depth_buffer[idx] = depth;
                    for (channel, enabled) in self.channel_buffer[idx].iter_mut().zip(mask) {
                        if enabled {
                            *channel = Some(character);
                        }
                    }
                }
            }
        }
    }

    /// Write the composited frame to the terminal, starting at row `top`
    pub fn present<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        for y in 0..self.height {
            // Raw mode: position each row explicitly instead of relying on '\n'
            writer.queue(MoveTo(0, top.saturating_add(y as u16)))?;
            for x in 0..self.width {
                let (c, color) = composite(self.channels(x, y));
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderTarget for AsciiRenderer {
    type Mesh = Mesh;

    fn clear_depth(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.mask = mask;
    }

    fn draw(&mut self, mesh: &Mesh, transform: &Matrix4<f32>) {
        for triangle in mesh.triangles() {
            self.render_triangle(&triangle, transform);
        }
    }
}

/// Merge the channel planes of one cell into a printable character and color.
///
/// Red alone is the left eye, green+blue alone the right eye, all three is
/// where both eyes overlap.
pub fn composite(channels: Channels) -> (char, Color) {
    let [r, g, b] = channels;
    let color = match (r.is_some(), g.is_some(), b.is_some()) {
        (true, true, true) => Color::White,
        (true, false, false) => Color::Red,
        (false, true, true) => Color::Cyan,
        (false, true, false) => Color::Green,
        (false, false, true) => Color::Blue,
        (true, true, false) => Color::Yellow,
        (true, false, true) => Color::Magenta,
        (false, false, false) => Color::DarkGrey,
    };

    // Brightest character among the written channels
    let character = channels
        .into_iter()
        .flatten()
        .max_by_key(|c| LUMINOSITY_RAMP.iter().position(|entry| entry == c))
        .unwrap_or(' ');

    (character, color)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
