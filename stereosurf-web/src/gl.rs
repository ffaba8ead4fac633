/// WebGL 1 backend for the anaglyph passes
use nalgebra::Matrix4;
use stereosurf_core::{ColorMask, Mesh, RenderTarget};
use wasm_bindgen::JsValue;
use web_sys::{
    HtmlImageElement, HtmlVideoElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl,
    WebGlShader, WebGlTexture, WebGlUniformLocation,
};

const VERTEX_SHADER: &str = r#"
attribute vec3 vertex;
attribute vec2 texCoord;
uniform mat4 ModelViewProjectionMatrix;
varying vec2 vTexCoord;

void main() {
    vTexCoord = texCoord;
    gl_Position = ModelViewProjectionMatrix * vec4(vertex, 1.0);
}
"#;

// Meshes without a texture fall back to a checker over their coordinates
const FRAGMENT_SHADER: &str = r#"
precision mediump float;
uniform sampler2D tmu;
uniform bool useTexture;
varying vec2 vTexCoord;

void main() {
    if (useTexture) {
        gl_FragColor = texture2D(tmu, vTexCoord);
    } else {
        float check = mod(floor(vTexCoord.x * 36.0) + floor(vTexCoord.y * 36.0), 2.0);
        gl_FragColor = vec4(vec3(0.55 + 0.45 * check), 1.0);
    }
}
"#;

/// Vertex and texture-coordinate buffers of one uploaded mesh, plus the
/// texture it is drawn with
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    tex_coord_buffer: WebGlBuffer,
    count: i32,
    texture: Option<WebGlTexture>,
}

impl GpuMesh {
    pub fn new(gl: &Gl, mesh: &Mesh) -> Result<Self, JsValue> {
        let mut gpu = Self {
            vertex_buffer: create_buffer(gl)?,
            tex_coord_buffer: create_buffer(gl)?,
            count: 0,
            texture: None,
        };
        gpu.write(gl, mesh);
        Ok(gpu)
    }

    /// Replace the buffer contents with `mesh`
    pub fn write(&mut self, gl: &Gl, mesh: &Mesh) {
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&self.vertex_buffer));
        gl.buffer_data_with_u8_array(
            Gl::ARRAY_BUFFER,
            &float_bytes(&mesh.position_buffer()),
            Gl::STREAM_DRAW,
        );
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&self.tex_coord_buffer));
        gl.buffer_data_with_u8_array(
            Gl::ARRAY_BUFFER,
            &float_bytes(&mesh.tex_coord_buffer()),
            Gl::STREAM_DRAW,
        );
        self.count = mesh.vertex_count() as i32;
    }

    pub fn texture(&self) -> Option<&WebGlTexture> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<WebGlTexture>) {
        self.texture = texture;
    }
}

fn create_buffer(gl: &Gl) -> Result<WebGlBuffer, JsValue> {
    gl.create_buffer()
        .ok_or_else(|| JsValue::from_str("failed to create vertex buffer"))
}

/// Little-endian bytes of `values`, the layout WebGL reads on wasm32
pub fn float_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// An empty 2D texture set up for non-power-of-two sources (camera frames,
/// arbitrary images): no mipmaps, clamped edges, linear filtering.
pub fn create_texture(gl: &Gl) -> Result<WebGlTexture, JsValue> {
    let texture = gl
        .create_texture()
        .ok_or_else(|| JsValue::from_str("failed to create texture"))?;
    gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
    gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
    gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
    gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
    gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);
    Ok(texture)
}

/// Copy the current frame of `video` into `texture`
pub fn upload_video(gl: &Gl, texture: &WebGlTexture, video: &HtmlVideoElement) -> Result<(), JsValue> {
    gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
    gl.tex_image_2d_with_u32_and_u32_and_video(
        Gl::TEXTURE_2D,
        0,
        Gl::RGBA as i32,
        Gl::RGBA,
        Gl::UNSIGNED_BYTE,
        video,
    )
}

/// Copy a loaded image into `texture`
pub fn upload_image(gl: &Gl, texture: &WebGlTexture, image: &HtmlImageElement) -> Result<(), JsValue> {
    gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
    gl.tex_image_2d_with_u32_and_u32_and_image(
        Gl::TEXTURE_2D,
        0,
        Gl::RGBA as i32,
        Gl::RGBA,
        Gl::UNSIGNED_BYTE,
        image,
    )
}

/// WebGL context plus the one shader program every pass uses
pub struct GlTarget {
    gl: Gl,
    program: WebGlProgram,
    vertex_attrib: u32,
    tex_coord_attrib: u32,
    mvp_location: Option<WebGlUniformLocation>,
    use_texture_location: Option<WebGlUniformLocation>,
}

impl GlTarget {
    /// Compile and link the shaders. Any failure here ends the session.
    pub fn new(gl: Gl) -> Result<Self, JsValue> {
        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)
            .map_err(|log| format!("Error in vertex shader: {log}"))?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)
            .map_err(|log| format!("Error in fragment shader: {log}"))?;
        let program = link_program(&gl, &vertex, &fragment)
            .map_err(|log| format!("Link error in program: {log}"))?;
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        let vertex_attrib = attrib_location(&gl, &program, "vertex")?;
        let tex_coord_attrib = attrib_location(&gl, &program, "texCoord")?;
        let mvp_location = gl.get_uniform_location(&program, "ModelViewProjectionMatrix");
        let use_texture_location = gl.get_uniform_location(&program, "useTexture");

        gl.use_program(Some(&program));
        // All textures are sampled from unit 0
        gl.uniform1i(gl.get_uniform_location(&program, "tmu").as_ref(), 0);
        gl.enable(Gl::DEPTH_TEST);

        Ok(Self {
            gl,
            program,
            vertex_attrib,
            tex_coord_attrib,
            mvp_location,
            use_texture_location,
        })
    }

    pub fn context(&self) -> &Gl {
        &self.gl
    }

    /// Clear color and depth at the start of a frame
    pub fn begin_frame(&self) {
        self.gl.use_program(Some(&self.program));
        self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn bind_attribute(&self, buffer: &WebGlBuffer, location: u32, size: i32) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
        self.gl
            .vertex_attrib_pointer_with_i32(location, size, Gl::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(location);
    }

    fn bind_texture(&self, texture: Option<&WebGlTexture>) {
        self.gl.active_texture(Gl::TEXTURE0);
        self.gl.bind_texture(Gl::TEXTURE_2D, texture);
        self.gl
            .uniform1i(self.use_texture_location.as_ref(), texture.is_some() as i32);
    }
}

impl RenderTarget for GlTarget {
    type Mesh = GpuMesh;

    fn clear_depth(&mut self) {
        self.gl.clear(Gl::DEPTH_BUFFER_BIT);
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        // Alpha is only written with the full mask
        self.gl
            .color_mask(mask.red, mask.green, mask.blue, mask == ColorMask::ALL);
    }

    fn draw(&mut self, mesh: &GpuMesh, transform: &Matrix4<f32>) {
        self.gl.uniform_matrix4fv_with_f32_array(
            self.mvp_location.as_ref(),
            false,
            transform.as_slice(),
        );
        self.bind_texture(mesh.texture());
        self.bind_attribute(&mesh.vertex_buffer, self.vertex_attrib, 3);
        self.bind_attribute(&mesh.tex_coord_buffer, self.tex_coord_attrib, 2);
        self.gl.draw_arrays(Gl::TRIANGLES, 0, mesh.count);
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, String> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| "unable to create shader object".to_string())?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        Err(gl.get_shader_info_log(&shader).unwrap_or_default())
    }
}

fn link_program(gl: &Gl, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, String> {
    let program = gl
        .create_program()
        .ok_or_else(|| "unable to create program object".to_string())?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        Err(gl.get_program_info_log(&program).unwrap_or_default())
    }
}

fn attrib_location(gl: &Gl, program: &WebGlProgram, name: &str) -> Result<u32, JsValue> {
    let location = gl.get_attrib_location(program, name);
    u32::try_from(location)
        .map_err(|_| JsValue::from_str(&format!("attribute `{name}` not found in program")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_bytes_layout() {
        let bytes = float_bytes(&[1.0, -2.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-2.5f32).to_le_bytes());
    }

    #[test]
    fn test_shaders_share_texture_coordinates() {
        assert!(VERTEX_SHADER.contains("varying vec2 vTexCoord"));
        assert!(FRAGMENT_SHADER.contains("varying vec2 vTexCoord"));
        assert!(FRAGMENT_SHADER.contains("uniform sampler2D tmu"));
        assert!(FRAGMENT_SHADER.contains("texture2D(tmu, vTexCoord)"));
    }
}
