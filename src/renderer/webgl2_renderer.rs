use nalgebra as na;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::js_sys::{Float32Array, Uint16Array};
use web_sys::WebGl2RenderingContext as Gl;
use web_sys::{
    HtmlCanvasElement, HtmlImageElement, WebGlBuffer, WebGlProgram, WebGlShader, WebGlTexture,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use super::{PlaneDraw, Renderer};
use crate::geometry::PlaneGeometry;

const VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

in vec3 position;
in vec2 uv;

uniform mat4 uProjection;
uniform mat4 uView;
uniform mat4 uModel;
uniform float uTime;
uniform float uSpeed;

out vec2 vUv;

void main() {
    vUv = uv;
    vec3 p = position;
    p.z = (sin(p.x * 4.0 + uTime) * 1.5 + cos(p.y * 2.0 + uTime) * 1.5)
        * (0.1 + abs(uSpeed) * 0.5);
    gl_Position = uProjection * uView * uModel * vec4(p, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 vUv;

uniform sampler2D uTexture;
uniform vec2 uPlaneSizes;
uniform vec2 uImageSizes;
uniform float uBorderRadius;

out vec4 fragColor;

float roundedBoxSDF(vec2 p, vec2 b, float r) {
    vec2 d = abs(p) - b;
    return length(max(d, 0.0)) + min(max(d.x, d.y), 0.0) - r;
}

void main() {
    vec2 ratio = vec2(
        min((uPlaneSizes.x / uPlaneSizes.y) / (uImageSizes.x / uImageSizes.y), 1.0),
        min((uPlaneSizes.y / uPlaneSizes.x) / (uImageSizes.y / uImageSizes.x), 1.0)
    );
    vec2 uv = vec2(
        vUv.x * ratio.x + (1.0 - ratio.x) * 0.5,
        vUv.y * ratio.y + (1.0 - ratio.y) * 0.5
    );
    vec4 color = texture(uTexture, uv);

    float d = roundedBoxSDF(vUv - 0.5, vec2(0.5 - uBorderRadius), uBorderRadius);
    float alpha = 1.0 - smoothstep(-0.002, 0.002, d);
    fragColor = vec4(color.rgb, color.a * alpha);
}
"#;

#[derive(Debug)]
struct Uniforms {
    projection: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    model: Option<WebGlUniformLocation>,
    texture: Option<WebGlUniformLocation>,
    plane_sizes: Option<WebGlUniformLocation>,
    image_sizes: Option<WebGlUniformLocation>,
    border_radius: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    speed: Option<WebGlUniformLocation>,
}

pub struct WebGl2Renderer {
    gl: Gl,
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    position_buffer: WebGlBuffer,
    uv_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
    uniforms: Uniforms,
    projection: na::Matrix4<f32>,
    view: na::Matrix4<f32>,
    disposed: bool,
}

impl std::fmt::Debug for WebGl2Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebGl2Renderer {{ index_count: {} }}", self.index_count)
    }
}

impl WebGl2Renderer {
    pub fn new(gl: Gl, geometry: &Rc<PlaneGeometry>) -> Result<Self, JsValue> {
        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| JsValue::from_str("Failed to create vertex array object"))?;
        gl.bind_vertex_array(Some(&vao));

        let position_buffer = upload_f32_buffer(&gl, geometry.positions())?;
        let position_location = gl.get_attrib_location(&program, "position") as u32;
        gl.enable_vertex_attrib_array(position_location);
        gl.vertex_attrib_pointer_with_i32(position_location, 3, Gl::FLOAT, false, 0, 0);

        let uv_buffer = upload_f32_buffer(&gl, geometry.uvs())?;
        let uv_location = gl.get_attrib_location(&program, "uv") as u32;
        gl.enable_vertex_attrib_array(uv_location);
        gl.vertex_attrib_pointer_with_i32(uv_location, 2, Gl::FLOAT, false, 0, 0);

        let index_buffer = gl
            .create_buffer()
            .ok_or_else(|| JsValue::from_str("Failed to create index buffer"))?;
        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        let index_array = Uint16Array::from(geometry.indices());
        gl.buffer_data_with_array_buffer_view(
            Gl::ELEMENT_ARRAY_BUFFER,
            &index_array,
            Gl::STATIC_DRAW,
        );

        gl.bind_vertex_array(None);

        let uniforms = Uniforms {
            projection: gl.get_uniform_location(&program, "uProjection"),
            view: gl.get_uniform_location(&program, "uView"),
            model: gl.get_uniform_location(&program, "uModel"),
            texture: gl.get_uniform_location(&program, "uTexture"),
            plane_sizes: gl.get_uniform_location(&program, "uPlaneSizes"),
            image_sizes: gl.get_uniform_location(&program, "uImageSizes"),
            border_radius: gl.get_uniform_location(&program, "uBorderRadius"),
            time: gl.get_uniform_location(&program, "uTime"),
            speed: gl.get_uniform_location(&program, "uSpeed"),
        };

        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, 1);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        Ok(Self {
            gl,
            program,
            vao,
            position_buffer,
            uv_buffer,
            index_buffer,
            index_count: geometry.index_count() as i32,
            uniforms,
            projection: na::Matrix4::identity(),
            view: na::Matrix4::identity(),
            disposed: false,
        })
    }

    fn model_matrix(draw: &PlaneDraw) -> na::Matrix4<f32> {
        let translation = na::Matrix4::new_translation(&na::Vector3::new(
            draw.position.x,
            draw.position.y,
            draw.position.z,
        ));
        let rotation = na::Matrix4::new_rotation(na::Vector3::new(0.0, 0.0, draw.rotation_z));
        let scale = na::Matrix4::new_nonuniform_scaling(&na::Vector3::new(
            draw.scale.x,
            draw.scale.y,
            1.0,
        ));
        translation * rotation * scale
    }
}

impl Renderer for WebGl2Renderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn set_camera(&mut self, projection: na::Matrix4<f32>, view: na::Matrix4<f32>) {
        self.projection = projection;
        self.view = view;
    }

    fn begin_frame(&self) {
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        self.gl.use_program(Some(&self.program));
        self.gl.bind_vertex_array(Some(&self.vao));
        self.gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.projection.as_ref(),
            false,
            self.projection.as_slice(),
        );
        self.gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.view.as_ref(),
            false,
            self.view.as_slice(),
        );
        self.gl.uniform1i(self.uniforms.texture.as_ref(), 0);
    }

    fn draw_plane(&self, draw: &PlaneDraw) {
        let gl = &self.gl;
        let model = Self::model_matrix(draw);
        gl.uniform_matrix4fv_with_f32_array(self.uniforms.model.as_ref(), false, model.as_slice());
        gl.uniform2f(
            self.uniforms.plane_sizes.as_ref(),
            draw.scale.x,
            draw.scale.y,
        );
        gl.uniform2f(
            self.uniforms.image_sizes.as_ref(),
            draw.image_size.x,
            draw.image_size.y,
        );
        gl.uniform1f(self.uniforms.border_radius.as_ref(), draw.border_radius);
        gl.uniform1f(self.uniforms.time.as_ref(), draw.time);
        gl.uniform1f(self.uniforms.speed.as_ref(), draw.speed);

        gl.active_texture(Gl::TEXTURE0);
        gl.bind_texture(Gl::TEXTURE_2D, Some(draw.texture));
        gl.draw_elements_with_i32(Gl::TRIANGLES, self.index_count, Gl::UNSIGNED_SHORT, 0);
    }

    fn create_placeholder_texture(&self) -> Result<WebGlTexture, JsValue> {
        let gl = &self.gl;
        let texture = gl
            .create_texture()
            .ok_or_else(|| JsValue::from_str("Failed to create texture"))?;
        gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        set_texture_params(gl);
        // 1x1 dark pixel until the real image lands
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            1,
            1,
            0,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            Some(&[34, 34, 34, 255]),
        )?;
        Ok(texture)
    }

    fn create_texture_from_canvas(
        &self,
        canvas: &HtmlCanvasElement,
    ) -> Result<WebGlTexture, JsValue> {
        let gl = &self.gl;
        let texture = gl
            .create_texture()
            .ok_or_else(|| JsValue::from_str("Failed to create texture"))?;
        gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        set_texture_params(gl);
        gl.tex_image_2d_with_u32_and_u32_and_html_canvas_element(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            canvas,
        )?;
        Ok(texture)
    }

    fn upload_image(&self, texture: &WebGlTexture, image: &HtmlImageElement) {
        let gl = &self.gl;
        gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
        if let Err(err) = gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            image,
        ) {
            web_sys::console::warn_1(&err);
        }
    }

    fn delete_texture(&self, texture: &WebGlTexture) {
        self.gl.delete_texture(Some(texture));
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let gl = &self.gl;
        gl.bind_vertex_array(None);
        gl.delete_vertex_array(Some(&self.vao));
        gl.delete_buffer(Some(&self.position_buffer));
        gl.delete_buffer(Some(&self.uv_buffer));
        gl.delete_buffer(Some(&self.index_buffer));
        gl.delete_program(Some(&self.program));
    }
}

fn set_texture_params(gl: &Gl) {
    gl.tex_parameteri(
        Gl::TEXTURE_2D,
        Gl::TEXTURE_MIN_FILTER,
        Gl::LINEAR as i32,
    );
    gl.tex_parameteri(
        Gl::TEXTURE_2D,
        Gl::TEXTURE_MAG_FILTER,
        Gl::LINEAR as i32,
    );
    gl.tex_parameteri(
        Gl::TEXTURE_2D,
        Gl::TEXTURE_WRAP_S,
        Gl::CLAMP_TO_EDGE as i32,
    );
    gl.tex_parameteri(
        Gl::TEXTURE_2D,
        Gl::TEXTURE_WRAP_T,
        Gl::CLAMP_TO_EDGE as i32,
    );
}

fn upload_f32_buffer(gl: &Gl, data: &[f32]) -> Result<WebGlBuffer, JsValue> {
    let buffer = gl
        .create_buffer()
        .ok_or_else(|| JsValue::from_str("Failed to create buffer"))?;
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
    let array = Float32Array::from(data);
    gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);
    Ok(buffer)
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| JsValue::from_str("Failed to create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown shader compile error".to_string());
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&log))
    }
}

fn link_program(
    gl: &Gl,
    vertex: &WebGlShader,
    fragment: &WebGlShader,
) -> Result<WebGlProgram, JsValue> {
    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("Failed to create program"))?;
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
        let log = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown program link error".to_string());
        gl.delete_program(Some(&program));
        Err(JsValue::from_str(&log))
    }
}
