mod webgl2_renderer;

use std::fmt::Debug;

use glam::{Vec2, Vec3};
use nalgebra as na;
use wasm_bindgen::JsValue;
use web_sys::{HtmlCanvasElement, HtmlImageElement, WebGlTexture};

pub use webgl2_renderer::WebGl2Renderer;

/// Everything the backend needs to draw one textured plane.
#[derive(Debug)]
pub struct PlaneDraw<'a> {
    pub texture: &'a WebGlTexture,
    pub position: Vec3,
    pub rotation_z: f32,
    pub scale: Vec2,
    /// Natural pixel size of the bound texture, for cover fitting.
    pub image_size: Vec2,
    /// Corner rounding as a fraction of the plane, 0 disables the SDF cut.
    pub border_radius: f32,
    pub time: f32,
    pub speed: f32,
}

/// Seam between the scene walk and the graphics context. One WebGL2 backend
/// exists today; the trait keeps the scene code free of GL plumbing.
pub trait Renderer: Debug {
    fn resize(&mut self, width: u32, height: u32);
    fn set_camera(&mut self, projection: na::Matrix4<f32>, view: na::Matrix4<f32>);

    fn begin_frame(&self);
    fn draw_plane(&self, draw: &PlaneDraw);

    fn create_placeholder_texture(&self) -> Result<WebGlTexture, JsValue>;
    fn create_texture_from_canvas(&self, canvas: &HtmlCanvasElement)
        -> Result<WebGlTexture, JsValue>;
    fn upload_image(&self, texture: &WebGlTexture, image: &HtmlImageElement);
    fn delete_texture(&self, texture: &WebGlTexture);

    /// Release every GPU handle this backend owns. GL resources are native
    /// handles; dropping the Rust side alone leaks them.
    fn dispose(&mut self);
}
