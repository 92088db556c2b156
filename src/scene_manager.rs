use glam::{Vec2, Vec3};
use nalgebra as na;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_timer::Instant;
use web_sys::{HtmlCanvasElement, HtmlElement, WebGl2RenderingContext};

use crate::geometry::PlaneGeometry;
use crate::helper::{create_canvas, generate_id, get_container, get_window_dpr};
use crate::item::{GalleryItem, ItemNode};
use crate::renderer::{PlaneDraw, Renderer, WebGl2Renderer};
use crate::scroll::{Direction, ScrollState};

/// Container size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

/// Visible extent at z = 0 in world units, derived from the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fov_deg: f32,
    pub z: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            z: 20.0,
        }
    }
}

impl Camera {
    /// World-unit extent of the screen plane: `height = 2 tan(fov/2) z`.
    pub fn viewport(&self, screen: Screen) -> Viewport {
        let fov = self.fov_deg.to_radians();
        let height = 2.0 * (fov / 2.0).tan() * self.z;
        let width = height * (screen.width / screen.height);
        Viewport { width, height }
    }

    pub fn projection(&self, aspect: f32) -> na::Matrix4<f32> {
        na::Perspective3::new(aspect, self.fov_deg.to_radians(), 0.1, 100.0).to_homogeneous()
    }

    pub fn view(&self) -> na::Matrix4<f32> {
        na::Matrix4::new_translation(&na::Vector3::new(0.0, 0.0, -self.z))
    }
}

pub struct SceneManagerOptions {
    pub container_id: String,
    pub bend: f32,
    pub text_color: String,
    pub border_radius: f32,
    pub font: String,
}

impl Default for SceneManagerOptions {
    fn default() -> Self {
        Self {
            container_id: "gallery".to_string(),
            bend: 3.0,
            text_color: "#ffffff".to_string(),
            border_radius: 0.05,
            font: "bold 30px Figtree".to_string(),
        }
    }
}

/// Owns the canvas, the GL context and every item node. Created once per
/// mount, disposed exactly once on unmount.
#[derive(Debug)]
pub struct SceneManager {
    container_id: String,
    bend: f32,
    text_color: String,
    border_radius: f32,
    font: String,

    container: Option<HtmlElement>,
    canvas: Option<HtmlCanvasElement>,
    gl: Option<WebGl2RenderingContext>,
    renderer: Option<Box<dyn Renderer>>,
    geometry: Rc<PlaneGeometry>,
    items: Vec<ItemNode>,

    camera: Camera,
    screen: Screen,
    viewport: Viewport,
    dpr: f64,
    last_update: Instant,
    disposed: bool,
}

impl SceneManager {
    pub fn new(options: SceneManagerOptions) -> Self {
        Self {
            container_id: options.container_id,
            bend: options.bend,
            text_color: options.text_color,
            border_radius: options.border_radius,
            font: options.font,
            container: None,
            canvas: None,
            gl: None,
            renderer: None,
            geometry: PlaneGeometry::shared(100, 50),
            items: Vec::new(),
            camera: Camera::default(),
            screen: Screen {
                width: 1.0,
                height: 1.0,
            },
            viewport: Viewport {
                width: 1.0,
                height: 1.0,
            },
            dpr: 1.0,
            last_update: Instant::now(),
            disposed: false,
        }
    }
}

impl SceneManager {
    pub fn init(&mut self) -> Result<(), JsValue> {
        let dpr = get_window_dpr()?;
        let container = get_container(&self.container_id).map_err(|e| JsValue::from_str(&e))?;
        let canvas = create_canvas(&container)?;
        canvas.set_id(&format!("gallery-{}", generate_id()));
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL2 is not supported in this environment"))?
            .dyn_into::<WebGl2RenderingContext>()?;

        self.renderer = Some(Box::new(WebGl2Renderer::new(gl.clone(), &self.geometry)?));
        self.gl = Some(gl);
        self.dpr = dpr;
        self.container = Some(container);
        self.canvas = Some(canvas);

        self.resize()
    }

    /// Build the doubled node list. Doubling guarantees that as an item
    /// exits one edge its twin is already entering the opposite one.
    pub fn set_items(&mut self, items: &[GalleryItem]) -> Result<(), JsValue> {
        if items.is_empty() {
            self.items.clear();
            return Ok(());
        }
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| JsValue::from_str("SceneManager not initialized"))?;

        let length = items.len() * 2;
        let mut nodes = Vec::with_capacity(length);
        for index in 0..length {
            let data = items[index % items.len()].clone();
            nodes.push(ItemNode::new(
                index,
                length,
                data,
                renderer.as_ref(),
                &self.text_color,
                &self.font,
                self.bend,
            )?);
        }
        self.items = nodes;

        let (screen, viewport) = (self.screen, self.viewport);
        for item in &mut self.items {
            item.on_resize(screen, viewport);
        }
        Ok(())
    }

    pub fn resize(&mut self) -> Result<(), JsValue> {
        let (Some(container), Some(canvas)) = (self.container.as_ref(), self.canvas.as_ref())
        else {
            return Ok(());
        };

        let width = container.client_width().max(1) as f32;
        let height = container.client_height().max(1) as f32;
        canvas.set_width((width as f64 * self.dpr) as u32);
        canvas.set_height((height as f64 * self.dpr) as u32);

        self.screen = Screen { width, height };
        self.viewport = self.camera.viewport(self.screen);

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(canvas.width(), canvas.height());
            renderer.set_camera(self.camera.projection(width / height), self.camera.view());
        }

        let (screen, viewport) = (self.screen, self.viewport);
        for item in &mut self.items {
            item.on_resize(screen, viewport);
        }
        Ok(())
    }

    pub fn render(&mut self, scroll: &ScrollState, direction: Direction, delta_time: f64) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.begin_frame();

        let viewport = self.viewport;
        for item in &mut self.items {
            item.flush_pending_image(renderer.as_ref());
            item.update(scroll, direction, viewport, delta_time);

            renderer.draw_plane(&PlaneDraw {
                texture: &item.texture,
                position: Vec3::new(item.layout.position_x, item.y, 0.0),
                rotation_z: item.rotation_z,
                scale: item.scale,
                image_size: item.image_size,
                border_radius: self.border_radius,
                time: item.time,
                speed: item.speed,
            });

            if let Some(title) = &item.title {
                let title_height = item.scale.y * 0.15;
                let title_scale = Vec2::new(title_height * title.aspect, title_height);
                renderer.draw_plane(&PlaneDraw {
                    texture: &title.texture,
                    position: Vec3::new(
                        item.layout.position_x,
                        item.y - item.scale.y / 2.0 - title_height * 0.8,
                        0.01,
                    ),
                    rotation_z: item.rotation_z,
                    scale: title_scale,
                    image_size: Vec2::new(title.aspect, 1.0),
                    border_radius: 0.0,
                    time: 0.0,
                    speed: 0.0,
                });
            }
        }
    }

    pub fn update_time(&mut self) -> f64 {
        let now = Instant::now();
        let delta_time = (now - self.last_update).as_secs_f64();
        self.last_update = now;
        delta_time
    }
}

impl SceneManager {
    pub fn canvas(&self) -> Option<&HtmlCanvasElement> {
        self.canvas.as_ref()
    }

    /// Current center offsets in index order, for click resolution.
    pub fn item_positions(&self) -> Vec<f32> {
        self.items
            .iter()
            .map(|item| item.layout.position_x)
            .collect()
    }

    /// One slot width (plane + padding); zero before the first layout pass.
    pub fn item_width(&self) -> f32 {
        self.items.first().map_or(0.0, |item| item.layout.width)
    }

    pub fn item_data(&self, index: usize) -> Option<GalleryItem> {
        self.items.get(index).map(|item| item.data().clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SceneManager {
    /// Release listeners-free GPU state: item textures, shared mesh buffers,
    /// the program, and finally the context itself.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(renderer) = self.renderer.as_mut() {
            for item in &self.items {
                renderer.delete_texture(&item.texture);
                if let Some(title) = &item.title {
                    renderer.delete_texture(&title.texture);
                }
            }
            renderer.dispose();
        }
        self.items.clear();
        self.renderer = None;

        if let Some(gl) = self.gl.take() {
            if let Ok(Some(extension)) = gl.get_extension("WEBGL_lose_context") {
                if let Ok(extension) = extension.dyn_into::<web_sys::WebglLoseContext>() {
                    extension.lose_context();
                }
            }
        }
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
        self.container = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_from_fov_and_distance() {
        let camera = Camera::default();
        let viewport = camera.viewport(Screen {
            width: 1600.0,
            height: 800.0,
        });
        // 2 * tan(22.5 deg) * 20
        assert!((viewport.height - 16.5685).abs() < 1e-3);
        assert!((viewport.width - viewport.height * 2.0).abs() < 1e-3);
    }

    #[test]
    fn projection_is_finite() {
        let camera = Camera::default();
        let projection = camera.projection(16.0 / 9.0);
        assert!(projection.iter().all(|v| v.is_finite()));
        let view = camera.view();
        assert_eq!(view[(2, 3)], -20.0);
    }

    #[test]
    fn default_options_match_public_contract() {
        let options = SceneManagerOptions::default();
        assert_eq!(options.bend, 3.0);
        assert_eq!(options.text_color, "#ffffff");
        assert_eq!(options.border_radius, 0.05);
    }
}
