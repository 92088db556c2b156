use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlImageElement, WebGlTexture};

use crate::helper::log_warn;
use crate::renderer::Renderer;
use crate::scene_manager::{Screen, Viewport};
use crate::scroll::{Direction, ScrollState};
use crate::texture::{load_html_image, rasterize_text};
use wasm_bindgen::JsValue;

/// Gap between neighbouring planes in world units.
pub const PLANE_PADDING: f32 = 2.0;

/// Externally supplied gallery entry. Immutable for the life of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub image: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Arc bend for one item: vertical displacement and z tilt from its scroll
/// position. The row lies on a circle through the viewport edges whose
/// sagitta is |bend|; positions past the viewport edge are clamped so the
/// sqrt/asin arguments stay in domain.
pub fn arc_transform(x: f32, half_viewport: f32, bend: f32) -> (f32, f32) {
    if bend == 0.0 || half_viewport <= 0.0 {
        return (0.0, 0.0);
    }
    let b = bend.abs();
    let radius = (half_viewport * half_viewport + b * b) / (2.0 * b);
    let effective = x.abs().min(half_viewport);
    let arc = radius - (radius * radius - effective * effective).max(0.0).sqrt();
    let tilt = (effective / radius).clamp(-1.0, 1.0).asin();
    let side = if x < 0.0 { -1.0 } else { 1.0 };
    if bend > 0.0 {
        (-arc, -side * tilt)
    } else {
        (arc, side * tilt)
    }
}

/// Positional bookkeeping for one duplicated-list slot. Pure so the
/// wraparound transition is testable without a GL context.
///
/// `is_before`/`is_after` mark a plane fully past the left/right viewport
/// edge; the wrap teleports it by one full list width, guarded by scroll
/// direction so only the trailing edge ever jumps.
#[derive(Debug, Clone, Copy)]
pub struct ItemLayout {
    pub index: usize,
    pub length: usize,
    pub base_x: f32,
    pub width: f32,
    pub total_width: f32,
    pub extra: f32,
    pub position_x: f32,
    pub is_before: bool,
    pub is_after: bool,
}

impl ItemLayout {
    pub fn new(index: usize, length: usize) -> Self {
        Self {
            index,
            length,
            base_x: 0.0,
            width: 0.0,
            total_width: 0.0,
            extra: 0.0,
            position_x: 0.0,
            is_before: false,
            is_after: false,
        }
    }

    /// Recompute spacing from a new plane width. Resets the wrap correction:
    /// the old `extra` is a multiple of the old list width and would tear
    /// the loop under the new one.
    pub fn on_resize(&mut self, plane_width: f32, padding: f32) {
        self.width = plane_width + padding;
        self.total_width = self.width * self.length as f32;
        self.base_x = self.width * self.index as f32;
        self.extra = 0.0;
        self.is_before = false;
        self.is_after = false;
    }

    pub fn update(
        &mut self,
        current: f32,
        direction: Direction,
        half_viewport: f32,
        half_plane: f32,
    ) {
        self.position_x = self.base_x - current - self.extra;
        self.is_before = self.position_x + half_plane < -half_viewport;
        self.is_after = self.position_x - half_plane > half_viewport;

        let wrapped = match direction {
            Direction::Right if self.is_before => {
                self.extra -= self.total_width;
                true
            }
            Direction::Left if self.is_after => {
                self.extra += self.total_width;
                true
            }
            _ => false,
        };
        if wrapped {
            self.is_before = false;
            self.is_after = false;
            // the plane is fully offscreen here, so re-deriving is invisible
            self.position_x = self.base_x - current - self.extra;
        }
    }
}

#[derive(Debug)]
pub struct TitleOverlay {
    pub texture: WebGlTexture,
    pub aspect: f32,
}

/// One gallery entry's visual state: GPU texture slots, title overlay, and
/// the per-frame transform driven by the scroll state.
#[derive(Debug)]
pub struct ItemNode {
    data: GalleryItem,
    pub layout: ItemLayout,
    pub texture: WebGlTexture,
    pub image_size: Vec2,
    pub title: Option<TitleOverlay>,
    pub scale: Vec2,
    pub y: f32,
    pub rotation_z: f32,
    pub time: f32,
    pub speed: f32,
    bend: f32,
    pending_image: Rc<RefCell<Option<HtmlImageElement>>>,
}

impl ItemNode {
    pub fn new(
        index: usize,
        length: usize,
        data: GalleryItem,
        renderer: &dyn Renderer,
        text_color: &str,
        font: &str,
        bend: f32,
    ) -> Result<Self, JsValue> {
        let texture = renderer.create_placeholder_texture()?;

        let title = if data.text.is_empty() {
            None
        } else {
            let (canvas, aspect) = rasterize_text(&data.text, font, text_color)?;
            Some(TitleOverlay {
                texture: renderer.create_texture_from_canvas(&canvas)?,
                aspect,
            })
        };

        let pending_image = Rc::new(RefCell::new(None));
        {
            let pending_image = pending_image.clone();
            let src = data.image.clone();
            spawn_local(async move {
                match load_html_image(&src).await {
                    Ok(image) => *pending_image.borrow_mut() = Some(image),
                    // a missing image leaves this plane blank, nothing else
                    Err(_) => log_warn(&format!("gallery: failed to load image {}", src)),
                }
            });
        }

        Ok(Self {
            data,
            layout: ItemLayout::new(index, length),
            texture,
            image_size: Vec2::ONE,
            title,
            scale: Vec2::ONE,
            y: 0.0,
            rotation_z: 0.0,
            time: 0.0,
            speed: 0.0,
            bend,
            pending_image,
        })
    }

    pub fn data(&self) -> &GalleryItem {
        &self.data
    }

    /// Move the async-loaded image onto the GPU, once it has arrived.
    pub fn flush_pending_image(&mut self, renderer: &dyn Renderer) {
        let image = self.pending_image.borrow_mut().take();
        if let Some(image) = image {
            renderer.upload_image(&self.texture, &image);
            self.image_size = Vec2::new(image.natural_width() as f32, image.natural_height() as f32)
                .max(Vec2::ONE);
        }
    }

    pub fn update(&mut self, scroll: &ScrollState, direction: Direction, viewport: Viewport, delta_time: f64) {
        let half_viewport = viewport.width / 2.0;
        self.layout
            .update(scroll.current, direction, half_viewport, self.scale.x / 2.0);

        let (y, rotation_z) = arc_transform(self.layout.position_x, half_viewport, self.bend);
        self.y = y;
        self.rotation_z = rotation_z;
        self.speed = scroll.speed();
        self.time += (delta_time * 2.5) as f32;
    }

    pub fn on_resize(&mut self, screen: Screen, viewport: Viewport) {
        let scale = screen.height / 1500.0;
        self.scale = Vec2::new(
            viewport.width * (700.0 * scale) / screen.width,
            viewport.height * (900.0 * scale) / screen.height,
        );
        self.layout.on_resize(self.scale.x, PLANE_PADDING);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::Direction;

    fn layout(index: usize, length: usize, plane_width: f32) -> ItemLayout {
        let mut layout = ItemLayout::new(index, length);
        layout.on_resize(plane_width, PLANE_PADDING);
        layout
    }

    #[test]
    fn zero_bend_is_flat() {
        for &x in &[-50.0_f32, -3.0, 0.0, 7.5, 120.0] {
            assert_eq!(arc_transform(x, 10.0, 0.0), (0.0, 0.0));
        }
    }

    #[test]
    fn flat_row_is_evenly_spaced() {
        // six items, bend 0: y = 0, rotation = 0, spacing = width + padding
        let plane_width = 4.0;
        let mut previous = None;
        for index in 0..6 {
            let mut l = layout(index, 6, plane_width);
            l.update(0.0, Direction::Right, 10.0, plane_width / 2.0);
            let (y, rot) = arc_transform(l.position_x, 10.0, 0.0);
            assert_eq!((y, rot), (0.0, 0.0));
            if let Some(prev) = previous {
                let gap: f32 = l.position_x - prev;
                assert!((gap - (plane_width + PLANE_PADDING)).abs() < 1e-5);
            }
            previous = Some(l.position_x);
        }
    }

    #[test]
    fn arc_stays_finite_everywhere() {
        let bends = [-10.0_f32, -3.0, -0.001, 0.001, 0.5, 3.0, 10.0];
        let xs = [-1e6_f32, -100.0, -8.28, -0.1, 0.0, 0.1, 8.28, 100.0, 1e6];
        for &bend in &bends {
            for &x in &xs {
                let (y, rot) = arc_transform(x, 8.28, bend);
                assert!(y.is_finite(), "y not finite at x={} bend={}", x, bend);
                assert!(rot.is_finite(), "rot not finite at x={} bend={}", x, bend);
            }
        }
    }

    #[test]
    fn arc_is_symmetric_and_clamped() {
        let (y_left, rot_left) = arc_transform(-5.0, 10.0, 3.0);
        let (y_right, rot_right) = arc_transform(5.0, 10.0, 3.0);
        assert!((y_left - y_right).abs() < 1e-6);
        assert!((rot_left + rot_right).abs() < 1e-6);

        // beyond the viewport edge the transform freezes at the edge value
        let edge = arc_transform(10.0, 10.0, 3.0);
        let beyond = arc_transform(10_000.0, 10.0, 3.0);
        assert_eq!(edge, beyond);
    }

    #[test]
    fn wraparound_matches_infinite_list() {
        // P2: with wrap corrections, the rendered position stays congruent
        // (mod total list width) to the uncorrected position.
        let plane_width = 4.0;
        let length = 8;
        let half_viewport = 10.0;
        let mut l = layout(2, length, plane_width);
        let total = l.total_width;

        let mut current = 0.0_f32;
        for frame in 0..5000 {
            current += 0.7; // scroll right
            l.update(current, Direction::Right, half_viewport, plane_width / 2.0);
            let raw = l.base_x - current;
            let residue = (l.position_x - raw) / total;
            assert!(
                (residue - residue.round()).abs() < 1e-3,
                "tear at frame {}: position {} raw {}",
                frame,
                l.position_x,
                raw
            );
            // the wrapped twin never ends up outside one list width of center
            assert!(l.position_x.abs() <= total);
        }
    }

    #[test]
    fn wrap_teleports_only_offscreen_planes() {
        let plane_width = 4.0;
        let mut l = layout(0, 4, plane_width);
        let half_viewport = 10.0;

        // drag the plane just past the left edge while moving right
        let current = half_viewport + plane_width; // position_x = -14, fully out
        l.update(current, Direction::Right, half_viewport, plane_width / 2.0);
        assert!(!l.is_before && !l.is_after);
        assert!((l.extra + l.total_width).abs() < 1e-6);
        // re-derived position is on the far side, not at the exit edge
        assert!(l.position_x > 0.0);
    }

    #[test]
    fn single_item_spans_and_never_double_flags() {
        // a lone (duplicated twice) item can wrap but the two edge flags are
        // never simultaneously true while it is on screen
        let plane_width = 30.0;
        let mut l = layout(0, 2, plane_width);
        let mut current = 0.0_f32;
        for _ in 0..2000 {
            current += 0.5;
            l.update(current, Direction::Right, 10.0, plane_width / 2.0);
            assert!(!(l.is_before && l.is_after));
        }
    }

    #[test]
    fn resize_rebases_and_clears_wrap() {
        let mut l = layout(3, 6, 4.0);
        l.update(100.0, Direction::Right, 10.0, 2.0);
        assert!(l.extra != 0.0);
        l.on_resize(5.0, PLANE_PADDING);
        assert_eq!(l.extra, 0.0);
        assert_eq!(l.base_x, (5.0 + PLANE_PADDING) * 3.0);
        assert_eq!(l.total_width, (5.0 + PLANE_PADDING) * 6.0);
    }

    #[test]
    fn gallery_item_deserializes_with_optional_fields() {
        let item: GalleryItem =
            serde_json::from_str(r#"{"image":"https://example.com/a.jpg"}"#).unwrap();
        assert_eq!(item.image, "https://example.com/a.jpg");
        assert_eq!(item.text, "");
        assert!(item.link.is_none());

        let item: GalleryItem = serde_json::from_str(
            r#"{"image":"a.jpg","text":"One","link":"/projects","description":"first"}"#,
        )
        .unwrap();
        assert_eq!(item.link.as_deref(), Some("/projects"));
        assert_eq!(item.description.as_deref(), Some("first"));
    }
}
