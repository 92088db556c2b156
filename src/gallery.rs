use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::js_sys::Function;
use web_sys::{Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent};

use crate::events::{get_event_system, AppEvent, EventBindings};
use crate::frame_loop;
use crate::helper::log_error;
use crate::item::GalleryItem;
use crate::scene_manager::{SceneManager, SceneManagerOptions};
use crate::scroll::{ScrollController, ScrollState};

/// JS-facing configuration, all fields optional. Callbacks do not ride
/// through serde; register them with [`Gallery::on`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryOptions {
    pub items: Vec<GalleryItem>,
    pub bend: f32,
    pub text_color: String,
    pub border_radius: f32,
    pub font: String,
    pub scroll_speed: f32,
    pub scroll_ease: f32,
    pub autoplay_speed: f32,
    pub snap_debounce_ms: u64,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            bend: 3.0,
            text_color: "#ffffff".to_string(),
            border_radius: 0.05,
            font: "bold 30px Figtree".to_string(),
            scroll_speed: 2.0,
            scroll_ease: 0.05,
            autoplay_speed: 0.02,
            snap_debounce_ms: 200,
        }
    }
}

static PLACEHOLDER_ITEMS: Lazy<Vec<GalleryItem>> = Lazy::new(|| {
    (1..=8)
        .map(|i| GalleryItem {
            image: format!("https://picsum.photos/seed/{}/800/600", i),
            text: format!("Slide {}", i),
            link: None,
            description: None,
        })
        .collect()
});

pub(crate) struct Engine {
    pub scene: SceneManager,
    pub scroll: ScrollState,
    pub controller: ScrollController,
}

impl Engine {
    fn tick(&mut self) {
        self.controller.tick(&mut self.scroll);
        self.scroll.step();
        let direction = self.scroll.direction();
        let delta_time = self.scene.update_time();
        self.scene.render(&self.scroll, direction, delta_time);
        self.scroll.commit();
    }

    fn resize(&mut self) {
        if let Err(err) = self.scene.resize() {
            log_error(&format!("gallery: resize failed: {:?}", err));
            return;
        }
        self.controller.set_item_width(self.scene.item_width());
    }

    fn on_up(&mut self, x: f32) -> Option<GalleryItem> {
        let positions = self.scene.item_positions();
        let index = self.controller.on_up(x, &positions, &mut self.scroll)?;
        self.scene.item_data(index)
    }
}

/// The continuous circular gallery, exported to the embedding page.
/// Constructing it mounts a canvas into the container and starts the frame
/// loop; `destroy` tears everything down deterministically.
#[wasm_bindgen]
pub struct Gallery {
    engine: Rc<RefCell<Engine>>,
    bindings: EventBindings,
    destroyed: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl Gallery {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, options: JsValue) -> Result<Gallery, JsValue> {
        let options: GalleryOptions = if options.is_undefined() || options.is_null() {
            GalleryOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))?
        };

        let items = if options.items.is_empty() {
            PLACEHOLDER_ITEMS.clone()
        } else {
            options.items.clone()
        };

        let mut scene = SceneManager::new(SceneManagerOptions {
            container_id: container_id.to_string(),
            bend: options.bend,
            text_color: options.text_color.clone(),
            border_radius: options.border_radius,
            font: options.font.clone(),
        });
        scene.init()?;
        scene.set_items(&items)?;

        let mut controller = ScrollController::new(
            options.scroll_speed,
            options.autoplay_speed,
            options.snap_debounce_ms,
        );
        controller.set_item_width(scene.item_width());

        let engine = Rc::new(RefCell::new(Engine {
            scene,
            scroll: ScrollState::new(options.scroll_ease),
            controller,
        }));
        let destroyed = Rc::new(Cell::new(false));

        let mut bindings = EventBindings::new();
        {
            let engine_ref = engine.borrow();
            let canvas = engine_ref
                .scene
                .canvas()
                .ok_or_else(|| JsValue::from_str("SceneManager has no canvas"))?
                .clone();
            drop(engine_ref);
            bind_inputs(&mut bindings, &engine, &destroyed, &canvas)?;
        }

        {
            let engine = engine.clone();
            frame_loop::start(destroyed.clone(), move || engine.borrow_mut().tick());
        }

        let _ = get_event_system().emit(AppEvent::Ready.into(), &JsValue::NULL);

        Ok(Gallery {
            engine,
            bindings,
            destroyed,
        })
    }

    /// Register a JS listener, e.g. `gallery.on("item:click", cb)`. The
    /// click payload carries `{image, text, link, description}`.
    pub fn on(&self, event: &str, callback: &Function) {
        get_event_system().add_listener(event, callback);
    }

    pub fn off(&self, event: &str, callback: &Function) {
        get_event_system().remove_listener(event, callback);
    }

    /// Full teardown: stop the loop, remove every DOM listener once, release
    /// every GPU handle. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed.get() {
            return;
        }
        self.destroyed.set(true);
        self.bindings.unbind_all();
        {
            let mut engine = self.engine.borrow_mut();
            engine.controller.cancel_pending();
            engine.scene.dispose();
        }
        let _ = get_event_system().emit(AppEvent::Destroyed.into(), &JsValue::NULL);
    }
}

fn mouse_x(event: &Event) -> Option<f32> {
    event
        .dyn_ref::<MouseEvent>()
        .map(|e| e.client_x() as f32)
}

fn touch_x(event: &Event) -> Option<f32> {
    let touch_event = event.dyn_ref::<TouchEvent>()?;
    let touches = touch_event.touches();
    let touch = if touches.length() > 0 {
        touches.get(0)
    } else {
        touch_event.changed_touches().get(0)
    }?;
    Some(touch.client_x() as f32)
}

fn bind_inputs(
    bindings: &mut EventBindings,
    engine: &Rc<RefCell<Engine>>,
    destroyed: &Rc<Cell<bool>>,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))?;
    let window_target: &EventTarget = window.as_ref();
    let canvas_target: &EventTarget = canvas.as_ref();

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            window_target,
            "resize",
            Closure::wrap(Box::new(move |_: Event| {
                if !destroyed.get() {
                    engine.borrow_mut().resize();
                }
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            window_target,
            "wheel",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                if let Some(wheel) = event.dyn_ref::<WheelEvent>() {
                    let mut engine = engine.borrow_mut();
                    let Engine {
                        controller, scroll, ..
                    } = &mut *engine;
                    controller.on_wheel(wheel.delta_y() as f32, scroll);
                }
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            canvas_target,
            "mousedown",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                if let Some(x) = mouse_x(&event) {
                    let mut engine = engine.borrow_mut();
                    let Engine {
                        controller, scroll, ..
                    } = &mut *engine;
                    controller.on_down(x, scroll);
                }
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            window_target,
            "mousemove",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                if let Some(x) = mouse_x(&event) {
                    let mut engine = engine.borrow_mut();
                    let Engine {
                        controller, scroll, ..
                    } = &mut *engine;
                    controller.on_move(x, scroll);
                }
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            window_target,
            "mouseup",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                let clicked = mouse_x(&event).and_then(|x| engine.borrow_mut().on_up(x));
                emit_click(clicked);
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            canvas_target,
            "touchstart",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                if let Some(x) = touch_x(&event) {
                    let mut engine = engine.borrow_mut();
                    let Engine {
                        controller, scroll, ..
                    } = &mut *engine;
                    controller.on_down(x, scroll);
                }
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            window_target,
            "touchmove",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                if let Some(x) = touch_x(&event) {
                    let mut engine = engine.borrow_mut();
                    let Engine {
                        controller, scroll, ..
                    } = &mut *engine;
                    controller.on_move(x, scroll);
                }
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    {
        let engine = engine.clone();
        let destroyed = destroyed.clone();
        bindings.bind(
            window_target,
            "touchend",
            Closure::wrap(Box::new(move |event: Event| {
                if destroyed.get() {
                    return;
                }
                let clicked = touch_x(&event).and_then(|x| engine.borrow_mut().on_up(x));
                emit_click(clicked);
            }) as Box<dyn FnMut(Event)>),
        )?;
    }

    Ok(())
}

fn emit_click(clicked: Option<GalleryItem>) {
    if let Some(item) = clicked {
        let payload = serde_wasm_bindgen::to_value(&item).unwrap_or(JsValue::NULL);
        let _ = get_event_system().emit(AppEvent::ItemClick.into(), &payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_from_empty_json() {
        let options: GalleryOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.bend, 3.0);
        assert_eq!(options.text_color, "#ffffff");
        assert_eq!(options.border_radius, 0.05);
        assert_eq!(options.font, "bold 30px Figtree");
        assert_eq!(options.scroll_speed, 2.0);
        assert_eq!(options.scroll_ease, 0.05);
        assert_eq!(options.snap_debounce_ms, 200);
        assert!(options.items.is_empty());
    }

    #[test]
    fn options_accept_camel_case_overrides() {
        let options: GalleryOptions = serde_json::from_str(
            r##"{"bend":0,"scrollSpeed":3,"textColor":"#000000","snapDebounceMs":50,
                "items":[{"image":"a.jpg","text":"A"}]}"##,
        )
        .unwrap();
        assert_eq!(options.bend, 0.0);
        assert_eq!(options.scroll_speed, 3.0);
        assert_eq!(options.text_color, "#000000");
        assert_eq!(options.snap_debounce_ms, 50);
        assert_eq!(options.items.len(), 1);
        assert_eq!(options.items[0].text, "A");
    }

    #[test]
    fn placeholders_cover_empty_item_lists() {
        assert!(!PLACEHOLDER_ITEMS.is_empty());
        assert!(PLACEHOLDER_ITEMS.iter().all(|item| !item.image.is_empty()));
    }
}
