use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::js_sys::{Date, Function};
use web_sys::{console, window, HtmlCanvasElement, HtmlElement};

pub fn request_animation_frame(f: &Function) -> i32 {
    web_sys::window()
        .unwrap()
        .request_animation_frame(f)
        .expect("should register `requestAnimationFrame` OK")
}

// 生成id
static COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn generate_id() -> String {
    let timestamp = Date::new_0().get_time();
    let random_part: u32 = rand::thread_rng().gen();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:x}-{:x}", timestamp as u64, random_part, counter)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn get_container(container_id: &str) -> Result<HtmlElement, String> {
    let window = window().ok_or("Failed to get window")?;
    let document = window.document().ok_or("Failed to get document")?;
    let element = document
        .get_element_by_id(container_id)
        .ok_or_else(|| format!("Failed to find container with id: {}", container_id))?;

    element
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("Element with id '{}' is not an HTML element", container_id))
}

pub fn create_canvas(container: &HtmlElement) -> Result<HtmlCanvasElement, JsValue> {
    let document = window()
        .ok_or_else(|| JsValue::from_str("Failed to get window"))?
        .document()
        .ok_or_else(|| JsValue::from_str("Failed to get document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;

    let style = canvas.style();
    style.set_property("width", "100%")?;
    style.set_property("height", "100%")?;
    style.set_property("display", "block")?;

    container.append_child(&canvas)?;
    Ok(canvas)
}

pub fn get_window_dpr() -> Result<f64, JsValue> {
    let window = window().ok_or("Failed to get window")?;
    Ok(window.device_pixel_ratio())
}

pub fn log_warn(message: &str) {
    console::warn_1(&JsValue::from_str(message));
}

pub fn log_error(message: &str) {
    console::error_1(&JsValue::from_str(message));
}

#[cfg(test)]
mod tests {
    use super::lerp;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(-4.0, 4.0, 0.5), 0.0);
    }
}
