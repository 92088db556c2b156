use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::Promise;
use web_sys::{window, CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Load an image off the network without blocking the render loop. The
/// caller decides when (and whether) to upload it; a render before the load
/// completes is expected.
pub async fn load_html_image(src: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));

    let promise = Promise::new(&mut |resolve, reject| {
        image.set_onload(Some(&resolve));
        image.set_onerror(Some(&reject));
    });
    image.set_src(src);

    JsFuture::from(promise).await?;
    image.set_onload(None);
    image.set_onerror(None);
    Ok(image)
}

/// Pixel size parsed out of a CSS font spec like "bold 30px Figtree".
fn font_px(font: &str) -> f64 {
    font.split_whitespace()
        .find_map(|token| token.strip_suffix("px"))
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(30.0)
}

/// Rasterize a title into a throwaway 2d canvas sized to the measured text.
/// Returns the canvas plus its width/height aspect, ready for texture upload.
pub fn rasterize_text(
    text: &str,
    font: &str,
    color: &str,
) -> Result<(HtmlCanvasElement, f32), JsValue> {
    let document = window()
        .ok_or_else(|| JsValue::from_str("Failed to get window"))?
        .document()
        .ok_or_else(|| JsValue::from_str("Failed to get document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    let context = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Failed to get 2D context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let size = font_px(font);
    context.set_font(font);
    let text_width = context.measure_text(text)?.width();

    let padding = size * 0.5;
    canvas.set_width((text_width + padding * 2.0).ceil().max(1.0) as u32);
    canvas.set_height((size * 1.4).ceil().max(1.0) as u32);

    // resizing resets 2d state
    context.set_font(font);
    context.set_fill_style(&JsValue::from_str(color));
    context.set_text_baseline("middle");
    context.fill_text(text, padding, canvas.height() as f64 / 2.0)?;

    let aspect = canvas.width() as f32 / canvas.height() as f32;
    Ok((canvas, aspect))
}
