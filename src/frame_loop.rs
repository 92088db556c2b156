use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::js_sys::Promise;

use crate::helper::request_animation_frame;

async fn next_frame() -> Result<(), JsValue> {
    let promise = Promise::new(&mut |resolve, _| {
        request_animation_frame(&resolve);
    });
    JsFuture::from(promise).await?;
    Ok(())
}

/// Cooperative animation-frame loop. `destroyed` is checked before and after
/// every await so a teardown mid-frame never ticks against released
/// resources; once set the loop exits without rescheduling.
pub fn start<F>(destroyed: Rc<Cell<bool>>, mut tick: F)
where
    F: FnMut() + 'static,
{
    spawn_local(async move {
        loop {
            if destroyed.get() {
                break;
            }
            if next_frame().await.is_err() {
                break;
            }
            if destroyed.get() {
                break;
            }
            tick();
        }
    });
}
