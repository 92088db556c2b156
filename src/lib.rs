mod events;
mod frame_loop;
mod gallery;
mod geometry;
mod helper;
mod item;
mod renderer;
mod scene_manager;
mod scroll;
mod texture;

pub use gallery::{Gallery, GalleryOptions};
pub use item::GalleryItem;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
}
