mod app_events;

pub use app_events::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Once;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::js_sys::Function;
use web_sys::{Event, EventTarget};

static INIT: Once = Once::new();
static mut GLOBAL_EVENT_SYSTEM: Option<EventSystem> = None;

pub fn get_event_system() -> &'static EventSystem {
    unsafe {
        INIT.call_once(|| {
            GLOBAL_EVENT_SYSTEM = Some(EventSystem::new());
        });
        GLOBAL_EVENT_SYSTEM.as_ref().unwrap()
    }
}

/// JS-facing listener registry keyed by event name. Single-threaded by the
/// wasm execution model; the RefCell is never held across an emit callback.
pub struct EventSystem {
    events: RefCell<HashMap<String, Vec<Function>>>,
}

impl EventSystem {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(HashMap::new()),
        }
    }

    pub fn add_listener(&self, event_name: &str, callback: &Function) {
        self.events
            .borrow_mut()
            .entry(event_name.to_string())
            .or_insert_with(Vec::new)
            .push(callback.clone());
    }

    pub fn remove_listener(&self, event_name: &str, callback: &Function) {
        if let Some(listeners) = self.events.borrow_mut().get_mut(event_name) {
            listeners.retain(|l| l != callback);
        }
    }

    pub fn emit(&self, event_name: &str, payload: &JsValue) -> Result<(), JsValue> {
        let listeners = self
            .events
            .borrow()
            .get(event_name)
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            listener.call1(&JsValue::NULL, payload)?;
        }
        Ok(())
    }
}

/// Owns every DOM listener registered by the engine, so teardown can remove
/// each exactly once. Dropping a `Closure` without removing the listener
/// would leave the DOM calling into freed wasm memory.
pub struct EventBindings {
    bindings: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
}

impl EventBindings {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn bind(
        &mut self,
        target: &EventTarget,
        name: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    ) -> Result<(), JsValue> {
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.bindings.push((target.clone(), name, closure));
        Ok(())
    }

    pub fn unbind_all(&mut self) {
        for (target, name, closure) in self.bindings.drain(..) {
            let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Drop for EventBindings {
    fn drop(&mut self) {
        self.unbind_all();
    }
}
