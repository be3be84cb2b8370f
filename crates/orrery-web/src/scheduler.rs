use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use orrery_engine::core::frame::{FrameHandle, FrameScheduler};

/// `requestAnimationFrame` behind the engine's scheduling port.
///
/// Each requested frame owns a closure that forwards the timestamp to
/// `on_fire`. A fired closure is still on the stack while the scene ticks,
/// so it is parked in `spent` and only dropped when the next frame fires.
pub struct RafScheduler {
    on_fire: fn(FrameHandle, f64),
    next: u64,
    live: HashMap<FrameHandle, (i32, Closure<dyn FnMut(f64)>)>,
    spent: Vec<Closure<dyn FnMut(f64)>>,
}

impl RafScheduler {
    pub fn new(on_fire: fn(FrameHandle, f64)) -> Self {
        Self {
            on_fire,
            next: 0,
            live: HashMap::new(),
            spent: Vec::new(),
        }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        let on_fire = self.on_fire;
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            on_fire(handle, timestamp_ms / 1000.0);
        }) as Box<dyn FnMut(f64)>);

        let requested = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| w.request_animation_frame(closure.as_ref().unchecked_ref::<js_sys::Function>()));
        match requested {
            Ok(id) => {
                self.live.insert(handle, (id, closure));
            }
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some((id, _closure)) = self.live.remove(&handle) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }

    fn frame_fired(&mut self, handle: FrameHandle) {
        self.spent.clear();
        if let Some((_, closure)) = self.live.remove(&handle) {
            self.spent.push(closure);
        }
    }
}
