//! Adapters that hand asset fetching and GPU work to the page.
//!
//! The page installs a global `orreryHost` object. Asset completions come
//! back through the `asset_loaded` / `asset_failed` exports keyed by the
//! request id handed to `requestAsset`.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use wasm_bindgen::prelude::*;
use orrery_engine::api::error::{LoadError, SceneError};
use orrery_engine::api::types::ResourceId;
use orrery_engine::assets::loader::{AssetLoader, LoadSink};
use orrery_engine::assets::content::SceneContent;
use orrery_engine::input::pointer::ViewportRect;
use orrery_engine::renderer::camera::CameraUniform;
use orrery_engine::renderer::instance::RenderBuffer;
use orrery_engine::renderer::traits::{RenderBackend, ResourceKind};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = orreryHost, js_name = requestAsset)]
    fn request_asset(id: u32, path: &str);

    #[wasm_bindgen(js_namespace = orreryHost, js_name = createResource)]
    fn create_resource(id: u32, kind: &str, label: &str);

    #[wasm_bindgen(js_namespace = orreryHost, js_name = disposeResource)]
    fn dispose_resource(id: u32);

    #[wasm_bindgen(js_namespace = orreryHost, js_name = hasRenderContext)]
    fn has_render_context(left: f32, top: f32, width: f32, height: f32) -> bool;

    #[wasm_bindgen(js_namespace = orreryHost, js_name = resizeViewport)]
    fn resize_viewport(width: f32, height: f32);

    #[wasm_bindgen(js_namespace = orreryHost, js_name = presentFrame)]
    fn present_frame(instances_ptr: u32, instance_count: u32, camera: &[f32]);
}

thread_local! {
    // Shared so request ids stay unique across every mounted scene.
    static NEXT_REQUEST: Cell<u32> = const { Cell::new(1) };
}

/// Loader that forwards requests to the page and holds each sink until the
/// page answers.
#[derive(Default)]
pub struct JsAssetLoader {
    pending: HashMap<u32, LoadSink>,
}

impl JsAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the page's answer for request `id`. Returns false for ids
    /// this loader never issued.
    pub fn complete(&mut self, id: u32, result: Result<SceneContent, LoadError>) -> bool {
        match self.pending.remove(&id) {
            Some(sink) => {
                sink.complete(result);
                true
            }
            None => false,
        }
    }

    pub fn owns(&self, id: u32) -> bool {
        self.pending.contains_key(&id)
    }
}

impl AssetLoader for JsAssetLoader {
    fn begin(&mut self, sink: LoadSink) {
        let id = NEXT_REQUEST.with(|n| {
            let id = n.get();
            n.set(id.wrapping_add(1));
            id
        });
        request_asset(id, &sink.request().resource);
        self.pending.insert(id, sink);
    }
}

/// Renderer that mirrors the resource ledger into the page.
#[derive(Default)]
pub struct JsRenderer {
    next: u32,
    live: HashSet<ResourceId>,
    camera: Vec<f32>,
}

impl JsRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for JsRenderer {
    fn acquire_context(&mut self, viewport: ViewportRect) -> Result<(), SceneError> {
        if has_render_context(viewport.left, viewport.top, viewport.width, viewport.height) {
            Ok(())
        } else {
            Err(SceneError::RenderContextUnavailable("page has no WebGL context".into()))
        }
    }

    fn allocate(&mut self, kind: ResourceKind, label: &str) -> ResourceId {
        let id = ResourceId(self.next);
        self.next += 1;
        create_resource(id.0, kind.as_str(), label);
        self.live.insert(id);
        id
    }

    fn release(&mut self, id: ResourceId) {
        if self.live.remove(&id) {
            dispose_resource(id.0);
        }
    }

    fn resize(&mut self, width: f32, height: f32) {
        resize_viewport(width, height);
    }

    fn render(&mut self, frame: &RenderBuffer, camera: &CameraUniform) -> Result<(), SceneError> {
        self.camera.clear();
        self.camera.extend(camera.view_projection.iter().flatten());
        self.camera.extend_from_slice(&camera.eye);
        present_frame(frame.instances_ptr() as u32, frame.instance_count(), &self.camera);
        Ok(())
    }
}
