use std::cell::RefCell;
use wasm_bindgen::JsValue;
use orrery_engine::api::error::{LoadError, SceneError};
use orrery_engine::assets::content::SceneContent;
use orrery_engine::input::pointer::ViewportRect;
use orrery_engine::scenes::planets::PlanetScene;
use crate::host::{JsAssetLoader, JsRenderer};
use crate::scheduler::RafScheduler;

pub type WebPlanetScene = PlanetScene<RafScheduler, JsAssetLoader, JsRenderer>;
#[cfg(feature = "drive")]
pub type WebDriveScene = orrery_engine::scenes::drive::DriveScene<RafScheduler, JsAssetLoader, JsRenderer>;
#[cfg(feature = "walk")]
pub type WebWalkScene = orrery_engine::scenes::walk::WalkScene<RafScheduler, JsAssetLoader, JsRenderer>;

/// Storage for one mounted scene.
///
/// wasm-bindgen cannot export generic structs, so each scene kind lives in
/// a `thread_local!` slot and the exports borrow it for the length of one
/// call.
pub struct SceneSlot<T> {
    scene: RefCell<Option<T>>,
}

impl<T> SceneSlot<T> {
    pub const fn new() -> Self {
        Self {
            scene: RefCell::new(None),
        }
    }

    /// Install `scene`, returning whatever was mounted before. The caller
    /// drops the old scene outside the borrow.
    pub fn install(&self, scene: T) -> Option<T> {
        self.scene.borrow_mut().replace(scene)
    }

    pub fn take(&self) -> Option<T> {
        self.scene.borrow_mut().take()
    }

    /// Run `f` against the mounted scene. Returns None when nothing is
    /// mounted or the slot is already borrowed further up the stack.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut borrow = self.scene.try_borrow_mut().ok()?;
        borrow.as_mut().map(f)
    }
}

pub fn to_js(err: SceneError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub fn viewport(left: f32, top: f32, width: f32, height: f32) -> ViewportRect {
    ViewportRect::new(left, top, width, height)
}

/// Parse the page's JSON summary of a loaded model.
pub fn parse_content(json: &str) -> Result<SceneContent, LoadError> {
    let content = SceneContent::from_json(json)?;
    content.validate()?;
    Ok(content)
}
