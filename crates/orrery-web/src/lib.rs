//! WASM bridge for the portfolio page.
//!
//! Each scene kind gets a `thread_local!` slot and a family of free
//! `#[wasm_bindgen]` exports (`scene_*`, `drive_*`, `walk_*`). Frames are
//! driven by `requestAnimationFrame`; the page only forwards input and
//! asset completions.

pub mod host;
pub mod runner;
pub mod scheduler;

use wasm_bindgen::prelude::*;
use orrery_engine::api::config::SceneConfig;
use orrery_engine::api::error::LoadError;
use orrery_engine::assets::manifest::AssetManifest;
use orrery_engine::core::frame::FrameHandle;
use orrery_engine::input::queue::InputEvent;
use orrery_engine::SceneError;
use host::{JsAssetLoader, JsRenderer};
use runner::{parse_content, to_js, viewport, SceneSlot, WebPlanetScene};
use scheduler::RafScheduler;

thread_local! {
    static PLANETS: SceneSlot<WebPlanetScene> = const { SceneSlot::new() };
}

/// Install the panic hook and console logger. Call once before mounting.
#[wasm_bindgen]
pub fn orrery_init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("orrery: initialized");
}

/// Route the page's answer for asset request `id` to whichever scene issued it.
#[wasm_bindgen]
pub fn asset_loaded(id: u32, content_json: &str) {
    deliver(id, parse_content(content_json));
}

#[wasm_bindgen]
pub fn asset_failed(id: u32, reason: &str) {
    deliver(id, Err(LoadError::Host(reason.to_string())));
}

fn deliver(id: u32, result: Result<orrery_engine::SceneContent, LoadError>) {
    let mut result = Some(result);
    let mut offer = |loader: &mut JsAssetLoader| {
        if loader.owns(id) {
            if let Some(r) = result.take() {
                loader.complete(id, r);
            }
        }
    };
    PLANETS.with(|s| s.with(|scene| offer(scene.loader_mut())));
    #[cfg(feature = "drive")]
    DRIVE.with(|s| s.with(|scene| offer(scene.loader_mut())));
    #[cfg(feature = "walk")]
    WALK.with(|s| s.with(|scene| offer(scene.loader_mut())));
    if result.is_some() {
        log::debug!("asset request {} has no live scene", id);
    }
}

// ---- Planet scene ----

fn planet_frame(handle: FrameHandle, now: f64) {
    PLANETS.with(|s| {
        s.with(|scene| {
            if let Err(e) = scene.on_frame(handle, now) {
                log::error!("planet scene stopped: {}", e);
            }
        })
    });
}

/// Mount the planet scene. Empty JSON strings select the built-in config
/// and model paths. Replaces any planet scene already mounted.
#[wasm_bindgen]
pub fn scene_mount(
    config_json: &str,
    manifest_json: &str,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
) -> Result<(), JsValue> {
    let config = if config_json.is_empty() {
        SceneConfig::default()
    } else {
        SceneConfig::from_json(config_json).map_err(to_js)?
    };
    let manifest = if manifest_json.is_empty() {
        AssetManifest::portfolio()
    } else {
        AssetManifest::from_json(manifest_json).map_err(|e| to_js(SceneError::from(e)))?
    };
    drop(PLANETS.with(SceneSlot::take));
    let scene = WebPlanetScene::mount(
        config,
        &manifest,
        viewport(left, top, width, height),
        RafScheduler::new(planet_frame),
        JsAssetLoader::new(),
        JsRenderer::new(),
    )
    .map_err(to_js)?;
    let previous = PLANETS.with(|s| s.install(scene));
    drop(previous);
    Ok(())
}

#[wasm_bindgen]
pub fn scene_start() {
    PLANETS.with(|s| s.with(|scene| scene.start()));
}

#[wasm_bindgen]
pub fn scene_stop() {
    PLANETS.with(|s| s.with(|scene| scene.stop()));
}

/// Tear the scene down. Safe to call when nothing is mounted.
#[wasm_bindgen]
pub fn scene_unmount() {
    let scene = PLANETS.with(SceneSlot::take);
    drop(scene);
}

#[wasm_bindgen]
pub fn scene_pointer_move(client_x: f32, client_y: f32) {
    PLANETS.with(|s| s.with(|scene| scene.push_input(InputEvent::PointerMove { x: client_x, y: client_y })));
}

#[wasm_bindgen]
pub fn scene_pointer_leave() {
    PLANETS.with(|s| s.with(|scene| scene.push_input(InputEvent::PointerLeave)));
}

/// Primary button down; starts an orbit drag.
#[wasm_bindgen]
pub fn scene_pointer_down(client_x: f32, client_y: f32) {
    PLANETS.with(|s| s.with(|scene| scene.push_input(InputEvent::PointerDown { x: client_x, y: client_y })));
}

#[wasm_bindgen]
pub fn scene_pointer_up() {
    PLANETS.with(|s| s.with(|scene| scene.push_input(InputEvent::PointerUp)));
}

/// One wheel notch, forwarded from the canvas `wheel` event's `deltaY`.
#[wasm_bindgen]
pub fn scene_wheel(delta_y: f32) {
    PLANETS.with(|s| s.with(|scene| scene.push_input(InputEvent::Wheel { delta_y })));
}

#[wasm_bindgen]
pub fn scene_resize(left: f32, top: f32, width: f32, height: f32) {
    let rect = viewport(left, top, width, height);
    PLANETS.with(|s| s.with(|scene| scene.push_input(InputEvent::Resize(rect))));
}

#[wasm_bindgen]
pub fn scene_select(name: Option<String>) -> Result<(), JsValue> {
    PLANETS
        .with(|s| s.with(|scene| scene.select(name.as_deref())))
        .unwrap_or(Ok(()))
        .map_err(to_js)
}

/// Name of the body under the pointer, for the overlay label.
#[wasm_bindgen]
pub fn scene_hovered_body() -> Option<String> {
    PLANETS
        .with(|s| s.with(|scene| scene.hovered_body().map(str::to_string)))
        .flatten()
}

#[wasm_bindgen]
pub fn scene_selected_body() -> Option<String> {
    PLANETS
        .with(|s| s.with(|scene| scene.selected_body().map(str::to_string)))
        .flatten()
}

/// Scene events since the last call, as a JSON array.
#[wasm_bindgen]
pub fn scene_drain_events() -> String {
    PLANETS
        .with(|s| s.with(|scene| serde_json::to_string(&scene.drain_events())))
        .and_then(Result::ok)
        .unwrap_or_else(|| "[]".to_string())
}

#[wasm_bindgen]
pub fn scene_instances_ptr() -> *const u32 {
    PLANETS
        .with(|s| s.with(|scene| scene.render_buffer().instances_ptr()))
        .unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn scene_instance_count() -> u32 {
    PLANETS
        .with(|s| s.with(|scene| scene.render_buffer().instance_count()))
        .unwrap_or(0)
}

// ---- Drive scene ----

#[cfg(feature = "drive")]
thread_local! {
    static DRIVE: SceneSlot<runner::WebDriveScene> = const { SceneSlot::new() };
}

#[cfg(feature = "drive")]
fn drive_frame(handle: FrameHandle, now: f64) {
    DRIVE.with(|s| {
        s.with(|scene| {
            if let Err(e) = scene.on_frame(handle, now) {
                log::error!("drive scene stopped: {}", e);
            }
        })
    });
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_mount(config_json: &str, left: f32, top: f32, width: f32, height: f32) -> Result<(), JsValue> {
    use orrery_engine::scenes::drive::DriveConfig;
    let config: DriveConfig = if config_json.is_empty() {
        DriveConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(|e| to_js(SceneError::from(e)))?
    };
    drop(DRIVE.with(SceneSlot::take));
    let mut scene = runner::WebDriveScene::mount(
        config,
        viewport(left, top, width, height),
        RafScheduler::new(drive_frame),
        JsAssetLoader::new(),
        JsRenderer::new(),
    )
    .map_err(to_js)?;
    scene.start();
    drop(DRIVE.with(|s| s.install(scene)));
    Ok(())
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_unmount() {
    drop(DRIVE.with(SceneSlot::take));
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_key_down(key_code: u32) {
    DRIVE.with(|s| s.with(|scene| scene.push_input(InputEvent::KeyDown { key_code })));
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_key_up(key_code: u32) {
    DRIVE.with(|s| s.with(|scene| scene.push_input(InputEvent::KeyUp { key_code })));
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_resize(left: f32, top: f32, width: f32, height: f32) {
    let rect = viewport(left, top, width, height);
    DRIVE.with(|s| s.with(|scene| scene.push_input(InputEvent::Resize(rect))));
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_journey_box_visible() -> bool {
    DRIVE
        .with(|s| s.with(|scene| scene.journey_box_visible()))
        .unwrap_or(false)
}

#[cfg(feature = "drive")]
#[wasm_bindgen]
pub fn drive_dismiss_journey_box() {
    DRIVE.with(|s| s.with(|scene| scene.dismiss_journey_box()));
}

// ---- Walk scene ----

#[cfg(feature = "walk")]
thread_local! {
    static WALK: SceneSlot<runner::WebWalkScene> = const { SceneSlot::new() };
}

#[cfg(feature = "walk")]
fn walk_frame(handle: FrameHandle, now: f64) {
    WALK.with(|s| {
        s.with(|scene| {
            if let Err(e) = scene.on_frame(handle, now) {
                log::error!("walk scene stopped: {}", e);
            }
        })
    });
}

#[cfg(feature = "walk")]
#[wasm_bindgen]
pub fn walk_mount(config_json: &str, left: f32, top: f32, width: f32, height: f32) -> Result<(), JsValue> {
    use orrery_engine::scenes::walk::WalkConfig;
    let config: WalkConfig = if config_json.is_empty() {
        WalkConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(|e| to_js(SceneError::from(e)))?
    };
    drop(WALK.with(SceneSlot::take));
    let mut scene = runner::WebWalkScene::mount(
        config,
        viewport(left, top, width, height),
        RafScheduler::new(walk_frame),
        JsAssetLoader::new(),
        JsRenderer::new(),
    )
    .map_err(to_js)?;
    scene.start();
    drop(WALK.with(|s| s.install(scene)));
    Ok(())
}

#[cfg(feature = "walk")]
#[wasm_bindgen]
pub fn walk_unmount() {
    drop(WALK.with(SceneSlot::take));
}

/// Page scroll progress in [0, 1].
#[cfg(feature = "walk")]
#[wasm_bindgen]
pub fn walk_scroll(progress: f32) {
    WALK.with(|s| s.with(|scene| scene.push_input(InputEvent::Scroll { progress })));
}

#[cfg(feature = "walk")]
#[wasm_bindgen]
pub fn walk_resize(left: f32, top: f32, width: f32, height: f32) {
    let rect = viewport(left, top, width, height);
    WALK.with(|s| s.with(|scene| scene.push_input(InputEvent::Resize(rect))));
}
