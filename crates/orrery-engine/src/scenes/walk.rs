//! Scroll-scrubbed walking scene.
//!
//! Page scroll progress drives both the camera dolly and the target time of
//! the model's first animation clip. The clip time chases its target at
//! real-time speed in either direction.

use std::rc::Rc;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::api::error::SceneError;
use crate::api::types::NodeId;
use crate::assets::content::SceneContent;
use crate::assets::loader::{AssetLoader, LoadChannel, LoadEvent, LoadRequest};
use crate::core::frame::{FrameHandle, FrameLoop, FrameScheduler, RunState};
use crate::core::graph::SceneGraph;
use crate::core::scene::{spawn_model, SpawnedModel};
use crate::core::time::SceneClock;
use crate::extensions::easing::lerp_vec3;
use crate::input::pointer::ViewportRect;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::camera::{CameraConfig, PerspectiveCamera};
use crate::renderer::instance::RenderBuffer;
use crate::renderer::traits::RenderBackend;
use crate::systems::lighting::{spawn_lights, LightDesc};
use crate::systems::render::{build_render_buffer, dispose_nodes};

/// Straight dolly between two eye positions, always facing `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPath {
    pub from: Vec3,
    pub to: Vec3,
    pub target: Vec3,
}

impl CameraPath {
    /// Eye position at `progress`, clamped to [0, 1].
    pub fn at(&self, progress: f32) -> Vec3 {
        lerp_vec3(self.from, self.to, progress.clamp(0.0, 1.0))
    }
}

impl Default for CameraPath {
    fn default() -> Self {
        Self {
            from: Vec3::new(0.0, 10.0, 10.0),
            to: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub model: String,
    pub path: CameraPath,
    pub camera: CameraConfig,
    pub lights: Vec<LightDesc>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        let path = CameraPath::default();
        Self {
            model: "./models/walking_man.glb".into(),
            camera: CameraConfig {
                position: path.from,
                target: path.target,
                fov_y_degrees: 75.0,
                near: 0.1,
                far: 1000.0,
            },
            path,
            lights: vec![
                LightDesc::Ambient {
                    color: 0xffffff,
                    intensity: 0.8,
                },
                LightDesc::Directional {
                    color: 0xffffff,
                    intensity: 1.0,
                    position: Vec3::new(0.0, 10.0, 5.0),
                    target: Vec3::ZERO,
                },
            ],
        }
    }
}

/// Move `current` toward `target` by at most `dt`, never overshooting.
pub fn step_toward(current: f32, target: f32, dt: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= dt {
        target
    } else {
        current + delta.signum() * dt
    }
}

pub struct WalkScene<S: FrameScheduler, L: AssetLoader, R: RenderBackend> {
    config: WalkConfig,
    graph: SceneGraph,
    frames: FrameLoop<S>,
    loader: L,
    backend: R,
    loads: Rc<LoadChannel>,
    input: InputQueue,
    clock: SceneClock,
    camera: PerspectiveCamera,
    lights: Vec<NodeId>,
    model: Option<SpawnedModel>,
    progress: f32,
    /// Duration of the first clip; zero until the model arrives.
    clip_duration: f32,
    clip_time: f32,
    buffer: RenderBuffer,
    mounted: bool,
}

impl<S: FrameScheduler, L: AssetLoader, R: RenderBackend> WalkScene<S, L, R> {
    pub fn mount(
        config: WalkConfig,
        viewport: ViewportRect,
        scheduler: S,
        mut loader: L,
        mut backend: R,
    ) -> Result<Self, SceneError> {
        config.camera.validate()?;
        backend.acquire_context(viewport)?;

        let mut graph = SceneGraph::new();
        let root = graph.root();
        let lights = spawn_lights(&mut graph, root, &config.lights);

        let loads = LoadChannel::new();
        loader.begin(loads.sink(LoadRequest {
            body: "walker".into(),
            resource: config.model.clone(),
        }));

        let mut camera = PerspectiveCamera::new(&config.camera, viewport.aspect());
        camera.look_at(config.path.at(0.0), config.path.target);

        log::info!("walk scene mounted");
        Ok(Self {
            config,
            graph,
            frames: FrameLoop::new(scheduler),
            loader,
            backend,
            loads,
            input: InputQueue::new(),
            clock: SceneClock::new(),
            camera,
            lights,
            model: None,
            progress: 0.0,
            clip_duration: 0.0,
            clip_time: 0.0,
            buffer: RenderBuffer::new(),
            mounted: true,
        })
    }

    pub fn start(&mut self) {
        if self.mounted {
            self.frames.start();
        }
    }

    pub fn stop(&mut self) {
        self.frames.stop();
    }

    pub fn on_frame(&mut self, handle: FrameHandle, now: f64) -> Result<(), SceneError> {
        if !self.frames.begin_frame(handle) {
            return Ok(());
        }
        if let Err(e) = self.tick(now) {
            log::error!("walk frame failed, stopping: {}", e);
            self.stop();
            return Err(e);
        }
        self.frames.end_frame();
        Ok(())
    }

    pub fn tick(&mut self, now: f64) -> Result<(), SceneError> {
        if !self.mounted {
            return Ok(());
        }
        let dt = self.clock.advance_to(now) as f32;
        for event in self.loads.drain() {
            match event {
                LoadEvent::Loaded { content, .. } => self.attach(&content),
                LoadEvent::Failed { resource, error, .. } => {
                    log::warn!("walker model {} failed: {}", resource, error);
                }
            }
        }
        for event in self.input.drain() {
            match event {
                InputEvent::Scroll { progress } => self.set_progress(progress),
                InputEvent::Resize(rect) => self.resize(rect),
                _ => {}
            }
        }

        self.clip_time = step_toward(self.clip_time, self.target_clip_time(), dt);
        self.camera
            .look_at(self.config.path.at(self.progress), self.config.path.target);

        build_render_buffer(&self.graph, &mut self.buffer);
        self.backend.render(&self.buffer, &self.camera.uniform())
    }

    fn attach(&mut self, content: &SceneContent) {
        if let Some(old) = self.model.take() {
            dispose_nodes(&mut self.backend, self.graph.remove_subtree(old.root));
        }
        let root = self.graph.root();
        self.model = Some(spawn_model(
            &mut self.graph,
            &mut self.backend,
            root,
            "walker",
            content,
            None,
        ));
        match content.clips.first() {
            Some(clip) => {
                self.clip_duration = clip.duration.max(0.0);
                log::info!("walker attached, clip {} ({}s)", clip.name, clip.duration);
            }
            None => {
                self.clip_duration = 0.0;
                log::warn!("walker model has no animation clips");
            }
        }
        self.clip_time = self.clip_time.min(self.clip_duration);
    }

    /// Scroll progress in [0, 1]; out-of-range values are clamped.
    pub fn set_progress(&mut self, progress: f32) {
        if progress.is_finite() {
            self.progress = progress.clamp(0.0, 1.0);
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target_clip_time(&self) -> f32 {
        self.progress * self.clip_duration
    }

    pub fn clip_time(&self) -> f32 {
        self.clip_time
    }

    pub fn clip_duration(&self) -> f32 {
        self.clip_duration
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn resize(&mut self, rect: ViewportRect) {
        self.camera.set_aspect(rect.aspect());
        self.backend.resize(rect.width, rect.height);
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn state(&self) -> RunState {
        self.frames.state()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.frames.scheduler_mut()
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop();
        self.loads.close();
        let mut released = 0;
        let model = self.model.take().map(|m| m.root);
        for id in self.lights.drain(..).chain(model) {
            released += dispose_nodes(&mut self.backend, self.graph.remove_subtree(id));
        }
        self.mounted = false;
        log::info!("walk scene unmounted, released {} resource(s)", released);
    }
}

impl<S: FrameScheduler, L: AssetLoader, R: RenderBackend> Drop for WalkScene<S, L, R> {
    fn drop(&mut self) {
        self.unmount();
    }
}
