//! Driving mini-scene: a kinematic car on a ground plane with a pressure
//! plate that opens the journey box.

use std::rc::Rc;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use crate::api::error::SceneError;
use crate::api::types::NodeId;
use crate::assets::content::SceneContent;
use crate::assets::loader::{AssetLoader, LoadChannel, LoadEvent, LoadRequest};
use crate::components::mesh::Aabb;
use crate::core::frame::{FrameHandle, FrameLoop, FrameScheduler, RunState};
use crate::core::graph::{Node, SceneGraph, Transform};
use crate::core::scene::{spawn_box, spawn_model, world_bounds, SpawnedModel};
use crate::core::time::{FixedTimestep, SceneClock};
use crate::input::pointer::ViewportRect;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::camera::{CameraConfig, PerspectiveCamera};
use crate::renderer::instance::RenderBuffer;
use crate::renderer::traits::RenderBackend;
use crate::systems::lighting::{spawn_lights, LightDesc};
use crate::systems::render::{build_render_buffer, dispose_nodes};

pub const KEY_A: u32 = 65;
pub const KEY_D: u32 = 68;
pub const KEY_S: u32 = 83;
pub const KEY_W: u32 = 87;

/// Per-step car handling. Speeds are world units per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTuning {
    pub acceleration: f32,
    pub max_speed: f32,
    /// Most negative speed while reversing.
    pub reverse_max_speed: f32,
    /// Heading change per step at full speed, radians.
    pub turn_speed: f32,
    /// Speed multiplier per step while coasting.
    pub friction: f32,
    /// Below this speed the car can't steer.
    pub steer_threshold: f32,
    pub wheel_spin_factor: f32,
    /// Car Y scale while standing on the plate.
    pub pressed_squash: f32,
}

impl Default for DriveTuning {
    fn default() -> Self {
        Self {
            acceleration: 0.005,
            max_speed: 0.2,
            reverse_max_speed: -0.1,
            turn_speed: 0.03,
            friction: 0.98,
            steer_threshold: 0.001,
            wheel_spin_factor: 10.0,
            pressed_squash: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub tuning: DriveTuning,
    pub model: String,
    /// Meshes hidden when the car model is attached.
    pub hidden_meshes: Vec<String>,
    /// Named sub-nodes spun with the car's speed.
    pub wheel_nodes: Vec<String>,
    pub car_start: Vec3,
    /// Box used for collision until the model arrives.
    pub car_fallback_size: Vec3,
    pub plate_center: Vec3,
    pub plate_size: Vec3,
    pub ground_size: Vec3,
    pub camera: CameraConfig,
    pub lights: Vec<LightDesc>,
    /// Steps per second.
    pub step_rate: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            tuning: DriveTuning::default(),
            model: "./models/mclaren-f1/scene.gltf".into(),
            hidden_meshes: vec!["Object_31".into()],
            wheel_nodes: ["WheelFL", "WheelFR", "WheelRL", "WheelRR"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            car_start: Vec3::new(0.0, 0.5, 0.0),
            car_fallback_size: Vec3::new(2.0, 1.0, 4.0),
            plate_center: Vec3::new(5.0, 0.05, 5.0),
            plate_size: Vec3::new(2.0, 0.1, 2.0),
            ground_size: Vec3::new(10.0, 0.1, 10.0),
            camera: CameraConfig {
                position: Vec3::new(0.0, 10.0, 10.0),
                fov_y_degrees: 50.0,
                ..CameraConfig::default()
            },
            lights: vec![
                LightDesc::Ambient {
                    color: 0xffffff,
                    intensity: 0.5,
                },
                LightDesc::Directional {
                    color: 0xffffff,
                    intensity: 1.0,
                    position: Vec3::new(10.0, 10.0, 10.0),
                    target: Vec3::ZERO,
                },
                LightDesc::Point {
                    color: 0xffffff,
                    intensity: 1.5,
                    range: 10.0,
                    decay: 2.0,
                    position: Vec3::new(0.0, 5.0, 0.0),
                },
                LightDesc::Spot {
                    color: 0xffffff,
                    intensity: 1.0,
                    position: Vec3::new(0.0, 15.0, 10.0),
                    target: Vec3::ZERO,
                    angle: 0.3,
                    penumbra: 0.0,
                },
            ],
            step_rate: 60.0,
        }
    }
}

/// Keys currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveControls {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl DriveControls {
    /// Apply a key transition. Returns false for keys the car ignores.
    pub fn set_key(&mut self, key_code: u32, down: bool) -> bool {
        let slot = match key_code {
            KEY_W => &mut self.forward,
            KEY_S => &mut self.back,
            KEY_A => &mut self.left,
            KEY_D => &mut self.right,
            _ => return false,
        };
        *slot = down;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub position: Vec3,
    /// Heading about +Y; 0 faces +Z.
    pub angle: f32,
    pub velocity: f32,
    /// Accumulated wheel rotation about X.
    pub wheel_spin: f32,
}

impl Car {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            angle: 0.0,
            velocity: 0.0,
            wheel_spin: 0.0,
        }
    }

    /// One fixed step of throttle, friction, steering and movement.
    pub fn step(&mut self, controls: &DriveControls, t: &DriveTuning) {
        if controls.forward {
            self.velocity = (self.velocity + t.acceleration).min(t.max_speed);
        }
        if controls.back {
            self.velocity = (self.velocity - t.acceleration).max(t.reverse_max_speed);
        }
        if !controls.forward && !controls.back {
            self.velocity *= t.friction;
        }

        if self.velocity.abs() > t.steer_threshold {
            let turn = t.turn_speed * (self.velocity / t.max_speed);
            if controls.left {
                self.angle += turn;
            }
            if controls.right {
                self.angle -= turn;
            }
        }

        self.position.x += self.angle.sin() * self.velocity;
        self.position.z += self.angle.cos() * self.velocity;
        self.wheel_spin += self.velocity * t.wheel_spin_factor;
    }
}

pub struct DriveScene<S: FrameScheduler, L: AssetLoader, R: RenderBackend> {
    config: DriveConfig,
    graph: SceneGraph,
    frames: FrameLoop<S>,
    loader: L,
    backend: R,
    loads: Rc<LoadChannel>,
    input: InputQueue,
    clock: SceneClock,
    timestep: FixedTimestep,
    camera: PerspectiveCamera,
    controls: DriveControls,
    car: Car,
    /// Carries the car's position and heading.
    car_node: NodeId,
    /// Carries the squash; parent of the loaded model.
    body_node: NodeId,
    model: Option<SpawnedModel>,
    plate: NodeId,
    statics: Vec<NodeId>,
    pressing: bool,
    journey_box: bool,
    buffer: RenderBuffer,
    mounted: bool,
}

impl<S: FrameScheduler, L: AssetLoader, R: RenderBackend> DriveScene<S, L, R> {
    pub fn mount(
        config: DriveConfig,
        viewport: ViewportRect,
        scheduler: S,
        mut loader: L,
        mut backend: R,
    ) -> Result<Self, SceneError> {
        config.camera.validate()?;
        if !(config.step_rate > 0.0) {
            return Err(SceneError::InvalidConfig("step rate must be > 0".into()));
        }
        backend.acquire_context(viewport)?;

        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut statics = spawn_lights(&mut graph, root, &config.lights);
        statics.push(spawn_box(&mut graph, &mut backend, root, "ground", Vec3::ZERO, config.ground_size));
        let plate = spawn_box(
            &mut graph,
            &mut backend,
            root,
            "pressure_plate",
            config.plate_center,
            config.plate_size,
        );
        statics.push(plate);

        let car = Car::new(config.car_start);
        let car_node = graph.insert(
            root,
            Node::group("car").with_transform(Transform::from_translation(car.position)),
        );
        let body_node = graph.insert(car_node, Node::group("car.body"));

        let loads = LoadChannel::new();
        loader.begin(loads.sink(LoadRequest {
            body: "car".into(),
            resource: config.model.clone(),
        }));

        log::info!("drive scene mounted");
        Ok(Self {
            camera: PerspectiveCamera::new(&config.camera, viewport.aspect()),
            timestep: FixedTimestep::new(1.0 / config.step_rate),
            config,
            graph,
            frames: FrameLoop::new(scheduler),
            loader,
            backend,
            loads,
            input: InputQueue::new(),
            clock: SceneClock::new(),
            controls: DriveControls::default(),
            car,
            car_node,
            body_node,
            model: None,
            plate,
            statics,
            pressing: false,
            journey_box: false,
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
            log::error!("drive frame failed, stopping: {}", e);
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
                    log::warn!("car model {} failed: {}", resource, error);
                }
            }
        }
        for event in self.input.drain() {
            match event {
                InputEvent::KeyDown { key_code } => self.key_down(key_code),
                InputEvent::KeyUp { key_code } => self.key_up(key_code),
                InputEvent::Resize(rect) => self.resize(rect),
                _ => {}
            }
        }

        for _ in 0..self.timestep.accumulate(dt) {
            self.car.step(&self.controls, &self.config.tuning);
        }
        self.sync_car(self.pressing);

        let pressing = self.car_bounds().intersects(&self.plate_bounds());
        if pressing && !self.journey_box {
            log::debug!("pressure plate pressed");
            self.journey_box = true;
        }
        if pressing != self.pressing {
            self.pressing = pressing;
            self.sync_car(pressing);
        }

        build_render_buffer(&self.graph, &mut self.buffer);
        self.backend.render(&self.buffer, &self.camera.uniform())
    }

    fn attach(&mut self, content: &SceneContent) {
        if let Some(old) = self.model.take() {
            dispose_nodes(&mut self.backend, self.graph.remove_subtree(old.root));
        }
        let model = spawn_model(
            &mut self.graph,
            &mut self.backend,
            self.body_node,
            "car.model",
            content,
            None,
        );
        let mut hidden = 0;
        for id in &model.meshes {
            if let Some(node) = self.graph.get_mut(*id) {
                if self.config.hidden_meshes.iter().any(|h| *h == node.name) {
                    node.visible = false;
                    hidden += 1;
                }
            }
        }
        log::info!("car model attached ({} meshes, {} hidden)", model.meshes.len(), hidden);
        self.model = Some(model);
    }

    fn sync_car(&mut self, pressing: bool) {
        if let Some(n) = self.graph.get_mut(self.car_node) {
            n.local.translation = self.car.position;
            n.local.rotation = Quat::from_rotation_y(self.car.angle);
        }
        let squash = if pressing { self.config.tuning.pressed_squash } else { 1.0 };
        if let Some(n) = self.graph.get_mut(self.body_node) {
            n.local.scale = Vec3::new(1.0, squash, 1.0);
        }
        let Some(model) = &self.model else {
            return;
        };
        let spin = Quat::from_rotation_x(self.car.wheel_spin);
        for wheel in &self.config.wheel_nodes {
            if let Some(id) = self.graph.find_named(model.root, wheel) {
                if let Some(n) = self.graph.get_mut(id) {
                    n.local.rotation = spin;
                }
            }
        }
    }

    /// World-space box of the car's visible meshes, or the fallback box
    /// before the model arrives.
    pub fn car_bounds(&self) -> Aabb {
        self.model
            .as_ref()
            .and_then(|m| world_bounds(&self.graph, m.root))
            .unwrap_or_else(|| {
                Aabb::from_center_half_extents(self.car.position, self.config.car_fallback_size * 0.5)
            })
    }

    pub fn plate_bounds(&self) -> Aabb {
        world_bounds(&self.graph, self.plate).unwrap_or_else(|| {
            Aabb::from_center_half_extents(self.config.plate_center, self.config.plate_size * 0.5)
        })
    }

    pub fn key_down(&mut self, key_code: u32) {
        self.controls.set_key(key_code, true);
    }

    pub fn key_up(&mut self, key_code: u32) {
        self.controls.set_key(key_code, false);
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn resize(&mut self, rect: ViewportRect) {
        self.camera.set_aspect(rect.aspect());
        self.backend.resize(rect.width, rect.height);
    }

    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    pub fn journey_box_visible(&self) -> bool {
        self.journey_box
    }

    /// Close the journey box. It reopens on the next tick if the car is
    /// still on the plate.
    pub fn dismiss_journey_box(&mut self) {
        self.journey_box = false;
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn controls(&self) -> DriveControls {
        self.controls
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

    pub fn model_root(&self) -> Option<NodeId> {
        self.model.as_ref().map(|m| m.root)
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop();
        self.loads.close();
        let mut released = 0;
        for id in self.statics.drain(..).chain(std::iter::once(self.car_node)) {
            released += dispose_nodes(&mut self.backend, self.graph.remove_subtree(id));
        }
        self.model = None;
        self.mounted = false;
        log::info!("drive scene unmounted, released {} resource(s)", released);
    }
}

impl<S: FrameScheduler, L: AssetLoader, R: RenderBackend> Drop for DriveScene<S, L, R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::content::MeshDesc;
    use crate::assets::loader::MemoryLoader;
    use crate::core::frame::ManualScheduler;
    use crate::renderer::headless::HeadlessRenderer;

    type TestDrive = DriveScene<ManualScheduler, MemoryLoader, HeadlessRenderer>;

    fn car_content() -> SceneContent {
        SceneContent {
            meshes: vec![
                MeshDesc {
                    name: "Body".into(),
                    min: Vec3::new(-1.0, -0.5, -2.0),
                    max: Vec3::new(1.0, 0.5, 2.0),
                    material: None,
                    vertex_count: 0,
                    radius: None,
                },
                MeshDesc {
                    name: "Object_31".into(),
                    min: Vec3::splat(-50.0),
                    max: Vec3::splat(50.0),
                    material: None,
                    vertex_count: 0,
                    radius: None,
                },
            ],
            nodes: vec!["WheelFL".into()],
            clips: Vec::new(),
        }
    }

    fn mounted() -> TestDrive {
        let config = DriveConfig::default();
        let loader = MemoryLoader::new().with_content(config.model.as_str(), car_content());
        let mut scene = DriveScene::mount(
            config,
            ViewportRect::sized(800.0, 600.0),
            ManualScheduler::new(),
            loader,
            HeadlessRenderer::new(),
        )
        .unwrap();
        scene.loader_mut().flush();
        scene
    }

    #[test]
    fn throttle_caps_at_max_speed() {
        let t = DriveTuning::default();
        let mut car = Car::new(Vec3::ZERO);
        let c = DriveControls {
            forward: true,
            ..DriveControls::default()
        };
        for _ in 0..100 {
            car.step(&c, &t);
        }
        assert!((car.velocity - 0.2).abs() < 1e-6);
        assert!(car.position.z > 0.0);
        assert!(car.position.x.abs() < 1e-6);
    }

    #[test]
    fn reverse_caps_and_coasting_decays() {
        let t = DriveTuning::default();
        let mut car = Car::new(Vec3::ZERO);
        let back = DriveControls {
            back: true,
            ..DriveControls::default()
        };
        for _ in 0..100 {
            car.step(&back, &t);
        }
        assert!((car.velocity + 0.1).abs() < 1e-6);
        car.step(&DriveControls::default(), &t);
        assert!((car.velocity + 0.098).abs() < 1e-6);
    }

    #[test]
    fn no_steering_when_stationary() {
        let t = DriveTuning::default();
        let mut car = Car::new(Vec3::ZERO);
        let left = DriveControls {
            left: true,
            ..DriveControls::default()
        };
        car.step(&left, &t);
        assert_eq!(car.angle, 0.0);
    }

    #[test]
    fn steering_scales_with_speed() {
        let t = DriveTuning::default();
        let mut car = Car::new(Vec3::ZERO);
        car.velocity = 0.1;
        let c = DriveControls {
            forward: true,
            right: true,
            ..DriveControls::default()
        };
        car.step(&c, &t);
        // velocity becomes 0.105 before steering
        assert!((car.angle + 0.03 * 0.105 / 0.2).abs() < 1e-6);
    }

    #[test]
    fn hidden_mesh_excluded_from_bounds() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        let b = scene.car_bounds();
        assert!(b.half_extents().x < 2.0, "{:?}", b);
        assert!(!scene.is_pressing());
    }

    #[test]
    fn driving_onto_plate_opens_journey_box() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        // Heading of 45 degrees points the car at the plate.
        scene.car.angle = std::f32::consts::FRAC_PI_4;
        scene.key_down(KEY_W);
        let mut t = 0.0;
        while !scene.is_pressing() && t < 20.0 {
            t += 1.0 / 60.0;
            scene.tick(t).unwrap();
        }
        assert!(scene.is_pressing());
        assert!(scene.journey_box_visible());
        let squash = scene.graph().get(scene.body_node).map(|n| n.local.scale.y);
        assert_eq!(squash, Some(0.9));

        scene.dismiss_journey_box();
        assert!(!scene.journey_box_visible());
    }

    #[test]
    fn keys_map_to_controls() {
        let mut c = DriveControls::default();
        assert!(c.set_key(KEY_A, true));
        assert!(!c.set_key(13, true));
        assert!(c.left);
    }

    #[test]
    fn unmount_releases_all() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        scene.unmount();
        scene.unmount();
        assert_eq!(scene.backend().live_count(), 0);
        assert_eq!(scene.backend().double_releases(), 0);
    }
}
