//! The orbiting-planets scene.
//!
//! Per tick, in order: advance the clock, apply finished loads, apply
//! queued input, step the orbit camera, move the bodies (unless paused),
//! hit-test the pointer, advance selection transitions, then hand the
//! frame to the backend.

use std::rc::Rc;
use glam::Vec3;
use crate::api::config::SceneConfig;
use crate::api::error::{LoadError, SceneError};
use crate::api::types::{NodeId, SceneEvent};
use crate::assets::content::SceneContent;
use crate::assets::loader::{AssetLoader, LoadChannel, LoadEvent, LoadRequest};
use crate::assets::manifest::AssetManifest;
use crate::core::frame::{FrameHandle, FrameLoop, FrameScheduler, RunState};
use crate::core::graph::SceneGraph;
use crate::core::scene::{spawn_model, BodySet};
use crate::core::time::SceneClock;
use crate::input::pointer::{InteractionState, ViewportRect};
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::camera::PerspectiveCamera;
use crate::renderer::instance::RenderBuffer;
use crate::renderer::orbit::OrbitControls;
use crate::renderer::traits::RenderBackend;
use crate::systems::decor::{spawn_orbit_lines, spawn_starfield};
use crate::systems::lighting::spawn_lights;
use crate::systems::picking::hit_test;
use crate::systems::render::{build_render_buffer, dispose_nodes};
use crate::systems::selection::SelectionController;

pub struct PlanetScene<S: FrameScheduler, L: AssetLoader, R: RenderBackend> {
    config: SceneConfig,
    graph: SceneGraph,
    bodies: BodySet,
    /// Lights, starfield and orbit rings; created at mount.
    decor: Vec<NodeId>,
    sun: Option<NodeId>,
    camera: PerspectiveCamera,
    orbit: OrbitControls,
    viewport: ViewportRect,
    clock: SceneClock,
    interaction: InteractionState,
    selection: SelectionController,
    input: InputQueue,
    frames: FrameLoop<S>,
    loader: L,
    backend: R,
    loads: Rc<LoadChannel>,
    buffer: RenderBuffer,
    events: Vec<SceneEvent>,
    failures: Vec<(String, LoadError)>,
    mounted: bool,
}

impl<S: FrameScheduler, L: AssetLoader, R: RenderBackend> PlanetScene<S, L, R> {
    /// Build the scene, create decor and request every model.
    ///
    /// Fails before allocating anything if the config is invalid or the
    /// render context cannot be acquired.
    pub fn mount(
        config: SceneConfig,
        manifest: &AssetManifest,
        viewport: ViewportRect,
        scheduler: S,
        mut loader: L,
        mut backend: R,
    ) -> Result<Self, SceneError> {
        config.validate()?;
        backend.acquire_context(viewport)?;

        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut decor = spawn_lights(&mut graph, root, &config.lights);
        decor.push(spawn_starfield(&mut graph, &mut backend, root, &config.starfield));
        decor.extend(spawn_orbit_lines(
            &mut graph,
            &mut backend,
            root,
            &config.bodies,
            &config.orbit_lines,
        ));

        let loads = LoadChannel::new();
        let mut failures = Vec::new();
        let mut events = Vec::new();
        let names = config
            .sun
            .iter()
            .map(|s| s.name.clone())
            .chain(config.bodies.iter().map(|b| b.name.clone()));
        for name in names {
            match manifest.resolve(&name) {
                Some(path) => loader.begin(loads.sink(LoadRequest {
                    body: name,
                    resource: path.to_string(),
                })),
                None => {
                    log::warn!("no model for {} in manifest", name);
                    events.push(SceneEvent::BodyFailed(name.clone()));
                    failures.push((name.clone(), LoadError::NotFound(name)));
                }
            }
        }

        log::info!(
            "planet scene mounted: {} bodies, {}x{} viewport",
            config.bodies.len(),
            viewport.width,
            viewport.height
        );

        let camera = PerspectiveCamera::new(&config.camera, viewport.aspect());
        Ok(Self {
            orbit: OrbitControls::new(config.controls.clone(), &camera),
            camera,
            selection: SelectionController::new(config.selection.clone()),
            config,
            graph,
            bodies: BodySet::new(),
            decor,
            sun: None,
            viewport,
            clock: SceneClock::new(),
            interaction: InteractionState::new(),
            input: InputQueue::new(),
            frames: FrameLoop::new(scheduler),
            loader,
            backend,
            loads,
            buffer: RenderBuffer::new(),
            events,
            failures,
            mounted: true,
        })
    }

    /// Begin requesting frames. No-op if already running or unmounted.
    pub fn start(&mut self) {
        if self.mounted && self.frames.start() {
            log::debug!("planet scene running");
        }
    }

    /// Cancel every outstanding frame.
    pub fn stop(&mut self) {
        let cancelled = self.frames.stop();
        if cancelled > 0 {
            log::debug!("cancelled {} pending frame(s)", cancelled);
        }
    }

    /// Host callback for a fired frame. `now` is host time in seconds.
    /// Stale handles are ignored. A failing tick stops the loop.
    pub fn on_frame(&mut self, handle: FrameHandle, now: f64) -> Result<(), SceneError> {
        if !self.frames.begin_frame(handle) {
            return Ok(());
        }
        if let Err(e) = self.tick(now) {
            log::error!("frame failed, stopping: {}", e);
            self.stop();
            return Err(e);
        }
        self.frames.end_frame();
        Ok(())
    }

    /// Run one frame at host time `now` (seconds).
    pub fn tick(&mut self, now: f64) -> Result<(), SceneError> {
        if !self.mounted {
            return Ok(());
        }
        self.clock.advance_to(now);
        let elapsed = self.clock.elapsed();

        for event in self.loads.drain() {
            self.apply_load(event);
        }
        for event in self.input.drain() {
            self.handle_input(event);
        }
        self.orbit.update(&mut self.camera);

        // Pause comes from the previous tick's hit test.
        self.bodies
            .apply_frame(&mut self.graph, elapsed, &self.interaction);

        let hovered = match self.interaction.pointer_ndc {
            Some(ndc) => {
                let candidates = self.bodies.pick_candidates(&self.graph);
                hit_test(ndc, &self.camera, &candidates).map(|h| h.body)
            }
            None => None,
        };
        if self.interaction.set_hovered(hovered) {
            let now_hovered = self.interaction.hovered_body().map(str::to_string);
            self.events.push(SceneEvent::HoverChanged(now_hovered));
        }

        for name in self.selection.update(elapsed, &mut self.bodies) {
            self.events.push(SceneEvent::TransitionSettled(name));
        }
        self.bodies
            .set_render_order(&mut self.graph, self.selection.selected());
        self.bodies.apply_presentation(&mut self.graph);

        build_render_buffer(&self.graph, &mut self.buffer);
        self.backend.render(&self.buffer, &self.camera.uniform())
    }

    fn apply_load(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Loaded { body, content } => self.attach(body, &content),
            LoadEvent::Failed {
                body,
                resource,
                error,
            } => {
                let err = SceneError::AssetLoad {
                    body: body.clone(),
                    resource,
                    source: error.clone(),
                };
                log::warn!("{}", err);
                self.events.push(SceneEvent::BodyFailed(body.clone()));
                self.failures.push((body, error));
            }
        }
    }

    fn attach(&mut self, name: String, content: &SceneContent) {
        if let Some(sun) = self.config.sun.as_ref().filter(|s| s.name == name) {
            if let Some(old) = self.sun.take() {
                dispose_nodes(&mut self.backend, self.graph.remove_subtree(old));
            }
            let root = self.graph.root();
            let model = spawn_model(&mut self.graph, &mut self.backend, root, &name, content, None);
            if let Some(n) = self.graph.get_mut(model.root) {
                n.local.scale = Vec3::splat(sun.scale);
            }
            self.sun = Some(model.root);
            log::info!("sun loaded ({} meshes)", model.meshes.len());
            return;
        }
        let Some(spec) = self.config.body(&name).cloned() else {
            log::warn!("loaded content for unknown body {}", name);
            return;
        };
        let now = self.clock.elapsed();
        let instance = self
            .bodies
            .spawn(&mut self.graph, &mut self.backend, spec, content);
        self.selection.on_body_added(instance, now);
        log::info!("{} loaded ({} meshes)", name, content.meshes.len());
        self.events.push(SceneEvent::BodyLoaded(name));
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => {
                if let Some(ndc) = self.viewport.to_ndc(x, y) {
                    self.interaction.pointer_ndc = Some(ndc);
                }
                self.orbit.drag_to(x, y, self.viewport.height);
            }
            InputEvent::PointerDown { x, y } => {
                if let Some(ndc) = self.viewport.to_ndc(x, y) {
                    self.interaction.pointer_ndc = Some(ndc);
                }
                self.orbit.begin_drag(x, y);
            }
            InputEvent::PointerUp => self.orbit.end_drag(),
            InputEvent::PointerLeave => {
                self.interaction.pointer_ndc = None;
                self.orbit.end_drag();
            }
            InputEvent::Wheel { delta_y } => self.orbit.zoom(delta_y),
            InputEvent::Resize(rect) => self.apply_resize(rect),
            InputEvent::Select(name) => {
                if let Err(e) = self.select(name.as_deref()) {
                    log::warn!("{}", e);
                }
            }
            InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } | InputEvent::Scroll { .. } => {}
        }
    }

    fn apply_resize(&mut self, rect: ViewportRect) {
        self.viewport = rect;
        self.camera.set_aspect(rect.aspect());
        self.backend.resize(rect.width, rect.height);
    }

    /// Select a configured body (it need not have loaded yet), or clear
    /// the selection with `None`.
    pub fn select(&mut self, name: Option<&str>) -> Result<(), SceneError> {
        if let Some(n) = name {
            if self.config.body(n).is_none() {
                return Err(SceneError::UnknownBody(n.to_string()));
            }
        }
        if !self.mounted {
            return Ok(());
        }
        let now = self.clock.elapsed();
        self.selection.select(name, now, &mut self.bodies);
        Ok(())
    }

    /// Pointer moved to client coordinates. Picked up by the next tick's hit test.
    pub fn pointer_move(&mut self, client_x: f32, client_y: f32) {
        self.handle_input(InputEvent::PointerMove {
            x: client_x,
            y: client_y,
        });
    }

    pub fn pointer_leave(&mut self) {
        self.handle_input(InputEvent::PointerLeave);
    }

    /// Press at client coordinates; starts an orbit drag.
    pub fn pointer_down(&mut self, client_x: f32, client_y: f32) {
        self.handle_input(InputEvent::PointerDown {
            x: client_x,
            y: client_y,
        });
    }

    pub fn pointer_up(&mut self) {
        self.handle_input(InputEvent::PointerUp);
    }

    /// One wheel notch. The camera eases toward the new distance over the
    /// following ticks.
    pub fn wheel(&mut self, delta_y: f32) {
        self.handle_input(InputEvent::Wheel { delta_y });
    }

    pub fn resize(&mut self, rect: ViewportRect) {
        self.apply_resize(rect);
    }

    /// Queue an event for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Stop, release everything and abandon in-flight loads. Safe to call again.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop();
        self.loads.close();
        let mut released = self.bodies.remove_all(&mut self.graph, &mut self.backend);
        for id in self.decor.drain(..).chain(self.sun.take()) {
            released += dispose_nodes(&mut self.backend, self.graph.remove_subtree(id));
        }
        self.selection.clear();
        self.interaction = InteractionState::new();
        self.input.clear();
        self.mounted = false;
        log::info!("planet scene unmounted, released {} resource(s)", released);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn state(&self) -> RunState {
        self.frames.state()
    }

    pub fn hovered_body(&self) -> Option<&str> {
        self.interaction.hovered_body()
    }

    pub fn selected_body(&self) -> Option<&str> {
        self.selection.selected()
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn sun(&self) -> Option<NodeId> {
        self.sun
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.pending_count()
    }

    pub fn scheduler(&self) -> &S {
        self.frames.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.frames.scheduler_mut()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut R {
        &mut self.backend
    }

    /// Bodies whose model failed to load, with the reason.
    pub fn load_failures(&self) -> &[(String, LoadError)] {
        &self.failures
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

impl<S: FrameScheduler, L: AssetLoader, R: RenderBackend> Drop for PlanetScene<S, L, R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::loader::MemoryLoader;
    use crate::core::frame::ManualScheduler;
    use crate::renderer::headless::HeadlessRenderer;
    use crate::systems::selection::SelectionPhase;

    type TestScene = PlanetScene<ManualScheduler, MemoryLoader, HeadlessRenderer>;

    fn loader_for(manifest: &AssetManifest) -> MemoryLoader {
        manifest.models.values().fold(MemoryLoader::new(), |l, path| {
            l.with_content(path.as_str(), SceneContent::unit_sphere())
        })
    }

    fn mounted() -> TestScene {
        let manifest = AssetManifest::portfolio();
        let mut scene = PlanetScene::mount(
            SceneConfig::default(),
            &manifest,
            ViewportRect::sized(800.0, 600.0),
            ManualScheduler::new(),
            loader_for(&manifest),
            HeadlessRenderer::new(),
        )
        .unwrap();
        scene.loader_mut().flush();
        scene
    }

    #[test]
    fn bad_context_fails_mount() {
        let result = TestScene::mount(
            SceneConfig::default(),
            &AssetManifest::portfolio(),
            ViewportRect::sized(800.0, 600.0),
            ManualScheduler::new(),
            MemoryLoader::new(),
            HeadlessRenderer::unavailable("no webgl"),
        );
        assert!(matches!(result, Err(SceneError::RenderContextUnavailable(_))));
    }

    #[test]
    fn loads_apply_on_next_tick() {
        let mut scene = mounted();
        assert_eq!(scene.bodies().len(), 0);
        scene.tick(0.0).unwrap();
        assert_eq!(scene.bodies().len(), 6);
        assert!(scene.sun().is_some());
        let loaded = scene
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SceneEvent::BodyLoaded(_)))
            .count();
        assert_eq!(loaded, 6);
    }

    /// Client coordinates of a world point in the 800x600 test viewport.
    fn client_point(scene: &TestScene, world: Vec3) -> (f32, f32) {
        let clip = scene.camera().view_projection().project_point3(world);
        ((clip.x + 1.0) / 2.0 * 800.0, (1.0 - clip.y) / 2.0 * 600.0)
    }

    fn pivot_world(scene: &TestScene, body: &str) -> Vec3 {
        scene
            .bodies()
            .get(body)
            .map(|b| scene.graph().world_matrix(b.pivot).transform_point3(Vec3::ZERO))
            .unwrap_or_default()
    }

    #[test]
    fn hovering_pauses_motion() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        scene.tick(1.0).unwrap();

        let (x, y) = client_point(&scene, pivot_world(&scene, "Earth"));
        scene.pointer_move(x, y);
        scene.tick(1.0).unwrap();
        assert_eq!(scene.hovered_body(), Some("Earth"));
        assert!(scene.interaction().is_motion_paused());

        let pivot = scene.bodies().get("Earth").map(|b| b.pivot).unwrap();
        let held = scene.graph().get(pivot).map(|n| n.local.translation);
        scene.tick(1.5).unwrap();
        assert_eq!(scene.graph().get(pivot).map(|n| n.local.translation), held);

        scene.pointer_leave();
        scene.tick(1.6).unwrap();
        assert_eq!(scene.hovered_body(), None);
        assert!(scene
            .drain_events()
            .contains(&SceneEvent::HoverChanged(Some("Earth".into()))));
    }

    #[test]
    fn pointer_just_beside_a_body_misses() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        scene.tick(1.0).unwrap();

        let earth = pivot_world(&scene, "Earth");
        let camera = scene.camera();
        let right = (camera.target - camera.position).cross(Vec3::Y).normalize();
        let (x, y) = client_point(&scene, earth + right * 1.5);
        scene.pointer_move(x, y);
        scene.tick(1.0).unwrap();
        assert_eq!(scene.hovered_body(), None);
        assert!(!scene.interaction().is_motion_paused());

        let (x, y) = client_point(&scene, earth + right * 0.8);
        scene.pointer_move(x, y);
        scene.tick(1.0).unwrap();
        assert_eq!(scene.hovered_body(), Some("Earth"));
    }

    #[test]
    fn zooming_changes_hover_under_a_still_pointer() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        scene.tick(1.0).unwrap();
        let (x, y) = client_point(&scene, pivot_world(&scene, "Earth"));
        scene.pointer_move(x, y);
        scene.tick(1.0).unwrap();
        assert_eq!(scene.hovered_body(), Some("Earth"));

        let start = scene.camera().position;
        for _ in 0..10 {
            scene.push_input(InputEvent::Wheel { delta_y: -120.0 });
        }
        scene.tick(1.0).unwrap();
        let first = scene.camera().position;
        assert!(first.length() < start.length());
        assert!(!scene.orbit().is_settled());
        for _ in 0..60 {
            scene.tick(1.0).unwrap();
        }
        assert!(scene.orbit().is_settled());
        let expected = start.length() * 0.95f32.powi(10);
        assert!((scene.camera().position.length() - expected).abs() < 1e-2);
        assert_ne!(scene.hovered_body(), Some("Earth"));
    }

    #[test]
    fn drag_orbits_the_camera_around_its_target() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        let start = scene.camera().position;
        scene.pointer_down(400.0, 300.0);
        scene.pointer_move(550.0, 300.0);
        scene.pointer_up();
        scene.pointer_move(700.0, 300.0);
        for _ in 0..60 {
            scene.tick(0.0).unwrap();
        }
        let moved = scene.camera().position;
        assert!((moved - start).length() > 1.0);
        assert!((moved.length() - start.length()).abs() < 1e-2);
        assert!((moved.y - start.y).abs() < 1e-2);
        assert_eq!(scene.camera().target, Vec3::ZERO);
        let turned = scene.orbit().goal().azimuth;
        assert!((turned + std::f32::consts::TAU * 150.0 / 600.0).abs() < 1e-4);
    }

    #[test]
    fn unknown_body_rejected() {
        let mut scene = mounted();
        assert!(matches!(
            scene.select(Some("Pluto")),
            Err(SceneError::UnknownBody(_))
        ));
    }

    #[test]
    fn selection_settles_through_ticks() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        scene.select(Some("Mars")).unwrap();
        scene.tick(0.25).unwrap();
        assert_eq!(scene.selection().phase("Mars"), SelectionPhase::AnimatingToSelected);
        scene.tick(0.6).unwrap();
        assert_eq!(scene.selection().phase("Mars"), SelectionPhase::SelectedResting);
        assert!(scene
            .drain_events()
            .contains(&SceneEvent::TransitionSettled("Mars".into())));
    }

    #[test]
    fn queued_select_applies_at_tick() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        scene.push_input(InputEvent::Select(Some("Venus".into())));
        assert_eq!(scene.selected_body(), None);
        scene.tick(0.1).unwrap();
        assert_eq!(scene.selected_body(), Some("Venus"));
    }

    #[test]
    fn unmount_releases_everything_once() {
        let mut scene = mounted();
        scene.tick(0.0).unwrap();
        assert!(scene.backend().live_count() > 0);
        scene.unmount();
        scene.unmount();
        assert_eq!(scene.backend().live_count(), 0);
        assert_eq!(scene.backend().double_releases(), 0);
        assert_eq!(scene.graph().len(), 1);
    }
}
