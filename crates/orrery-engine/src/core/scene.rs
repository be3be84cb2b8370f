use glam::{Quat, Vec3};
use crate::api::types::NodeId;
use crate::assets::content::SceneContent;
use crate::components::body::{BodyInstance, BodySpec, Presentation};
use crate::components::mesh::{Aabb, MeshComponent};
use crate::core::graph::{Node, NodeKind, SceneGraph, Transform};
use crate::input::pointer::InteractionState;
use crate::renderer::traits::{RenderBackend, ResourceKind};
use crate::systems::motion::{body_motion, initial_position};
use crate::systems::picking::PickCandidate;
use crate::systems::render::dispose_nodes;

/// Result of attaching a loaded model to the graph.
pub struct SpawnedModel {
    pub root: NodeId,
    pub meshes: Vec<NodeId>,
}

/// Attach a loaded model under `parent`. Every mesh is recentred on its
/// local origin and gets its own geometry and material allocations.
/// Meshes tagged with `body` become pickable.
pub fn spawn_model<R: RenderBackend>(
    graph: &mut SceneGraph,
    backend: &mut R,
    parent: NodeId,
    name: &str,
    content: &SceneContent,
    body: Option<&str>,
) -> SpawnedModel {
    let root = graph.insert(parent, Node::group(name));
    let mut meshes = Vec::with_capacity(content.meshes.len());
    for desc in &content.meshes {
        let label = format!("{}/{}", name, desc.name);
        let mut component = MeshComponent::new(desc.name.as_str(), desc.bounds().centered())
            .with_material(desc.material.clone())
            .with_pick_radius(desc.radius);
        if let Some(body) = body {
            component = component.with_body(body);
        }
        let resources = vec![
            backend.allocate(ResourceKind::Geometry, &label),
            backend.allocate(ResourceKind::Material, &label),
        ];
        let node = Node::new(desc.name.as_str(), NodeKind::Mesh(component)).with_resources(resources);
        meshes.push(graph.insert(root, node));
    }
    for sub in &content.nodes {
        graph.insert(root, Node::group(sub.as_str()));
    }
    SpawnedModel { root, meshes }
}

/// A solid box mesh centred at `center`. Used for ground and props.
pub fn spawn_box<R: RenderBackend>(
    graph: &mut SceneGraph,
    backend: &mut R,
    parent: NodeId,
    name: &str,
    center: Vec3,
    size: Vec3,
) -> NodeId {
    let bounds = Aabb::from_center_half_extents(Vec3::ZERO, size * 0.5);
    let resources = vec![
        backend.allocate(ResourceKind::Geometry, name),
        backend.allocate(ResourceKind::Material, name),
    ];
    let node = Node::new(name, NodeKind::Mesh(MeshComponent::new(name, bounds)))
        .with_transform(Transform::from_translation(center))
        .with_resources(resources);
    graph.insert(parent, node)
}

/// World-space box around every visible mesh at or below `id`.
pub fn world_bounds(graph: &SceneGraph, id: NodeId) -> Option<Aabb> {
    std::iter::once(id)
        .chain(graph.descendants(id))
        .filter(|n| graph.is_visible(*n))
        .filter_map(|n| {
            let mesh = graph.get(n).and_then(Node::mesh)?;
            Some(mesh.bounds.transformed(&graph.world_matrix(n)))
        })
        .reduce(|a, b| a.union(&b))
}

/// The loaded, orbiting bodies.
pub struct BodySet {
    bodies: Vec<BodyInstance>,
}

impl BodySet {
    pub fn new() -> Self {
        Self {
            bodies: Vec::with_capacity(8),
        }
    }

    /// Build the pivot and model nodes for `spec` and add the body.
    /// A body already present under the same name is disposed first.
    pub fn spawn<R: RenderBackend>(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut R,
        spec: BodySpec,
        content: &SceneContent,
    ) -> &mut BodyInstance {
        self.remove(graph, backend, &spec.name);
        let pivot = graph.insert(graph.root(), Node::group(format!("{}.pivot", spec.name)));
        let model = spawn_model(graph, backend, pivot, &spec.name, content, Some(&spec.name));
        let instance = BodyInstance {
            presentation: Presentation::resting(&spec),
            spec,
            pivot,
            render_node: model.root,
            meshes: model.meshes,
            transform_override: None,
        };
        self.add_body(graph, instance)
    }

    /// Insert an instance whose nodes already exist. The pivot starts at
    /// `(d, 0, 0)` and the render node at the base scale.
    pub fn add_body(&mut self, graph: &mut SceneGraph, instance: BodyInstance) -> &mut BodyInstance {
        if let Some(pivot) = graph.get_mut(instance.pivot) {
            pivot.local = Transform::from_translation(initial_position(&instance.spec));
        }
        if let Some(render) = graph.get_mut(instance.render_node) {
            render.local.scale = Vec3::splat(instance.spec.base_scale);
        }
        let idx = self.bodies.len();
        self.bodies.push(instance);
        &mut self.bodies[idx]
    }

    pub fn get(&self, name: &str) -> Option<&BodyInstance> {
        self.bodies.iter().find(|b| b.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BodyInstance> {
        self.bodies.iter_mut().find(|b| b.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodyInstance> {
        self.bodies.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.bodies.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Orbital placement and spin for scene time `elapsed`. Held
    /// unchanged while motion is paused.
    pub fn apply_frame(&self, graph: &mut SceneGraph, elapsed: f64, interaction: &InteractionState) {
        if interaction.is_motion_paused() {
            return;
        }
        for body in &self.bodies {
            let m = body_motion(elapsed, &body.spec);
            if let Some(pivot) = graph.get_mut(body.pivot) {
                pivot.local.translation.x = m.position.x;
                pivot.local.translation.z = m.position.z;
            }
            if let Some(render) = graph.get_mut(body.render_node) {
                render.local.rotation = Quat::from_rotation_y(m.spin);
            }
        }
    }

    /// Push scale and lift into the graph. Touches only pivot height and
    /// render-node scale, never the orbital plane.
    pub fn apply_presentation(&self, graph: &mut SceneGraph) {
        for body in &self.bodies {
            let p = body.effective_presentation();
            if let Some(pivot) = graph.get_mut(body.pivot) {
                pivot.local.translation.y = p.vertical_offset;
            }
            if let Some(render) = graph.get_mut(body.render_node) {
                render.local.scale = Vec3::splat(p.scale);
            }
        }
    }

    /// Draw the selected body's meshes after everything else.
    pub fn set_render_order(&self, graph: &mut SceneGraph, selected: Option<&str>) {
        for body in &self.bodies {
            let order = if Some(body.name()) == selected { 1 } else { 0 };
            for mesh in &body.meshes {
                if let Some(n) = graph.get_mut(*mesh) {
                    n.render_order = order;
                }
            }
        }
    }

    /// World-space pick volumes for every visible body mesh.
    pub fn pick_candidates(&self, graph: &SceneGraph) -> Vec<PickCandidate> {
        let mut out = Vec::new();
        for body in &self.bodies {
            for id in &body.meshes {
                let Some(mesh) = graph.get(*id).and_then(Node::mesh) else {
                    continue;
                };
                if !graph.is_visible(*id) {
                    continue;
                }
                let Some(tag) = &mesh.body else {
                    continue;
                };
                out.push(PickCandidate {
                    body: tag.clone(),
                    volume: mesh.pick_volume(),
                    world: graph.world_matrix(*id),
                });
            }
        }
        out
    }

    /// Remove one body and release its resources.
    pub fn remove<R: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut R, name: &str) -> usize {
        let Some(idx) = self.bodies.iter().position(|b| b.name() == name) else {
            return 0;
        };
        let body = self.bodies.remove(idx);
        dispose_nodes(backend, graph.remove_subtree(body.pivot))
    }

    /// Remove every body and release its resources. Returns how many
    /// resources were released; a second call releases nothing.
    pub fn remove_all<R: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut R) -> usize {
        let mut released = 0;
        for body in self.bodies.drain(..) {
            released += dispose_nodes(backend, graph.remove_subtree(body.pivot));
        }
        released
    }
}

impl Default for BodySet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::mesh::PickVolume;
    use crate::renderer::headless::HeadlessRenderer;

    fn setup() -> (SceneGraph, HeadlessRenderer, BodySet) {
        let mut g = SceneGraph::new();
        let mut r = HeadlessRenderer::new();
        let mut set = BodySet::new();
        for spec in crate::components::body::portfolio_bodies() {
            set.spawn(&mut g, &mut r, spec, &SceneContent::unit_sphere());
        }
        (g, r, set)
    }

    fn pivot_pos(g: &SceneGraph, set: &BodySet, name: &str) -> Vec3 {
        set.get(name)
            .and_then(|b| g.get(b.pivot))
            .map(|n| n.local.translation)
            .unwrap_or(Vec3::NAN)
    }

    #[test]
    fn added_body_starts_at_distance() {
        let (g, _r, set) = setup();
        assert_eq!(pivot_pos(&g, &set, "Earth"), Vec3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn paused_frame_holds_transforms() {
        let (mut g, _r, set) = setup();
        let mut interaction = InteractionState::new();
        set.apply_frame(&mut g, 1.0, &interaction);
        let before = pivot_pos(&g, &set, "Mars");

        interaction.set_hovered(Some("Mars".into()));
        set.apply_frame(&mut g, 2.0, &interaction);
        assert_eq!(pivot_pos(&g, &set, "Mars"), before);
    }

    #[test]
    fn presentation_lifts_without_moving_orbit() {
        let (mut g, _r, mut set) = setup();
        set.apply_frame(&mut g, 0.7, &InteractionState::new());
        let before = pivot_pos(&g, &set, "Venus");
        if let Some(v) = set.get_mut("Venus") {
            v.presentation = Presentation {
                scale: 3.0,
                vertical_offset: 20.0,
            };
        }
        set.apply_presentation(&mut g);
        let after = pivot_pos(&g, &set, "Venus");
        assert_eq!((after.x, after.z), (before.x, before.z));
        assert!((after.y - 20.0).abs() < 1e-6);
    }

    #[test]
    fn candidates_follow_scale() {
        let (mut g, _r, mut set) = setup();
        if let Some(e) = set.get_mut("Earth") {
            e.presentation.scale = 3.0;
        }
        set.apply_presentation(&mut g);
        let c = set.pick_candidates(&g);
        assert_eq!(c.len(), 6);
        let earth = c.iter().find(|c| c.body == "Earth").unwrap();
        assert!(matches!(earth.volume, PickVolume::Sphere { radius, .. } if radius == 1.0));
        let scale = earth.world.matrix3.x_axis.length();
        assert!((scale - 3.0).abs() < 1e-5);
    }

    #[test]
    fn remove_all_is_idempotent() {
        let (mut g, mut r, mut set) = setup();
        assert_eq!(r.live_count(), 12);
        assert_eq!(set.remove_all(&mut g, &mut r), 12);
        assert_eq!(set.remove_all(&mut g, &mut r), 0);
        assert_eq!(r.live_count(), 0);
        assert_eq!(r.double_releases(), 0);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn respawn_replaces_previous() {
        let (mut g, mut r, mut set) = setup();
        set.spawn(&mut g, &mut r, BodySpec::new("Earth", 20.0, 0.3, 0.0015), &SceneContent::unit_sphere());
        assert_eq!(set.len(), 6);
        assert_eq!(r.live_count(), 12);
    }

    #[test]
    fn box_bounds_in_world() {
        let mut g = SceneGraph::new();
        let mut r = HeadlessRenderer::new();
        let root = g.root();
        let plate = spawn_box(&mut g, &mut r, root, "plate", Vec3::new(5.0, 0.05, 5.0), Vec3::new(2.0, 0.1, 2.0));
        let b = world_bounds(&g, plate).unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));
        assert!((b.min - Vec3::new(4.0, 0.0, 4.0)).length() < 1e-5);
        assert!((b.max - Vec3::new(6.0, 0.1, 6.0)).length() < 1e-5);
        assert!(world_bounds(&g, root).is_some());
        assert_eq!(r.live_count(), 2);
    }

    #[test]
    fn selected_draws_last() {
        let (mut g, _r, set) = setup();
        set.set_render_order(&mut g, Some("Mars"));
        let mars_mesh = set.get("Mars").map(|b| b.meshes[0]);
        let earth_mesh = set.get("Earth").map(|b| b.meshes[0]);
        let order = |id: Option<NodeId>| id.and_then(|i| g.get(i)).map(|n| n.render_order);
        assert_eq!(order(mars_mesh), Some(1));
        assert_eq!(order(earth_mesh), Some(0));
    }
}
