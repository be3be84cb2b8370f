//! Arena scene graph.
//!
//! Nodes live in a `Vec<Option<Node>>` addressed by [`NodeId`]. Removing a
//! node leaves a hole; ids are never reused within a graph, so a stale id
//! simply resolves to `None`.

use glam::{Affine3A, Quat, Vec3};
use crate::api::types::{NodeId, ResourceId};
use crate::components::mesh::MeshComponent;
use crate::systems::lighting::LightDesc;

/// Local transform relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Flat colour for unlit decor (points and lines).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: u32,
    pub opacity: f32,
    /// Point size; unused for lines.
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshComponent),
    Light(LightDesc),
    Points { positions: Vec<Vec3>, style: DrawStyle },
    Line { points: Vec<Vec3>, style: DrawStyle },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Transform,
    pub kind: NodeKind,
    pub visible: bool,
    /// Higher draws later.
    pub render_order: u8,
    /// Backend allocations owned by this node, released when it is disposed.
    pub resources: Vec<ResourceId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local: Transform::default(),
            kind,
            visible: true,
            render_order: 0,
            resources: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn with_resources(mut self, resources: Vec<ResourceId>) -> Self {
        self.resources = resources;
        self
    }

    pub fn mesh(&self) -> Option<&MeshComponent> {
        match &self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }
}

pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::group("root"))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Attach `node` under `parent`. A parent that no longer exists falls
    /// back to the root.
    pub fn insert(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent = if self.contains(parent) {
            parent
        } else {
            log::warn!("insert under missing node {:?}, using root", parent);
            self.root
        };
        let id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(Some(node));
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(|n| n.as_mut())
    }

    /// Detach and remove `id` and everything below it, returning the removed
    /// nodes parent-first. The root cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<Node> {
        if id == self.root || !self.contains(id) {
            return Vec::new();
        }
        let parent = self.get(id).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        let mut order = vec![id];
        order.extend(self.descendants(id));
        order
            .into_iter()
            .filter_map(|n| self.nodes.get_mut(n.index()).and_then(Option::take))
            .collect()
    }

    /// Every node below `id`, depth-first, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(id) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if let Some(n) = self.get(next) {
                out.push(next);
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Parent-chain product of local transforms.
    pub fn world_matrix(&self, id: NodeId) -> Affine3A {
        let mut m = Affine3A::IDENTITY;
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            match self.get(c) {
                Some(n) => {
                    m = n.local.matrix() * m;
                    cursor = n.parent;
                }
                None => break,
            }
        }
        m
    }

    /// Visible unless the node or an ancestor is hidden.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            match self.get(c) {
                Some(n) if !n.visible => return false,
                Some(n) => cursor = n.parent,
                None => return false,
            }
        }
        true
    }

    /// Live nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Find the first node named `name` at or below `under`.
    pub fn find_named(&self, under: NodeId, name: &str) -> Option<NodeId> {
        if self.get(under)?.name == name {
            return Some(under);
        }
        self.descendants(under)
            .into_iter()
            .find(|id| self.get(*id).map_or(false, |n| n.name == name))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_links_parent_and_child() {
        let mut g = SceneGraph::new();
        let a = g.insert(g.root(), Node::group("a"));
        let b = g.insert(a, Node::group("b"));
        assert_eq!(g.get(b).and_then(|n| n.parent), Some(a));
        assert_eq!(g.get(a).map(|n| n.children.clone()), Some(vec![b]));
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut g = SceneGraph::new();
        let pivot = g.insert(
            g.root(),
            Node::group("pivot").with_transform(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        );
        let child = g.insert(
            pivot,
            Node::group("child").with_transform(Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
        );
        let p = g.world_matrix(child).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn remove_subtree_takes_all_descendants() {
        let mut g = SceneGraph::new();
        let a = g.insert(g.root(), Node::group("a"));
        let b = g.insert(a, Node::group("b"));
        g.insert(b, Node::group("c"));
        let keep = g.insert(g.root(), Node::group("keep"));

        let removed = g.remove_subtree(a);
        let names: Vec<_> = removed.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(g.get(a).is_none());
        assert!(g.get(keep).is_some());
        assert_eq!(g.get(g.root()).map(|n| n.children.clone()), Some(vec![keep]));

        // Second removal is a no-op.
        assert!(g.remove_subtree(a).is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut g = SceneGraph::new();
        let a = g.insert(g.root(), Node::group("a"));
        g.remove_subtree(a);
        let b = g.insert(g.root(), Node::group("b"));
        assert_ne!(a, b);
        assert!(g.get(a).is_none());
    }

    #[test]
    fn hidden_ancestor_hides_child() {
        let mut g = SceneGraph::new();
        let a = g.insert(g.root(), Node::group("a"));
        let b = g.insert(a, Node::group("b"));
        assert!(g.is_visible(b));
        if let Some(n) = g.get_mut(a) {
            n.visible = false;
        }
        assert!(!g.is_visible(b));
    }

    #[test]
    fn find_named_searches_subtree() {
        let mut g = SceneGraph::new();
        let a = g.insert(g.root(), Node::group("car"));
        let w = g.insert(a, Node::group("wheel_fl"));
        assert_eq!(g.find_named(g.root(), "wheel_fl"), Some(w));
        assert_eq!(g.find_named(w, "car"), None);
    }
}
