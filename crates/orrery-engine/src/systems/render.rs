use crate::core::graph::{Node, NodeKind, SceneGraph};
use crate::renderer::instance::{NodeInstance, RenderBuffer};
use crate::renderer::traits::RenderBackend;

fn kind_code(kind: &NodeKind) -> Option<u32> {
    match kind {
        NodeKind::Group => None,
        NodeKind::Mesh(_) => Some(NodeInstance::KIND_MESH),
        NodeKind::Points { .. } => Some(NodeInstance::KIND_POINTS),
        NodeKind::Line { .. } => Some(NodeInstance::KIND_LINE),
        NodeKind::Light(_) => Some(NodeInstance::KIND_LIGHT),
    }
}

/// Fill `buffer` with one instance per drawable node, ordered by render
/// order and then by node index.
pub fn build_render_buffer(graph: &SceneGraph, buffer: &mut RenderBuffer) {
    buffer.clear();
    for (id, node) in graph.iter() {
        let Some(kind) = kind_code(&node.kind) else {
            continue;
        };
        let world = glam::Mat4::from(graph.world_matrix(id));
        buffer.push(NodeInstance {
            node: id.0,
            geometry: node.resources.first().map_or(NodeInstance::NO_RESOURCE, |r| r.0),
            material: node.resources.get(1).map_or(NodeInstance::NO_RESOURCE, |r| r.0),
            kind,
            visible: graph.is_visible(id) as u32,
            render_order: node.render_order as u32,
            _pad: [0; 2],
            world: world.to_cols_array(),
        });
    }
    buffer.instances.sort_by_key(|i| i.render_order);
}

/// Release every resource owned by `nodes`. Returns how many were released.
pub fn dispose_nodes<R: RenderBackend>(backend: &mut R, nodes: Vec<Node>) -> usize {
    let mut released = 0;
    for node in nodes {
        for id in node.resources {
            backend.release(id);
            released += 1;
        }
    }
    released
}
