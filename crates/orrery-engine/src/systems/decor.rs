//! Starfield and orbit rings, created once per mount.

use std::f32::consts::TAU;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::api::types::NodeId;
use crate::components::body::BodySpec;
use crate::core::graph::{DrawStyle, Node, NodeKind, SceneGraph};
use crate::renderer::traits::{RenderBackend, ResourceKind};
use super::rng::Rng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: usize,
    /// Edge length of the cube stars are scattered in, centred on the origin.
    pub spread: f32,
    pub seed: u64,
    pub color: u32,
    pub size: f32,
    pub opacity: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 500,
            spread: 400.0,
            seed: 0x5eed_0f_57a55,
            color: 0x888888,
            size: 0.5,
            opacity: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitLineConfig {
    pub segments: usize,
    pub color: u32,
    pub opacity: f32,
}

impl Default for OrbitLineConfig {
    fn default() -> Self {
        Self {
            segments: 128,
            color: 0xffffff,
            opacity: 0.2,
        }
    }
}

pub fn generate_star_positions(config: &StarfieldConfig) -> Vec<Vec3> {
    let mut rng = Rng::new(config.seed);
    (0..config.count)
        .map(|_| {
            Vec3::new(
                rng.spread(config.spread),
                rng.spread(config.spread),
                rng.spread(config.spread),
            )
        })
        .collect()
}

/// Closed circle in the XZ plane: `segments + 1` points, last equal to first.
pub fn orbit_circle(radius: f32, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|i| {
            let a = if i == segments { 0.0 } else { i as f32 / segments as f32 * TAU };
            Vec3::new(a.cos() * radius, 0.0, a.sin() * radius)
        })
        .collect()
}

fn allocate_pair<R: RenderBackend>(backend: &mut R, label: &str) -> Vec<crate::api::types::ResourceId> {
    vec![
        backend.allocate(ResourceKind::Geometry, label),
        backend.allocate(ResourceKind::Material, label),
    ]
}

pub fn spawn_starfield<R: RenderBackend>(
    graph: &mut SceneGraph,
    backend: &mut R,
    parent: NodeId,
    config: &StarfieldConfig,
) -> NodeId {
    let label = "starfield";
    let node = Node::new(
        label,
        NodeKind::Points {
            positions: generate_star_positions(config),
            style: DrawStyle {
                color: config.color,
                opacity: config.opacity,
                size: config.size,
            },
        },
    )
    .with_resources(allocate_pair(backend, label));
    graph.insert(parent, node)
}

/// One ring per body at its orbital distance.
pub fn spawn_orbit_lines<R: RenderBackend>(
    graph: &mut SceneGraph,
    backend: &mut R,
    parent: NodeId,
    bodies: &[BodySpec],
    config: &OrbitLineConfig,
) -> Vec<NodeId> {
    bodies
        .iter()
        .map(|spec| {
            let label = format!("orbit.{}", spec.name);
            let node = Node::new(
                label.as_str(),
                NodeKind::Line {
                    points: orbit_circle(spec.orbital_distance, config.segments),
                    style: DrawStyle {
                        color: config.color,
                        opacity: config.opacity,
                        size: 1.0,
                    },
                },
            )
            .with_resources(allocate_pair(backend, &label));
            graph.insert(parent, node)
        })
        .collect()
}
