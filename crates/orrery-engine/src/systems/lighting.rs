//! Scene lights.
//!
//! Lights are created once at mount as graph nodes and removed at unmount.
//! The host reads their parameters from the node description; only their
//! world transform travels in the per-frame buffer.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::api::types::NodeId;
use crate::core::graph::{Node, NodeKind, SceneGraph, Transform};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightDesc {
    Ambient {
        color: u32,
        intensity: f32,
    },
    /// Omni light. `range` 0 means unlimited.
    Point {
        color: u32,
        intensity: f32,
        range: f32,
        decay: f32,
        position: Vec3,
    },
    /// Parallel rays from `position` toward `target`.
    Directional {
        color: u32,
        intensity: f32,
        position: Vec3,
        target: Vec3,
    },
    Spot {
        color: u32,
        intensity: f32,
        position: Vec3,
        target: Vec3,
        /// Cone half-angle in radians.
        angle: f32,
        /// Fraction of the cone that fades out, 0..1.
        penumbra: f32,
    },
}

impl LightDesc {
    pub fn kind_name(&self) -> &'static str {
        match self {
            LightDesc::Ambient { .. } => "ambient",
            LightDesc::Point { .. } => "point",
            LightDesc::Directional { .. } => "directional",
            LightDesc::Spot { .. } => "spot",
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            LightDesc::Ambient { .. } => Vec3::ZERO,
            LightDesc::Point { position, .. }
            | LightDesc::Directional { position, .. }
            | LightDesc::Spot { position, .. } => *position,
        }
    }

    pub fn rgb(&self) -> [f32; 3] {
        let color = match self {
            LightDesc::Ambient { color, .. }
            | LightDesc::Point { color, .. }
            | LightDesc::Directional { color, .. }
            | LightDesc::Spot { color, .. } => *color,
        };
        color_to_rgb(color)
    }
}

/// 0xRRGGBB to linear-ish [0, 1] channels.
pub fn color_to_rgb(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
    ]
}

/// Faint ambient, the sun's light and glow at the origin, and a spot from above.
pub fn default_rig() -> Vec<LightDesc> {
    vec![
        LightDesc::Ambient {
            color: 0xffffff,
            intensity: 0.05,
        },
        LightDesc::Point {
            color: 0xffffff,
            intensity: 5.0,
            range: 1000.0,
            decay: 1.0,
            position: Vec3::ZERO,
        },
        LightDesc::Point {
            color: 0xffa500,
            intensity: 2.0,
            range: 200.0,
            decay: 1.0,
            position: Vec3::ZERO,
        },
        LightDesc::Spot {
            color: 0xffffff,
            intensity: 1.0,
            position: Vec3::new(0.0, 50.0, 50.0),
            target: Vec3::ZERO,
            angle: std::f32::consts::FRAC_PI_4,
            penumbra: 0.5,
        },
    ]
}

/// Insert one node per light under `parent`.
pub fn spawn_lights(graph: &mut SceneGraph, parent: NodeId, lights: &[LightDesc]) -> Vec<NodeId> {
    lights
        .iter()
        .enumerate()
        .map(|(i, light)| {
            let node = Node::new(
                format!("light.{}.{}", light.kind_name(), i),
                NodeKind::Light(light.clone()),
            )
            .with_transform(Transform::from_translation(light.position()));
            graph.insert(parent, node)
        })
        .collect()
}
