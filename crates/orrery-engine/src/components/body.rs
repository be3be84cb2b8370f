use serde::{Deserialize, Serialize};
use crate::api::types::NodeId;

/// Static description of one orbiting body. Fixed for the life of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    /// Unique name; also the key into the asset manifest and the label shown on hover.
    pub name: String,
    /// Orbit radius in world units.
    pub orbital_distance: f32,
    /// Orbits per second.
    pub orbital_angular_speed: f32,
    /// Radians of self-rotation per second.
    pub self_rotation_speed: f32,
    /// Uniform model scale at rest.
    #[serde(default = "default_base_scale")]
    pub base_scale: f32,
}

fn default_base_scale() -> f32 {
    1.0
}

impl BodySpec {
    pub fn new(
        name: impl Into<String>,
        orbital_distance: f32,
        orbital_angular_speed: f32,
        self_rotation_speed: f32,
    ) -> Self {
        Self {
            name: name.into(),
            orbital_distance,
            orbital_angular_speed,
            self_rotation_speed,
            base_scale: 1.0,
        }
    }

    pub fn with_base_scale(mut self, base_scale: f32) -> Self {
        self.base_scale = base_scale;
        self
    }
}

/// The planets shown on the portfolio's "next steps" page.
pub fn portfolio_bodies() -> Vec<BodySpec> {
    vec![
        BodySpec::new("Mercury", 12.0, 0.5, 0.002),
        BodySpec::new("Venus", 16.0, 0.4, 0.0017),
        BodySpec::new("Earth", 20.0, 0.3, 0.0015),
        BodySpec::new("Mars", 24.0, 0.25, 0.0012),
        BodySpec::new("Jupiter", 30.0, 0.2, 0.0007),
        BodySpec::new("Neptune", 36.0, 0.05, 0.0004),
    ]
}

/// Scale and lift applied on top of the orbital placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    /// Uniform scale of the render node.
    pub scale: f32,
    /// Height of the pivot above the orbital plane.
    pub vertical_offset: f32,
}

impl Presentation {
    pub fn resting(spec: &BodySpec) -> Self {
        Self {
            scale: spec.base_scale,
            vertical_offset: 0.0,
        }
    }
}

/// Interpolated values while a hover/selection transition is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOverride {
    pub scale: f32,
    pub vertical_offset: f32,
    /// Linear progress in [0, 1].
    pub progress: f32,
}

/// A loaded body living in the scene graph.
#[derive(Debug, Clone)]
pub struct BodyInstance {
    pub spec: BodySpec,
    /// Orbital placement; parent of `render_node`.
    pub pivot: NodeId,
    /// Root of the loaded model. Carries self-rotation and scale.
    pub render_node: NodeId,
    /// Pickable mesh nodes under `render_node`.
    pub meshes: Vec<NodeId>,
    /// Where the body rests when no transition is running.
    pub presentation: Presentation,
    /// Present only while a transition is running.
    pub transform_override: Option<TransformOverride>,
}

impl BodyInstance {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Presentation to draw this frame: the override if one is running.
    pub fn effective_presentation(&self) -> Presentation {
        match self.transform_override {
            Some(o) => Presentation {
                scale: o.scale,
                vertical_offset: o.vertical_offset,
            },
            None => self.presentation,
        }
    }
}
