use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use crate::api::error::SceneError;
use crate::components::body::{portfolio_bodies, BodySpec};
use crate::renderer::camera::CameraConfig;
use crate::renderer::orbit::OrbitConfig;
use crate::systems::decor::{OrbitLineConfig, StarfieldConfig};
use crate::systems::lighting::{default_rig, LightDesc};
use crate::systems::selection::SelectionTuning;

/// The static body at the scene origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunConfig {
    /// Key into the asset manifest.
    pub name: String,
    /// Uniform model scale.
    pub scale: f32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            name: "Sun".to_string(),
            scale: 6.0,
        }
    }
}

/// Configuration for the planet scene, provided by the host page.
/// Every field falls back to the portfolio's values when omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Orbiting, pickable bodies.
    pub bodies: Vec<BodySpec>,
    /// Static sun model; `None` leaves the origin empty.
    pub sun: Option<SunConfig>,
    pub camera: CameraConfig,
    /// Drag and wheel camera controls.
    pub controls: OrbitConfig,
    /// Lights created once at mount.
    pub lights: Vec<LightDesc>,
    pub starfield: StarfieldConfig,
    pub orbit_lines: OrbitLineConfig,
    pub selection: SelectionTuning,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bodies: portfolio_bodies(),
            sun: Some(SunConfig::default()),
            camera: CameraConfig::default(),
            controls: OrbitConfig::default(),
            lights: default_rig(),
            starfield: StarfieldConfig::default(),
            orbit_lines: OrbitLineConfig::default(),
            selection: SelectionTuning::default(),
        }
    }
}

impl SceneConfig {
    /// Parse a config from a JSON string. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a body spec by name.
    pub fn body(&self, name: &str) -> Option<&BodySpec> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Reject configs the scene cannot honour.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen = HashSet::with_capacity(self.bodies.len());
        for body in &self.bodies {
            if body.name.is_empty() {
                return Err(SceneError::InvalidConfig("body with empty name".into()));
            }
            if !seen.insert(body.name.as_str()) {
                return Err(SceneError::InvalidConfig(format!(
                    "duplicate body name: {}",
                    body.name
                )));
            }
            if !(body.orbital_distance > 0.0) {
                return Err(SceneError::InvalidConfig(format!(
                    "{}: orbital distance must be > 0, got {}",
                    body.name, body.orbital_distance
                )));
            }
            if !(body.base_scale > 0.0) {
                return Err(SceneError::InvalidConfig(format!(
                    "{}: base scale must be > 0, got {}",
                    body.name, body.base_scale
                )));
            }
            if !body.orbital_angular_speed.is_finite() || !body.self_rotation_speed.is_finite() {
                return Err(SceneError::InvalidConfig(format!(
                    "{}: speeds must be finite",
                    body.name
                )));
            }
        }
        if let Some(sun) = &self.sun {
            if seen.contains(sun.name.as_str()) {
                return Err(SceneError::InvalidConfig(format!(
                    "sun name collides with a body: {}",
                    sun.name
                )));
            }
            if !(sun.scale > 0.0) {
                return Err(SceneError::InvalidConfig("sun scale must be > 0".into()));
            }
        }
        if !(self.selection.duration > 0.0) {
            return Err(SceneError::InvalidConfig(
                "selection duration must be > 0".into(),
            ));
        }
        if self.orbit_lines.segments < 3 {
            return Err(SceneError::InvalidConfig(
                "orbit lines need at least 3 segments".into(),
            ));
        }
        self.controls.validate()?;
        self.camera.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bodies.len(), 6);
        assert!(config.body("Earth").is_some());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "bodies": [
                { "name": "Earth", "orbital_distance": 20.0,
                  "orbital_angular_speed": 0.3, "self_rotation_speed": 0.0015 }
            ]
        }"#;
        let config = SceneConfig::from_json(json).unwrap();
        assert_eq!(config.bodies.len(), 1);
        assert_eq!(config.bodies[0].base_scale, 1.0);
        assert_eq!(config.selection, SelectionTuning::default());
        assert_eq!(config.starfield.count, 500);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut config = SceneConfig::default();
        let earth = config.bodies[2].clone();
        config.bodies.push(earth);
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_distance_rejected() {
        let mut config = SceneConfig::default();
        config.bodies[0].orbital_distance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = SceneConfig::from_json("{ bodies: ").unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }
}
