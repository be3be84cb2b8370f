use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::api::error::LoadError;
use crate::components::mesh::Aabb;

/// One drawable mesh inside a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub name: String,
    /// Local-space bounds as authored.
    pub min: Vec3,
    pub max: Vec3,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub vertex_count: u32,
    /// Bounding radius around the bounds centre, for round meshes.
    #[serde(default)]
    pub radius: Option<f32>,
}

impl MeshDesc {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDesc {
    pub name: String,
    /// Seconds.
    pub duration: f32,
}

/// What a model resolves to once loaded: meshes, named sub-objects and
/// animation clips. The host posts this as JSON after parsing the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneContent {
    #[serde(default)]
    pub meshes: Vec<MeshDesc>,
    /// Named non-mesh nodes (wheels, pivots) in document order.
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub clips: Vec<ClipDesc>,
}

impl SceneContent {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let content: Self =
            serde_json::from_str(json).map_err(|e| LoadError::Malformed(e.to_string()))?;
        content.validate()?;
        Ok(content)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        for mesh in &self.meshes {
            if !(mesh.min.is_finite() && mesh.max.is_finite()) {
                return Err(LoadError::Malformed(format!(
                    "mesh {} has non-finite bounds",
                    mesh.name
                )));
            }
        }
        for clip in &self.clips {
            if !(clip.duration >= 0.0) {
                return Err(LoadError::Malformed(format!(
                    "clip {} has negative duration",
                    clip.name
                )));
            }
        }
        Ok(())
    }

    /// A single unit-radius mesh. Used as stand-in content in tests.
    pub fn unit_sphere() -> Self {
        Self {
            meshes: vec![MeshDesc {
                name: "sphere".into(),
                min: Vec3::splat(-1.0),
                max: Vec3::splat(1.0),
                material: None,
                vertex_count: 0,
                radius: Some(1.0),
            }],
            nodes: Vec::new(),
            clips: Vec::new(),
        }
    }

    pub fn clip(&self, name: &str) -> Option<&ClipDesc> {
        self.clips.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_summary() {
        let json = r#"{
            "meshes": [
                { "name": "Object_4", "min": [-2, -2, -2], "max": [4, 2, 2], "material": "earth" }
            ],
            "nodes": ["wheel_fl"],
            "clips": [{ "name": "walk", "duration": 1.2 }]
        }"#;
        let c = SceneContent::from_json(json).unwrap();
        assert_eq!(c.meshes.len(), 1);
        assert_eq!(c.meshes[0].bounds().center(), Vec3::new(1.0, 0.0, 0.0));
        assert!(c.clip("walk").is_some());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            SceneContent::from_json("not json"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn negative_clip_rejected() {
        let json = r#"{ "clips": [{ "name": "x", "duration": -1 }] }"#;
        assert!(SceneContent::from_json(json).is_err());
    }
}
