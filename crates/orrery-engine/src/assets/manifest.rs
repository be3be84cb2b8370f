use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Body name to model path. Loaded from JSON or built in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Models shipped with the portfolio site.
    pub fn portfolio() -> Self {
        let mut m = Self::new().with_model("Sun", "./models/the_sun/scene.gltf");
        for name in [
            "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune",
        ] {
            let path = format!("./models/{}/scene.gltf", name.to_lowercase());
            m = m.with_model(name, path);
        }
        m
    }

    pub fn with_model(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.models.insert(name.into(), path.into());
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.models.get(name).map(String::as_str)
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::portfolio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_paths() {
        let m = AssetManifest::portfolio();
        assert_eq!(m.resolve("Sun"), Some("./models/the_sun/scene.gltf"));
        assert_eq!(m.resolve("Earth"), Some("./models/earth/scene.gltf"));
        assert_eq!(m.resolve("Pluto"), None);
    }

    #[test]
    fn parse_manifest() {
        let json = r#"{ "models": { "Earth": "earth.glb" } }"#;
        let m = AssetManifest::from_json(json).unwrap();
        assert_eq!(m.resolve("Earth"), Some("earth.glb"));
        assert_eq!(m.models.len(), 1);
    }
}
