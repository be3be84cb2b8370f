use thiserror::Error;

/// Why a single asset could not be turned into scene content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("malformed content: {0}")]
    Malformed(String),

    /// Failure reported by the host loader, passed through verbatim.
    #[error("{0}")]
    Host(String),
}

/// Scene-level errors.
///
/// Only `RenderContextUnavailable` is fatal; asset failures are recorded and
/// logged while the scene keeps running with whatever did load.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to load asset for {body} ({resource}): {source}")]
    AssetLoad {
        body: String,
        resource: String,
        #[source]
        source: LoadError,
    },

    #[error("render context unavailable: {0}")]
    RenderContextUnavailable(String),

    #[error("unknown body: {0}")]
    UnknownBody(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SceneError {
    /// Whether the error must abort the scene.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SceneError::RenderContextUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_failure_is_not_fatal() {
        let err = SceneError::AssetLoad {
            body: "Mars".into(),
            resource: "./models/mars/scene.gltf".into(),
            source: LoadError::NotFound("./models/mars/scene.gltf".into()),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("Mars"));
    }

    #[test]
    fn context_loss_is_fatal() {
        assert!(SceneError::RenderContextUnavailable("webgl".into()).is_fatal());
    }
}
