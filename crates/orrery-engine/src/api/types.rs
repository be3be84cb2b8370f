use serde::Serialize;

/// Index of a node in the scene-graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a GPU-side allocation owned by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

/// Notification from the scene to the host UI.
/// Drained once per frame and forwarded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum SceneEvent {
    /// The body under the pointer changed (None = nothing hovered).
    HoverChanged(Option<String>),
    /// A body's asset finished loading and the body joined the scene.
    BodyLoaded(String),
    /// A body's asset failed to load; it stays absent for this session.
    BodyFailed(String),
    /// A selection transition reached its end for this body.
    TransitionSettled(String),
}
