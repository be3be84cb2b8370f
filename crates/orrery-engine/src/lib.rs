pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod input;
pub mod assets;
pub mod extensions;
pub mod scenes;

// Re-export key types at crate root for convenience
pub use api::config::{SceneConfig, SunConfig};
pub use api::error::{LoadError, SceneError};
pub use api::types::{NodeId, ResourceId, SceneEvent};
pub use assets::{AssetLoader, AssetManifest, LoadSink, MemoryLoader, SceneContent};
pub use components::body::{BodyInstance, BodySpec, Presentation, TransformOverride};
pub use components::mesh::{Aabb, MeshComponent, PickVolume};
pub use crate::core::frame::{FrameHandle, FrameScheduler, ManualScheduler, RunState};
pub use crate::core::graph::{Node, NodeKind, SceneGraph};
pub use crate::core::time::SceneClock;
pub use input::{InputEvent, InteractionState, ViewportRect};
pub use renderer::{
    CameraConfig, HeadlessRenderer, NodeInstance, OrbitConfig, OrbitControls, PerspectiveCamera,
    RenderBackend, RenderBuffer,
};
pub use scenes::PlanetScene;
pub use systems::lighting::LightDesc;
pub use systems::motion::body_motion;
pub use systems::picking::hit_test;
pub use systems::selection::{SelectionController, SelectionPhase, SelectionTuning};

#[cfg(feature = "drive")]
pub use scenes::drive::{DriveConfig, DriveScene};
#[cfg(feature = "walk")]
pub use scenes::walk::{WalkConfig, WalkScene};

// Extensions: decoupled optional helpers
pub use extensions::{ease, lerp, lerp_vec3, Easing};
