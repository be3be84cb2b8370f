//! Render backend contract.
//!
//! The scene never rasterises. It owns a ledger of backend allocations and
//! hands the backend one transform buffer per frame. In the browser the
//! backend forwards to the host page's WebGL renderer; in tests it is the
//! recording [`HeadlessRenderer`](super::headless::HeadlessRenderer).

use crate::api::error::SceneError;
use crate::api::types::ResourceId;
use crate::input::pointer::ViewportRect;
use super::camera::CameraUniform;
use super::instance::RenderBuffer;

/// What a backend allocation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Vertex/index buffers.
    Geometry,
    /// Shader parameters and textures.
    Material,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Geometry => "geometry",
            ResourceKind::Material => "material",
        }
    }
}

pub trait RenderBackend {
    /// Obtain the drawing surface. Failure is fatal for the mount.
    fn acquire_context(&mut self, viewport: ViewportRect) -> Result<(), SceneError>;

    /// Allocate a resource. `label` names the owning node for debugging.
    fn allocate(&mut self, kind: ResourceKind, label: &str) -> ResourceId;

    /// Free a resource. Called at most once per id by the scene.
    fn release(&mut self, id: ResourceId);

    /// Viewport size changed.
    fn resize(&mut self, width: f32, height: f32);

    /// Present one frame.
    fn render(&mut self, frame: &RenderBuffer, camera: &CameraUniform) -> Result<(), SceneError>;
}
