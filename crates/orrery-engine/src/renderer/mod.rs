pub mod camera;
pub mod headless;
pub mod instance;
pub mod orbit;
pub mod traits;

pub use camera::{CameraConfig, CameraUniform, PerspectiveCamera, Ray};
pub use headless::HeadlessRenderer;
pub use instance::{NodeInstance, RenderBuffer};
pub use orbit::{OrbitConfig, OrbitControls, Spherical};
pub use traits::{RenderBackend, ResourceKind};
