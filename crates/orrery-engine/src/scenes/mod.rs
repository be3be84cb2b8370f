//! Complete scenes the host mounts into a canvas.

pub mod planets;
#[cfg(feature = "drive")]
pub mod drive;
#[cfg(feature = "walk")]
pub mod walk;

pub use planets::PlanetScene;
#[cfg(feature = "drive")]
pub use drive::{Car, DriveConfig, DriveControls, DriveScene, DriveTuning};
#[cfg(feature = "walk")]
pub use walk::{CameraPath, WalkConfig, WalkScene};
