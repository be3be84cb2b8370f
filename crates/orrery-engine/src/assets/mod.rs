pub mod content;
pub mod loader;
pub mod manifest;

pub use content::{ClipDesc, MeshDesc, SceneContent};
pub use loader::{AssetLoader, LoadChannel, LoadEvent, LoadRequest, LoadSink, MemoryLoader};
pub use manifest::AssetManifest;
