pub mod frame;
pub mod graph;
pub mod scene;
pub mod time;

pub use frame::{FrameHandle, FrameLoop, FrameScheduler, FrameTracker, ManualScheduler, RunState};
pub use graph::{Node, NodeKind, SceneGraph, Transform};
pub use scene::BodySet;
pub use time::SceneClock;
