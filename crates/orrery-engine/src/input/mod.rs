pub mod pointer;
pub mod queue;

pub use pointer::{InteractionState, ViewportRect};
pub use queue::{InputEvent, InputQueue};
