use super::pointer::ViewportRect;

/// Input events the scenes understand.
/// The host writes events into the queue; the scene drains it once per tick.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Cursor moved to client coordinates (x, y).
    PointerMove { x: f32, y: f32 },
    /// Primary button pressed at client coordinates (x, y).
    PointerDown { x: f32, y: f32 },
    /// Primary button released.
    PointerUp,
    /// Cursor left the canvas.
    PointerLeave,
    /// One wheel notch; negative `delta_y` scrolls up.
    Wheel { delta_y: f32 },
    /// Canvas rectangle changed.
    Resize(ViewportRect),
    /// Sibling UI picked a body, or cleared the selection.
    Select(Option<String>),
    KeyDown { key_code: u32 },
    KeyUp { key_code: u32 },
    /// Page scroll progress in [0, 1].
    Scroll { progress: f32 },
}

pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events in arrival order.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_keeps_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::PointerMove { x: 10.0, y: 20.0 });
        q.push(InputEvent::Select(Some("Mars".into())));
        q.push(InputEvent::PointerLeave);
        assert_eq!(q.len(), 3);
        let events = q.drain();
        assert_eq!(events[1], InputEvent::Select(Some("Mars".into())));
        assert_eq!(events[2], InputEvent::PointerLeave);
        assert!(q.is_empty());
    }
}
