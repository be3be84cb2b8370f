use glam::Vec2;

/// Canvas rectangle in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Width over height, 1 for a degenerate rect.
    pub fn aspect(&self) -> f32 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Client coordinates to normalized device coordinates, +Y up.
    /// Points outside the rect map outside [-1, 1]. Returns `None` for a
    /// zero-sized rect.
    pub fn to_ndc(&self, client_x: f32, client_y: f32) -> Option<Vec2> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        Some(Vec2::new(
            (client_x - self.left) / self.width * 2.0 - 1.0,
            -(client_y - self.top) / self.height * 2.0 + 1.0,
        ))
    }
}

/// Pointer state shared by the hit test and the motion model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    /// Last pointer position; `None` until the first move or after the
    /// pointer leaves the canvas.
    pub pointer_ndc: Option<Vec2>,
    hovered_body: Option<String>,
    motion_paused: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered_body(&self) -> Option<&str> {
        self.hovered_body.as_deref()
    }

    /// Motion is paused exactly while something is hovered.
    pub fn is_motion_paused(&self) -> bool {
        self.motion_paused
    }

    /// Record this tick's hit. Returns true when the hovered body changed.
    pub fn set_hovered(&mut self, hovered: Option<String>) -> bool {
        let changed = self.hovered_body != hovered;
        self.hovered_body = hovered;
        self.motion_paused = self.hovered_body.is_some();
        changed
    }
}
