//! Orbit camera controls: drag to swing the eye around the target, wheel to
//! dolly toward it. Input moves a goal position; `update` eases the camera
//! toward the goal once per tick.

use std::f32::consts::{PI, TAU};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use super::camera::PerspectiveCamera;
use crate::api::error::SceneError;

/// Keeps the eye off the poles, where look-at with +Y up degenerates.
const POLAR_EPS: f32 = 1e-6;
/// Remaining distance to the goal below which damping snaps.
const SETTLED: f32 = 1e-5;
/// Distance scale of one wheel notch at zoom speed 1.
const NOTCH_SCALE: f32 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enabled: bool,
    pub enable_damping: bool,
    /// Share of the remaining way to the goal covered per update.
    pub damping_factor: f32,
    pub enable_zoom: bool,
    /// 1.0 turns the view once per viewport-height of drag.
    pub rotate_speed: f32,
    /// Each wheel notch scales the distance by `0.95^zoom_speed`.
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar limits in radians from +Y.
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_damping: true,
            damping_factor: 0.25,
            enable_zoom: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 5.0,
            max_distance: 500.0,
            min_polar: 0.0,
            max_polar: PI,
        }
    }
}

impl OrbitConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(SceneError::InvalidConfig(format!(
                "orbit damping factor must be in (0, 1], got {}",
                self.damping_factor
            )));
        }
        if !(self.min_distance > 0.0 && self.max_distance >= self.min_distance) {
            return Err(SceneError::InvalidConfig(format!(
                "orbit distance limits must satisfy 0 < min <= max, got {} / {}",
                self.min_distance, self.max_distance
            )));
        }
        if !(self.min_polar >= 0.0 && self.max_polar <= PI && self.min_polar <= self.max_polar) {
            return Err(SceneError::InvalidConfig(format!(
                "orbit polar limits must lie in [0, pi], got {} / {}",
                self.min_polar, self.max_polar
            )));
        }
        if !self.rotate_speed.is_finite() || !self.zoom_speed.is_finite() {
            return Err(SceneError::InvalidConfig("orbit speeds must be finite".into()));
        }
        Ok(())
    }
}

/// Eye offset from the target in spherical coordinates.
/// `azimuth` is measured around +Y from +Z toward +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub polar: f32,
    pub azimuth: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < 1e-12 {
            return Self {
                radius: 0.0,
                polar: 0.0,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let ring = self.polar.sin() * self.radius;
        Vec3::new(
            ring * self.azimuth.sin(),
            self.polar.cos() * self.radius,
            ring * self.azimuth.cos(),
        )
    }

    fn approach(self, goal: Self, factor: f32) -> Self {
        let step = |from: f32, to: f32| {
            if (to - from).abs() < SETTLED {
                to
            } else {
                from + (to - from) * factor
            }
        };
        Self {
            radius: step(self.radius, goal.radius),
            polar: step(self.polar, goal.polar),
            azimuth: step(self.azimuth, goal.azimuth),
        }
    }
}

pub struct OrbitControls {
    config: OrbitConfig,
    target: Vec3,
    current: Spherical,
    goal: Spherical,
    drag_from: Option<Vec2>,
    /// The camera has not been written since `current` last changed.
    stale: bool,
}

impl OrbitControls {
    /// Start from the camera's present placement.
    pub fn new(config: OrbitConfig, camera: &PerspectiveCamera) -> Self {
        let start = Spherical::from_offset(camera.position - camera.target);
        let mut controls = Self {
            config,
            target: camera.target,
            current: start,
            goal: start,
            drag_from: None,
            stale: false,
        };
        let clamped = controls.clamp(start);
        if clamped != start {
            controls.current = clamped;
            controls.goal = clamped;
            controls.stale = true;
        }
        controls
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Where the camera is now.
    pub fn spherical(&self) -> Spherical {
        self.current
    }

    /// Where the camera is heading.
    pub fn goal(&self) -> Spherical {
        self.goal
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.current.to_offset()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.goal
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        if self.config.enabled {
            self.drag_from = Some(Vec2::new(x, y));
        }
    }

    /// Continue a drag to client position (x, y). Returns false when no drag
    /// is in progress.
    pub fn drag_to(&mut self, x: f32, y: f32, viewport_height: f32) -> bool {
        let Some(from) = self.drag_from else {
            return false;
        };
        let to = Vec2::new(x, y);
        self.drag_from = Some(to);
        if viewport_height > 0.0 {
            let delta = (to - from) * TAU * self.config.rotate_speed / viewport_height;
            self.rotate(delta.x, delta.y);
        }
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }

    /// Swing the goal by `left` radians around +Y and `up` radians toward
    /// the upper pole. Dragging right or down produces positive values.
    pub fn rotate(&mut self, left: f32, up: f32) {
        if !self.config.enabled || !left.is_finite() || !up.is_finite() {
            return;
        }
        let mut goal = self.goal;
        goal.azimuth -= left;
        goal.polar -= up;
        self.goal = self.clamp(goal);
    }

    /// One wheel notch. Negative `delta_y` (wheel up) moves closer.
    pub fn zoom(&mut self, delta_y: f32) {
        if !self.config.enabled || !self.config.enable_zoom {
            return;
        }
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let scale = NOTCH_SCALE.powf(self.config.zoom_speed);
        let mut goal = self.goal;
        goal.radius = if delta_y < 0.0 {
            goal.radius * scale
        } else {
            goal.radius / scale
        };
        self.goal = self.clamp(goal);
    }

    /// Step toward the goal and place the camera. Returns whether the
    /// camera was moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let next = if self.config.enable_damping {
            self.current.approach(self.goal, self.config.damping_factor)
        } else {
            self.goal
        };
        if next == self.current && !self.stale {
            return false;
        }
        self.current = next;
        self.stale = false;
        camera.look_at(self.eye(), self.target);
        true
    }

    fn clamp(&self, s: Spherical) -> Spherical {
        let lo = self.config.min_polar.max(POLAR_EPS);
        let hi = self.config.max_polar.min(PI - POLAR_EPS).max(lo);
        Spherical {
            radius: s
                .radius
                .clamp(self.config.min_distance, self.config.max_distance),
            polar: s.polar.clamp(lo, hi),
            azimuth: s.azimuth,
        }
    }
}
