// extensions/easing.rs
//
// Easing curves for selection transitions and camera moves.
// Pure math, no scene state.

use std::f32::consts::PI;
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    /// Symmetric ease-in-out quadratic.
    #[default]
    QuadInOut,
    CubicInOut,
    SineInOut,
}

impl Easing {
    /// Eased value for `t` clamped to [0, 1]. Every curve maps 0 to 0 and
    /// 1 to 1 exactly.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::SineInOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    -((PI * t).cos() - 1.0) / 2.0
                }
            }
        }
    }
}

/// Linear interpolation, exact at both ends.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Interpolate with easing.
#[inline]
pub fn ease(a: f32, b: f32, t: f32, easing: Easing) -> f32 {
    lerp(a, b, easing.apply(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicInOut,
        Easing::SineInOut,
    ];

    #[test]
    fn endpoints_are_exact() {
        for e in ALL {
            assert_eq!(e.apply(0.0), 0.0, "{:?}", e);
            assert_eq!(e.apply(1.0), 1.0, "{:?}", e);
        }
    }

    #[test]
    fn quad_in_out_matches_closed_form() {
        assert!((Easing::QuadInOut.apply(0.25) - 0.125).abs() < 1e-6);
        assert!((Easing::QuadInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::QuadInOut.apply(0.75) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(Easing::QuadInOut.apply(-1.0), 0.0);
        assert_eq!(Easing::QuadInOut.apply(2.0), 1.0);
    }

    #[test]
    fn lerp_hits_endpoints_for_awkward_values() {
        let (a, b) = (0.1_f32, 2.7_f32);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
    }

    #[test]
    fn ease_interpolates() {
        let result = ease(100.0, 200.0, 0.5, Easing::Linear);
        assert!((result - 150.0).abs() < 0.001);
    }
}
