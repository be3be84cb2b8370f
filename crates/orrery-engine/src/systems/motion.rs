//! Orbital motion model.
//!
//! Placement is a pure function of scene time: positions are recomputed
//! from elapsed seconds every tick, never integrated, so a body's phase
//! cannot drift and a paused tick is simply a tick where this isn't called.

use std::f64::consts::TAU;
use glam::Vec3;
use crate::components::body::BodySpec;

/// Where a body sits and how far it has spun at some instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMotion {
    /// Pivot position in the orbital (XZ) plane.
    pub position: Vec3,
    /// Render-node rotation about +Y, radians.
    pub spin: f32,
}

/// Orbital angle in radians. `angular_speed` is in orbits per second.
#[inline]
pub fn orbital_angle(elapsed: f64, angular_speed: f32) -> f64 {
    elapsed * angular_speed as f64 * TAU
}

pub fn body_motion(elapsed: f64, spec: &BodySpec) -> BodyMotion {
    let theta = orbital_angle(elapsed, spec.orbital_angular_speed);
    let d = spec.orbital_distance as f64;
    BodyMotion {
        position: Vec3::new((theta.cos() * d) as f32, 0.0, (theta.sin() * d) as f32),
        spin: (elapsed * spec.self_rotation_speed as f64) as f32,
    }
}

/// Pivot position before the first tick.
pub fn initial_position(spec: &BodySpec) -> Vec3 {
    Vec3::new(spec.orbital_distance, 0.0, 0.0)
}

/// Seconds per orbit, `None` for a body that doesn't orbit.
pub fn orbit_period(spec: &BodySpec) -> Option<f64> {
    if spec.orbital_angular_speed == 0.0 {
        None
    } else {
        Some(1.0 / spec.orbital_angular_speed.abs() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth() -> BodySpec {
        BodySpec::new("Earth", 20.0, 0.3, 0.0015)
    }

    #[test]
    fn deterministic() {
        let a = body_motion(12.345, &earth());
        let b = body_motion(12.345, &earth());
        assert_eq!(a, b);
    }

    #[test]
    fn earth_returns_after_one_period() {
        let spec = earth();
        let start = body_motion(0.0, &spec);
        assert!((start.position - Vec3::new(20.0, 0.0, 0.0)).length() < 1e-5);

        let period = orbit_period(&spec).unwrap_or(0.0);
        assert!((period - 1.0 / 0.3).abs() < 1e-6);
        let around = body_motion(period, &spec);
        assert!((around.position - Vec3::new(20.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn quarter_orbit_is_on_z() {
        let spec = earth();
        let period = orbit_period(&spec).unwrap_or(0.0);
        let q = body_motion(period / 4.0, &spec);
        assert!(q.position.x.abs() < 1e-4);
        assert!((q.position.z - 20.0).abs() < 1e-4);
    }

    #[test]
    fn spin_is_linear_in_time() {
        let spec = earth();
        let m = body_motion(100.0, &spec);
        assert!((m.spin - 0.15).abs() < 1e-6);
    }

    #[test]
    fn stationary_body_has_no_period() {
        let spec = BodySpec::new("Pin", 5.0, 0.0, 0.0);
        assert!(orbit_period(&spec).is_none());
        assert_eq!(initial_position(&spec), Vec3::new(5.0, 0.0, 0.0));
    }
}
