/// Monotonic scene clock.
///
/// Elapsed time is the single source of orbital phase. It is measured from
/// the first timestamp the clock sees, and never moves backwards even if the
/// host hands it an earlier timestamp.
#[derive(Debug, Clone, Default)]
pub struct SceneClock {
    origin: Option<f64>,
    last: f64,
    elapsed: f64,
}

impl SceneClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to host time `now` (seconds). Returns the step taken.
    pub fn advance_to(&mut self, now: f64) -> f64 {
        let origin = match self.origin {
            Some(o) => o,
            None => {
                self.origin = Some(now - self.elapsed);
                self.last = now;
                return 0.0;
            }
        };
        if now <= self.last {
            return 0.0;
        }
        self.last = now;
        let next = now - origin;
        let dt = next - self.elapsed;
        self.elapsed = next;
        dt
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// Fixed timestep accumulator.
/// Runs kinematic updates at a steady rate regardless of frame time.
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        // Cap at 10 steps so a long stall (hidden tab) doesn't replay seconds of input.
        self.accumulator = self.accumulator.min(self.dt * 10.0);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_timestamp_is_origin() {
        let mut clock = SceneClock::new();
        assert_eq!(clock.advance_to(1234.5), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
        let dt = clock.advance_to(1235.0);
        assert!((dt - 0.5).abs() < 1e-9);
        assert!((clock.elapsed() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn never_runs_backwards() {
        let mut clock = SceneClock::new();
        clock.advance_to(10.0);
        clock.advance_to(12.0);
        assert_eq!(clock.advance_to(11.0), 0.0);
        assert!((clock.elapsed() - 2.0).abs() < 1e-9);
        clock.advance_to(13.0);
        assert!((clock.elapsed() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_step_accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn fixed_step_caps_at_ten() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(1.0), 10);
    }
}
