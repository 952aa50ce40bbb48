//! Global time-scale controller
//!
//! Slow-motion pulses set a target scale for a raw-time duration; the scale
//! eases toward it and back to 1.0 afterwards.

use serde::{Deserialize, Serialize};

/// Snap distance to 1.0 once a pulse has expired
const SNAP_EPSILON: f32 = 0.001;
/// Smallest scale ever reported
const MIN_SCALE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDilation {
    /// Multiplier applied to every per-frame delta
    pub time_scale: f32,
    pub target: f32,
    /// Remaining slow-motion (raw ms)
    pub slow_mo_timer_ms: f32,
}

impl Default for TimeDilation {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            target: 1.0,
            slow_mo_timer_ms: 0.0,
        }
    }
}

impl TimeDilation {
    /// Request slow motion at `target` for `duration_ms`
    ///
    /// While an earlier pulse is still running the deeper of the two targets
    /// and the longer remaining duration win.
    pub fn pulse(&mut self, target: f32, duration_ms: f32) {
        let target = target.clamp(MIN_SCALE, 1.0);
        if self.slow_mo_timer_ms > 0.0 {
            self.target = self.target.min(target);
            self.slow_mo_timer_ms = self.slow_mo_timer_ms.max(duration_ms);
        } else {
            self.target = target;
            self.slow_mo_timer_ms = duration_ms;
        }
    }

    #[inline]
    pub fn is_slow(&self) -> bool {
        self.slow_mo_timer_ms > 0.0
    }

    /// Advance on raw time; returns the scale for this tick
    pub fn update(&mut self, dt_ms: f32, blend: f32) -> f32 {
        if self.slow_mo_timer_ms > 0.0 {
            self.slow_mo_timer_ms = (self.slow_mo_timer_ms - dt_ms).max(0.0);
            self.time_scale = crate::lerp(self.time_scale, self.target, blend);
        } else {
            self.target = 1.0;
            self.time_scale = crate::lerp(self.time_scale, 1.0, blend);
            if (1.0 - self.time_scale).abs() < SNAP_EPSILON {
                self.time_scale = 1.0;
            }
        }
        self.time_scale = self.time_scale.clamp(MIN_SCALE, 1.0);
        self.time_scale
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;

    #[test]
    fn test_pulse_slows_then_recovers_exactly() {
        let mut d = TimeDilation::default();
        d.pulse(0.05, 1200.0);
        let mut ticks = 0;
        while d.is_slow() {
            let ts = d.update(FRAME_MS, 0.2);
            assert!(ts > 0.0 && ts <= 1.0);
            ticks += 1;
        }
        assert!(d.time_scale < 0.1);
        assert!((72..=73).contains(&ticks));

        let mut recovered = None;
        for i in 0..200 {
            if d.update(FRAME_MS, 0.2) == 1.0 {
                recovered = Some(i);
                break;
            }
        }
        assert!(recovered.is_some_and(|i| i < 50));
        assert_eq!(d.target, 1.0);
    }

    #[test]
    fn test_overlapping_pulse_keeps_deeper_target() {
        let mut d = TimeDilation::default();
        d.pulse(0.05, 1200.0);
        d.pulse(0.3, 400.0);
        assert_eq!(d.target, 0.05);
        assert_eq!(d.slow_mo_timer_ms, 1200.0);

        d.pulse(0.01, 2000.0);
        assert_eq!(d.target, 0.01);
        assert_eq!(d.slow_mo_timer_ms, 2000.0);
    }

    #[test]
    fn test_idle_stays_at_one() {
        let mut d = TimeDilation::default();
        for _ in 0..10 {
            assert_eq!(d.update(FRAME_MS, 0.2), 1.0);
        }
    }
}
