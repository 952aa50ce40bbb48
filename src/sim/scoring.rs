//! Score, level, combo and critical-mass bookkeeping
//!
//! Driven by resolved collisions and by soul deliveries. Combo and heartbeat
//! timers run on raw milliseconds so slow motion never stretches them.

use serde::{Deserialize, Serialize};

use super::state::Crystal;
use crate::{ScoreCrediting, Tuning, lerp};

/// Intensity below which the heartbeat stays silent
const HEARTBEAT_FLOOR: f32 = 0.01;
/// Combo pitch step and ceiling
const PITCH_STEP: f32 = 0.1;
const PITCH_MAX: f32 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub level: u32,
    pub combo: u32,
    /// Raw ms left before the combo lapses
    pub combo_timer_ms: f32,
    /// Smoothed max lane danger in [0, 1]
    pub critical_intensity: f32,
    pub heartbeat_timer_ms: f32,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            combo: 0,
            combo_timer_ms: 0.0,
            critical_intensity: 0.0,
            heartbeat_timer_ms: 0.0,
        }
    }
}

/// What a match did to the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub combo: u32,
    /// Combo reached a multiple of the pulse interval
    pub combo_pulse: bool,
    /// New level, if crediting at match time crossed a threshold
    pub level_up: Option<u32>,
}

impl Scoreboard {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Register a match
    pub fn on_match(&mut self, tuning: &Tuning) -> MatchOutcome {
        self.combo += 1;
        self.combo_timer_ms = tuning.combo_window_ms;
        let level_up = match tuning.score_crediting {
            ScoreCrediting::OnMatch => self.credit(tuning.match_value, tuning),
            ScoreCrediting::OnDelivery => None,
        };
        MatchOutcome {
            combo: self.combo,
            combo_pulse: self.combo % tuning.combo_pulse_every == 0,
            level_up,
        }
    }

    pub fn on_mismatch(&mut self) {
        self.combo = 0;
        self.combo_timer_ms = 0.0;
    }

    /// Add points; returns the new level when a threshold is crossed
    pub fn credit(&mut self, points: u64, tuning: &Tuning) -> Option<u32> {
        self.score += points;
        let level = tuning.level_for_score(self.score);
        if level > self.level {
            self.level = level;
            Some(level)
        } else {
            None
        }
    }

    /// Count the combo window down on raw time
    pub fn tick_combo(&mut self, dt_ms: f32) {
        if self.combo_timer_ms > 0.0 {
            self.combo_timer_ms -= dt_ms;
            if self.combo_timer_ms <= 0.0 {
                self.combo_timer_ms = 0.0;
                self.combo = 0;
            }
        }
    }

    /// Pitch multiplier for the match cue
    #[inline]
    pub fn pitch(&self) -> f32 {
        (1.0 + self.combo as f32 * PITCH_STEP).min(PITCH_MAX)
    }

    /// Recompute critical mass and flag endangered crystals
    ///
    /// Returns the intensity when a heartbeat should sound this tick.
    pub fn update_critical(&mut self, crystals: &mut [Crystal], tuning: &Tuning, dt_ms: f32) -> Option<f32> {
        let extent = tuning.screen_height;
        let start = tuning.critical_threshold * extent;
        let span = (extent - start).max(f32::EPSILON);

        let mut peak = 0.0f32;
        for lane in 0..tuning.lanes {
            let sum: f32 = crystals
                .iter()
                .filter(|c| c.lane == lane && c.is_spawned())
                .map(|c| c.height)
                .sum();
            let intensity = ((sum - start) / span).clamp(0.0, 1.0);
            peak = peak.max(intensity);
            for c in crystals.iter_mut().filter(|c| c.lane == lane) {
                c.is_critical = intensity > 0.0;
            }
        }

        self.critical_intensity += (peak - self.critical_intensity) * tuning.critical_smoothing;
        if self.critical_intensity < HEARTBEAT_FLOOR {
            self.heartbeat_timer_ms = 0.0;
            return None;
        }

        self.heartbeat_timer_ms -= dt_ms;
        if self.heartbeat_timer_ms <= 0.0 {
            self.heartbeat_timer_ms = lerp(
                tuning.heartbeat_slow_ms,
                tuning.heartbeat_fast_ms,
                self.critical_intensity.min(1.0),
            );
            Some(self.critical_intensity)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::sim::state::Side;

    fn pair(lane: usize, near: f32, far: f32) -> [Crystal; 2] {
        [
            Crystal::new(lane, Side::Near, near, 0),
            Crystal::new(lane, Side::Far, far, 1),
        ]
    }

    #[test]
    fn test_three_matches_then_mismatch() {
        let tuning = Tuning::default();
        let mut board = Scoreboard::default();
        for expected in 1..=3 {
            assert_eq!(board.on_match(&tuning).combo, expected);
        }
        assert_eq!(board.combo, 3);
        board.on_mismatch();
        assert_eq!(board.combo, 0);
        assert_eq!(board.combo_timer_ms, 0.0);
    }

    #[test]
    fn test_combo_lapses_on_raw_time() {
        let tuning = Tuning::default();
        let mut board = Scoreboard::default();
        board.on_match(&tuning);
        board.tick_combo(1999.0);
        assert_eq!(board.combo, 1);
        board.tick_combo(1.0);
        assert_eq!(board.combo, 0);
    }

    #[test]
    fn test_combo_pulse_every_fifth() {
        let tuning = Tuning::default();
        let mut board = Scoreboard::default();
        let pulses: Vec<bool> = (0..10).map(|_| board.on_match(&tuning).combo_pulse).collect();
        assert_eq!(pulses.iter().filter(|p| **p).count(), 2);
        assert!(pulses[4] && pulses[9]);
    }

    #[test]
    fn test_crediting_mode() {
        let mut tuning = Tuning::default();
        let mut board = Scoreboard::default();
        board.on_match(&tuning);
        assert_eq!(board.score, 0);

        tuning.score_crediting = ScoreCrediting::OnMatch;
        board.on_match(&tuning);
        assert_eq!(board.score, tuning.match_value);
    }

    #[test]
    fn test_level_up_once_per_threshold() {
        let tuning = Tuning::default();
        let mut board = Scoreboard::default();
        assert_eq!(board.credit(490, &tuning), None);
        assert_eq!(board.credit(10, &tuning), Some(2));
        assert_eq!(board.credit(10, &tuning), None);
        assert_eq!(board.level, 2);
        // A big jump lands on the implied level directly
        assert_eq!(board.credit(1000, &tuning), Some(4));
    }

    #[test]
    fn test_pitch_caps() {
        let mut board = Scoreboard::default();
        assert_eq!(board.pitch(), 1.0);
        board.combo = 50;
        assert_eq!(board.pitch(), 2.0);
    }

    #[test]
    fn test_critical_intensity_and_heartbeat() {
        let tuning = Tuning::default();
        let mut board = Scoreboard::default();
        // 600 = 0.75 * 800, so lane 0 is right at the edge; lane 1 is full
        let mut crystals: Vec<Crystal> = pair(0, 300.0, 300.0).into_iter().chain(pair(1, 400.0, 400.0)).collect();

        let mut beats = 0;
        for _ in 0..120 {
            if board.update_critical(&mut crystals, &tuning, FRAME_MS).is_some() {
                beats += 1;
            }
        }
        assert!(board.critical_intensity > 0.99);
        assert!(!crystals[0].is_critical);
        assert!(crystals[2].is_critical && crystals[3].is_critical);
        // ~2 s of frames at a 300-1000 ms interval
        assert!((2..=8).contains(&beats));

        // Danger gone: intensity decays, flags clear
        for c in &mut crystals {
            c.height = 50.0;
        }
        for _ in 0..120 {
            board.update_critical(&mut crystals, &tuning, FRAME_MS);
        }
        assert!(board.critical_intensity < 0.01);
        assert!(crystals.iter().all(|c| !c.is_critical));
    }
}
