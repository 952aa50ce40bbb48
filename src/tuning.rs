//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. The defaults reproduce the
//! shipped feel; a JSON file can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// When match points reach the score counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreCrediting {
    /// Score is added the instant a match resolves
    OnMatch,
    /// Score rides on soul particles and lands when they reach the collector
    #[default]
    OnDelivery,
}

/// Gameplay constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    /// Number of lanes
    pub lanes: usize,
    /// How many palette colors are in play
    pub palette_size: usize,
    /// Playfield width (pixels)
    pub screen_width: f32,
    /// Playfield height; the game-over extent for a lane pair
    pub screen_height: f32,

    // === Growth & collision ===
    /// Height added to every crystal per frame at multiplier 1
    pub base_growth_rate: f32,
    /// Score that adds +1 to the growth multiplier
    pub progression_divisor: f32,
    /// Height removed by a color match
    pub shrink_amount: f32,
    /// Floor for match shrink
    pub min_height: f32,
    /// Height added by a color mismatch
    pub penalty_growth: f32,
    /// Spore radius growth per frame
    pub spore_expand_rate: f32,
    /// Delay between consecutive lanes appearing at session start (ms)
    pub spawn_stagger_ms: f32,

    // === Scoring & progression ===
    /// Points for one match
    pub match_value: u64,
    /// Score per level
    pub level_divisor: u64,
    /// Combo window in raw milliseconds
    pub combo_window_ms: f32,
    /// Combo counts that trigger a slow-motion pulse (every Nth)
    pub combo_pulse_every: u32,
    /// When match points are credited
    pub score_crediting: ScoreCrediting,
    /// Soul particles spawned per match (payload is split between them)
    pub souls_per_match: u32,
    /// HUD point the souls fly to
    pub collector: [f32; 2],

    // === Critical mass ===
    /// Fraction of the extent where a lane starts to register danger
    pub critical_threshold: f32,
    /// Exponential blend per tick toward the instantaneous max
    pub critical_smoothing: f32,
    /// Heartbeat interval at intensity ~0 (ms)
    pub heartbeat_slow_ms: f32,
    /// Heartbeat interval at intensity 1 (ms)
    pub heartbeat_fast_ms: f32,

    // === Time dilation ===
    /// Fraction of the gap to the target closed per tick
    pub dilation_blend: f32,
    pub combo_pulse_scale: f32,
    pub combo_pulse_ms: f32,
    pub level_up_scale: f32,
    pub level_up_slowmo_ms: f32,
    pub game_over_scale: f32,
    pub game_over_slowmo_ms: f32,

    // === Session ===
    /// Largest dt accepted per tick (ms)
    pub max_dt_ms: f32,
    /// Delay before the game-over screen surfaces (ms)
    pub game_over_ui_delay_ms: f32,
    /// Launcher easing toward the target lane per tick
    pub launcher_ease: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lanes: DEFAULT_LANES,
            palette_size: PALETTE.len(),
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,

            base_growth_rate: 0.13,
            progression_divisor: 500.0,
            shrink_amount: 150.0,
            min_height: 10.0,
            penalty_growth: 40.0,
            spore_expand_rate: 8.0,
            spawn_stagger_ms: 60.0,

            match_value: 10,
            level_divisor: 500,
            combo_window_ms: 2000.0,
            combo_pulse_every: 5,
            score_crediting: ScoreCrediting::OnDelivery,
            souls_per_match: 5,
            collector: [80.0, 40.0],

            critical_threshold: 0.75,
            critical_smoothing: 0.1,
            heartbeat_slow_ms: 1000.0,
            heartbeat_fast_ms: 300.0,

            dilation_blend: 0.2,
            combo_pulse_scale: 0.3,
            combo_pulse_ms: 400.0,
            level_up_scale: 0.05,
            level_up_slowmo_ms: 1200.0,
            game_over_scale: 0.1,
            game_over_slowmo_ms: 2000.0,

            max_dt_ms: MAX_DT_MS,
            game_over_ui_delay_ms: 1500.0,
            launcher_ease: 0.2,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Load a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Clamp values that would break the simulation
    ///
    /// Bad values are corrected, never rejected.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.lanes == 0 {
            log::warn!("lanes must be at least 1, using {}", defaults.lanes);
            self.lanes = defaults.lanes;
        }
        if self.palette_size == 0 || self.palette_size > PALETTE.len() {
            let clamped = self.palette_size.clamp(1, PALETTE.len());
            log::warn!("palette_size {} out of range, using {}", self.palette_size, clamped);
            self.palette_size = clamped;
        }
        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            log::warn!("non-positive playfield size, using defaults");
            self.screen_width = defaults.screen_width;
            self.screen_height = defaults.screen_height;
        }
        if self.progression_divisor <= 0.0 {
            self.progression_divisor = defaults.progression_divisor;
        }
        if self.level_divisor == 0 {
            self.level_divisor = defaults.level_divisor;
        }
        if self.combo_pulse_every == 0 {
            self.combo_pulse_every = defaults.combo_pulse_every;
        }
        self.min_height = self.min_height.max(0.0);
        self.dilation_blend = self.dilation_blend.clamp(0.01, 1.0);
        self.critical_smoothing = self.critical_smoothing.clamp(0.01, 1.0);
        self.critical_threshold = self.critical_threshold.clamp(0.0, 0.99);
        self.launcher_ease = self.launcher_ease.clamp(0.01, 1.0);
        self.max_dt_ms = self.max_dt_ms.max(1.0);
        // Slow-motion targets must stay in (0, 1]
        for scale in [
            &mut self.combo_pulse_scale,
            &mut self.level_up_scale,
            &mut self.game_over_scale,
        ] {
            *scale = scale.clamp(0.01, 1.0);
        }
        self
    }

    /// Width of one lane
    #[inline]
    pub fn lane_width(&self) -> f32 {
        self.screen_width / self.lanes as f32
    }

    /// Horizontal center of a lane
    #[inline]
    pub fn lane_center(&self, lane: usize) -> f32 {
        let lane = lane.min(self.lanes - 1);
        lane as f32 * self.lane_width() + self.lane_width() / 2.0
    }

    /// Lane containing an x coordinate, clamped to the playfield
    pub fn lane_at(&self, x: f32) -> usize {
        let lane = (x / self.lane_width()).floor();
        if lane < 0.0 {
            0
        } else {
            (lane as usize).min(self.lanes - 1)
        }
    }

    /// Level implied by a score
    #[inline]
    pub fn level_for_score(&self, score: u64) -> u32 {
        (score / self.level_divisor) as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "lanes": 5, "penalty_growth": 25.0 }"#).unwrap();
        assert_eq!(tuning.lanes, 5);
        assert_eq!(tuning.penalty_growth, 25.0);
        assert_eq!(tuning.shrink_amount, 150.0);
        assert_eq!(tuning.score_crediting, ScoreCrediting::OnDelivery);
    }

    #[test]
    fn test_bad_values_are_clamped() {
        let tuning = Tuning::from_json(r#"{ "lanes": 0, "palette_size": 99, "level_up_scale": 0.0 }"#)
            .unwrap();
        assert_eq!(tuning.lanes, DEFAULT_LANES);
        assert_eq!(tuning.palette_size, PALETTE.len());
        assert!(tuning.level_up_scale > 0.0);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_lane_geometry() {
        let tuning = Tuning::default();
        let w = tuning.lane_width();
        assert_eq!(tuning.lane_at(-50.0), 0);
        assert_eq!(tuning.lane_at(w * 2.5), 2);
        assert_eq!(tuning.lane_at(tuning.screen_width + 10.0), tuning.lanes - 1);
        assert_eq!(tuning.lane_center(99), tuning.lane_center(tuning.lanes - 1));
        assert_eq!(tuning.lane_at(tuning.lane_center(3)), 3);
    }

    #[test]
    fn test_level_for_score() {
        let tuning = Tuning::default();
        assert_eq!(tuning.level_for_score(0), 1);
        assert_eq!(tuning.level_for_score(499), 1);
        assert_eq!(tuning.level_for_score(500), 2);
    }
}
