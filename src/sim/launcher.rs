//! Player launcher
//!
//! Eases toward the selected lane; spores leave from wherever it is right now.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Tuning;

/// Tilt per unit of lateral speed, and its clamp
const TILT_PER_SPEED: f32 = 0.05;
const MAX_TILT: f32 = 0.5;
/// Recoil kept per frame
const RECOIL_DECAY: f32 = 0.8;
/// Lateral speed above which the launcher leaves a trail
pub const TRAIL_SPEED: f32 = 4.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Launcher {
    /// Visual x position
    pub x: f32,
    /// Lane the player selected
    pub target_lane: usize,
    /// Kick-back offset after firing (1 = full)
    pub recoil: f32,
    /// Lean in the direction of travel (radians)
    pub tilt: f32,
    /// Lateral speed during the last update (pixels per frame)
    pub speed: f32,
}

impl Launcher {
    /// Parked at the center of `lane`
    pub fn new(tuning: &Tuning, lane: usize) -> Self {
        let lane = lane.min(tuning.lanes - 1);
        Self {
            x: tuning.lane_center(lane),
            target_lane: lane,
            recoil: 0.0,
            tilt: 0.0,
            speed: 0.0,
        }
    }

    /// Select a lane; out-of-range input is clamped
    pub fn set_target_lane(&mut self, lane: i64, tuning: &Tuning) {
        self.target_lane = lane.clamp(0, tuning.lanes as i64 - 1) as usize;
    }

    #[inline]
    pub fn target_x(&self, tuning: &Tuning) -> f32 {
        tuning.lane_center(self.target_lane)
    }

    /// Ease toward the target lane
    pub fn update(&mut self, tuning: &Tuning, time_scale: f32) {
        let blend = (tuning.launcher_ease * time_scale).min(1.0);
        let prev = self.x;
        self.x += (self.target_x(tuning) - self.x) * blend;
        self.speed = if time_scale > 0.0 {
            (self.x - prev) / time_scale
        } else {
            0.0
        };
        self.tilt = (self.speed * TILT_PER_SPEED).clamp(-MAX_TILT, MAX_TILT);
        self.recoil *= 1.0 - (1.0 - RECOIL_DECAY) * time_scale;
        if self.recoil < 0.001 {
            self.recoil = 0.0;
        }
    }

    pub fn kick(&mut self) {
        self.recoil = 1.0;
    }

    /// Whether the launcher moves fast enough to leave a trail
    #[inline]
    pub fn is_streaking(&self) -> bool {
        self.speed.abs() > TRAIL_SPEED
    }

    /// Where a spore fired now would appear
    pub fn fire_position(&self, tuning: &Tuning) -> Vec2 {
        Vec2::new(self.x, tuning.screen_height / 2.0)
    }

    /// Lane under the launcher's current position
    pub fn fire_lane(&self, tuning: &Tuning) -> usize {
        tuning.lane_at(self.x)
    }
}
