//! Game state and core simulation types
//!
//! Everything the renderer and audio collaborators read each frame lives in
//! [`GameState`]. It is owned by the session and only mutated by `tick`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::dilation::TimeDilation;
use super::launcher::Launcher;
use super::particles::Effects;
use super::scoring::Scoreboard;
use crate::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first start
    Idle,
    /// Crystals growing, player firing
    Active,
    /// Run ended (a lane pair met)
    GameOver,
}

/// Which wall a crystal grows from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Grows down from the top wall (y = 0)
    Near,
    /// Grows up from the bottom wall (y = extent)
    Far,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Near, Side::Far];
}

/// Spring stiffness for crystal squash/stretch
const SPRING_K: f32 = 0.15;
/// Critical damping for SPRING_K (2 * sqrt(k))
const SPRING_DAMPING: f32 = 0.774_596_7;
/// Idle breathing: peak scale offset and phase step per nominal frame
const BREATH_AMPLITUDE: f32 = 0.02;
const BREATH_RATE: f32 = 0.05;

/// A growing obstacle on one side of a lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    pub lane: usize,
    pub side: Side,
    pub height: f32,
    /// Palette index
    pub color: usize,
    /// Highlight after a match (1 = full white, decays to 0)
    pub flash: f32,
    /// Squash/stretch (1, 1 = rest)
    pub scale: Vec2,
    pub scale_vel: Vec2,
    /// Lane pair is past the critical-mass threshold
    pub is_critical: bool,
    /// Remaining delay before the crystal appears (ms)
    pub spawn_delay_ms: f32,
    /// Shape variation for the renderer; also offsets the breathing phase
    pub shape_seed: f32,
    /// Scaled frames of breathing so far
    #[serde(default)]
    pub breath_time: f32,
}

impl Crystal {
    pub fn new(lane: usize, side: Side, height: f32, color: usize) -> Self {
        Self {
            lane,
            side,
            height,
            color,
            flash: 0.0,
            scale: Vec2::ONE,
            scale_vel: Vec2::ZERO,
            is_critical: false,
            spawn_delay_ms: 0.0,
            shape_seed: 0.5,
            breath_time: 0.0,
        }
    }

    /// Whether the deferred spawn has elapsed
    #[inline]
    pub fn is_spawned(&self) -> bool {
        self.spawn_delay_ms <= 0.0
    }

    /// Scale the renderer should use (hidden until spawned)
    pub fn render_scale(&self) -> Vec2 {
        if self.is_spawned() { self.scale } else { Vec2::ZERO }
    }

    /// Y coordinate of the crystal's growing face
    pub fn face_y(&self, extent: f32) -> f32 {
        match self.side {
            Side::Near => self.height,
            Side::Far => extent - self.height,
        }
    }

    /// Raw-time bookkeeping: spawn countdown and flash fade
    pub fn tick_timers(&mut self, dt_ms: f32) {
        if self.spawn_delay_ms > 0.0 {
            self.spawn_delay_ms = (self.spawn_delay_ms - dt_ms).max(0.0);
        }
        if self.flash > 0.0 {
            self.flash = (self.flash - 0.1 * dt_ms / crate::consts::FRAME_MS).max(0.0);
        }
    }

    /// Breathing rest pose: wider while shorter, out of phase per crystal
    pub fn rest_scale(&self) -> Vec2 {
        let rate = BREATH_RATE * (0.8 + 0.4 * self.shape_seed);
        let phase = self.breath_time * rate + self.shape_seed * std::f32::consts::TAU;
        let b = phase.sin() * BREATH_AMPLITUDE;
        Vec2::new(1.0 + b, 1.0 - b)
    }

    /// Critically damped spring toward the breathing rest pose
    pub fn update_spring(&mut self, time_scale: f32) {
        self.breath_time += time_scale;
        let accel = (self.rest_scale() - self.scale) * SPRING_K - self.scale_vel * SPRING_DAMPING;
        self.scale_vel += accel * time_scale;
        self.scale += self.scale_vel * time_scale;
    }

    /// Kick the spring
    pub fn impulse(&mut self, kick: Vec2) {
        self.scale_vel += kick;
    }
}

/// A fired projectile: fixed position, growing radius
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spore {
    pub pos: Vec2,
    pub lane: usize,
    pub color: usize,
    pub radius: f32,
    pub active: bool,
}

impl Spore {
    pub fn new(pos: Vec2, lane: usize, color: usize) -> Self {
        Self {
            pos,
            lane,
            color,
            radius: crate::consts::SPORE_START_RADIUS,
            active: true,
        }
    }
}

/// Discrete things that happened during a tick
///
/// Drained by the frame loop and forwarded to audio/UI collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Shoot { lane: usize },
    Match { lane: usize, side: Side, point: Vec2, color: usize, pitch: f32 },
    Mismatch { lane: usize, side: Side, point: Vec2 },
    LevelUp { level: u32 },
    GameOver { score: u64 },
    Heartbeat { intensity: f32 },
    ScoreDelivered { points: u64 },
}

/// Complete frame state
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub phase: GamePhase,
    /// Score, level, combo, critical mass
    pub scoreboard: Scoreboard,
    /// Global time scale
    pub dilation: TimeDilation,
    /// Two per lane while active, empty after game-over
    pub crystals: Vec<Crystal>,
    pub spores: Vec<Spore>,
    /// Visual-only particle collections
    pub effects: Effects,
    pub launcher: Launcher,
    /// Color of the next spore (preview)
    pub next_color: usize,

    // === Presentation hints (decay on raw time) ===
    pub screen_shake: f32,
    pub flash: f32,
    pub zoom: f32,
    /// Remaining freeze-frame (ms)
    pub hit_stop_ms: f32,
    /// Countdown until the game-over screen surfaces (ms)
    pub game_over_ui_timer_ms: f32,
    pub game_over_ui_visible: bool,

    /// Ticks processed since construction
    pub frame: u64,
    /// Events raised since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Idle state with no crystals yet
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: GamePhase::Idle,
            scoreboard: Scoreboard::default(),
            dilation: TimeDilation::default(),
            crystals: Vec::new(),
            spores: Vec::new(),
            effects: Effects::default(),
            launcher: Launcher::new(tuning, tuning.lanes / 2),
            next_color: 0,
            screen_shake: 0.0,
            flash: 0.0,
            zoom: 0.0,
            hit_stop_ms: 0.0,
            game_over_ui_timer_ms: 0.0,
            game_over_ui_visible: false,
            frame: 0,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Active
    }

    /// Crystal on one side of a lane
    pub fn crystal(&self, lane: usize, side: Side) -> Option<&Crystal> {
        self.crystals.iter().find(|c| c.lane == lane && c.side == side)
    }

    /// Add screen shake, capped at 1
    pub fn add_shake(&mut self, amount: f32) {
        self.screen_shake = (self.screen_shake + amount).min(1.0);
    }
}

/// Indices of the near and far crystal of a lane, if both exist
pub fn lane_pair(crystals: &[Crystal], lane: usize) -> Option<(usize, usize)> {
    let near = crystals
        .iter()
        .position(|c| c.lane == lane && c.side == Side::Near)?;
    let far = crystals
        .iter()
        .position(|c| c.lane == lane && c.side == Side::Far)?;
    Some((near, far))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_crystal_hidden_until_spawned() {
        let mut c = Crystal::new(0, Side::Near, 50.0, 1);
        c.spawn_delay_ms = 30.0;
        assert_eq!(c.render_scale(), Vec2::ZERO);
        c.tick_timers(16.0);
        assert!(!c.is_spawned());
        c.tick_timers(16.0);
        assert!(c.is_spawned());
        assert_eq!(c.render_scale(), Vec2::ONE);
    }

    #[test]
    fn test_spring_settles_after_impulse() {
        let mut c = Crystal::new(0, Side::Far, 50.0, 1);
        c.impulse(Vec2::new(0.0, 0.8));
        let mut peak = 0.0f32;
        for _ in 0..120 {
            c.update_spring(1.0);
            peak = peak.max(c.scale.y);
        }
        assert!(peak > 1.1);
        assert!((c.scale.y - c.rest_scale().y).abs() < 0.01);
        assert!(c.scale_vel.y.abs() < 0.01);
    }

    #[test]
    fn test_idle_crystal_breathes() {
        let mut c = Crystal::new(0, Side::Near, 50.0, 1);
        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        for _ in 0..120 {
            c.update_spring(1.0);
            lo = lo.min(c.scale.x);
            hi = hi.max(c.scale.x);
        }
        assert!(hi - lo > 0.01);
        assert!(lo > 0.9 && hi < 1.1);
    }

    #[test]
    fn test_breathing_freezes_with_time() {
        let mut c = Crystal::new(0, Side::Near, 50.0, 1);
        let rest = c.rest_scale();
        for _ in 0..60 {
            c.update_spring(0.0);
        }
        assert_eq!(c.rest_scale(), rest);
        assert_eq!(c.breath_time, 0.0);
    }

    #[test]
    fn test_breathing_phase_differs_by_seed() {
        let mut a = Crystal::new(0, Side::Near, 50.0, 1);
        let mut b = Crystal::new(1, Side::Near, 50.0, 1);
        a.shape_seed = 0.1;
        b.shape_seed = 0.35;
        assert!((a.rest_scale().x - b.rest_scale().x).abs() > 1e-3);
    }

    #[test]
    fn test_face_y() {
        let near = Crystal::new(0, Side::Near, 120.0, 0);
        let far = Crystal::new(0, Side::Far, 120.0, 0);
        assert_eq!(near.face_y(800.0), 120.0);
        assert_eq!(far.face_y(800.0), 680.0);
    }

    #[test]
    fn test_lane_pair_missing_side() {
        let crystals = vec![
            Crystal::new(0, Side::Near, 10.0, 0),
            Crystal::new(0, Side::Far, 10.0, 0),
            Crystal::new(1, Side::Near, 10.0, 0),
        ];
        assert_eq!(lane_pair(&crystals, 0), Some((0, 1)));
        assert_eq!(lane_pair(&crystals, 1), None);
    }
}
