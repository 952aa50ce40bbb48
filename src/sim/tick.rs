//! Session controller and per-frame tick
//!
//! A [`Session`] owns the state, tuning, RNG and math kernel. [`tick`] is the
//! only thing that advances it, in a fixed order:
//!
//! 1. decay transients on raw time (shake, flash, zoom, combo, spawn delays)
//! 2. update the time scale
//! 3. grow crystals and check for game-over
//! 4. resolve spores, apply their feedback, leave spore trails
//! 5. move the launcher
//! 6. advance effects and credit delivered souls
//!
//! Hit-stop freezes steps 3-6 without losing any state.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{self, Resolution};
use super::integrator::Bounds;
use super::launcher::Launcher;
use super::particles::Tint;
use super::state::{Crystal, GameEvent, GamePhase, GameState, Side, Spore};
use crate::consts::{CRYSTAL_START_HEIGHT_MIN, CRYSTAL_START_HEIGHT_SPREAD};
use crate::kernel::{KernelChoice, MathKernel, select_kernel};
use crate::{ScoreCrediting, Settings, Tuning, decay};

/// Per-frame keep factors for presentation hints
const SHAKE_KEEP: f32 = 0.9;
const FLASH_KEEP: f32 = 0.92;
const ZOOM_KEEP: f32 = 0.94;

/// Feedback sizes
const MATCH_SPARKS: u32 = 20;
const MISMATCH_DEBRIS: u32 = 5;
const GAME_OVER_CHUNKS: u32 = 6;
const GAME_OVER_DEBRIS: u32 = 12;
const LEVEL_UP_SPARKS: u32 = 40;
const SPORE_TRAIL_SIZE: f32 = 5.0;
/// Upward spring kick for crystals sharing a matched color
const RESONANCE_KICK: Vec2 = Vec2::new(0.0, 0.15);

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lane the player points at (clamped)
    pub target_lane: Option<i64>,
    /// Fire a spore from the launcher's current position
    pub fire: bool,
    /// Begin a run (from idle or after game-over)
    pub start: bool,
}

/// One game session
#[derive(Debug)]
pub struct Session {
    pub state: GameState,
    pub tuning: Tuning,
    pub settings: Settings,
    rng: Pcg32,
    kernel: Box<dyn MathKernel>,
}

impl Session {
    pub fn new(tuning: Tuning, settings: Settings, seed: u64) -> Self {
        let tuning = tuning.sanitized();
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut state = GameState::new(&tuning);
        state.effects.max_particles = settings.max_particles();
        state.next_color = rng.random_range(0..tuning.palette_size);
        state
            .effects
            .seed_dust(&mut rng, settings.dust_count(), tuning.screen_width, tuning.screen_height);
        Self {
            state,
            tuning,
            settings,
            rng,
            kernel: select_kernel(&KernelChoice::default()),
        }
    }

    /// Swap the math kernel (falls back to pure on init failure)
    pub fn with_kernel(mut self, choice: &KernelChoice) -> Self {
        self.kernel = select_kernel(choice);
        self
    }

    pub fn kernel_name(&self) -> &'static str {
        self.kernel.name()
    }

    /// Reset counters and seed a fresh set of crystals
    pub fn start(&mut self) {
        let tuning = &self.tuning;
        let state = &mut self.state;

        state.scoreboard.reset();
        state.dilation.reset();
        state.spores.clear();
        state.effects.clear_transient();
        state.effects.max_particles = self.settings.max_particles();
        state.screen_shake = 0.0;
        state.flash = 0.0;
        state.zoom = 0.0;
        state.hit_stop_ms = 0.0;
        state.game_over_ui_timer_ms = 0.0;
        state.game_over_ui_visible = false;

        state.crystals.clear();
        for lane in 0..tuning.lanes {
            for side in Side::BOTH {
                let height = CRYSTAL_START_HEIGHT_MIN + self.rng.random::<f32>() * CRYSTAL_START_HEIGHT_SPREAD;
                let color = self.rng.random_range(0..tuning.palette_size);
                let mut crystal = Crystal::new(lane, side, height, color);
                crystal.spawn_delay_ms = lane as f32 * tuning.spawn_stagger_ms;
                crystal.shape_seed = self.rng.random();
                state.crystals.push(crystal);
            }
        }

        state.next_color = self.rng.random_range(0..tuning.palette_size);
        state.launcher = Launcher::new(tuning, tuning.lanes / 2);
        state.effects.seed_dust(
            &mut self.rng,
            self.settings.dust_count(),
            tuning.screen_width,
            tuning.screen_height,
        );
        state.phase = GamePhase::Active;
        log::info!(
            "Session started: {} lanes, kernel={}, crediting={:?}",
            tuning.lanes,
            self.kernel.name(),
            tuning.score_crediting
        );
    }

    pub fn set_target_lane(&mut self, lane: i64) {
        self.state.launcher.set_target_lane(lane, &self.tuning);
    }

    /// Fire a spore; ignored unless a run is active
    pub fn fire(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let lane = self.state.launcher.fire_lane(&self.tuning);
        let pos = self.state.launcher.fire_position(&self.tuning);
        self.state.spores.push(Spore::new(pos, lane, self.state.next_color));
        self.state.next_color = self.rng.random_range(0..self.tuning.palette_size);
        self.state.launcher.kick();
        self.shake(0.05);
        self.state.events.push(GameEvent::Shoot { lane });
        true
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// JSON snapshot of the frame state
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.state)
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            width: self.tuning.screen_width,
            floor: self.tuning.screen_height,
        }
    }

    fn shake(&mut self, amount: f32) {
        if self.settings.effective_screen_shake() {
            self.state.add_shake(amount);
        }
    }

    fn hit_stop(&mut self) {
        if self.settings.effective_hit_stop() {
            self.state.hit_stop_ms = self.state.hit_stop_ms.max(self.settings.hit_stop_ms);
        }
    }

    /// Puffs along both expanding fronts of every live spore
    fn spore_trails(&mut self) {
        let effects = &mut self.state.effects;
        for spore in self.state.spores.iter().filter(|s| s.active) {
            let tint = Tint::Palette(spore.color);
            for dir in [-1.0, 1.0] {
                let front = spore.pos + Vec2::new(0.0, dir * spore.radius);
                effects.trail(front, tint, SPORE_TRAIL_SIZE);
            }
        }
    }

    fn apply(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::MatchResolved {
                lane,
                side,
                point,
                color,
            } => self.apply_match(lane, side, point, color),
            Resolution::MismatchResolved { lane, side, point } => self.apply_mismatch(lane, side, point),
            Resolution::GameOver { lane } => self.game_over(lane),
        }
    }

    fn apply_match(&mut self, lane: usize, side: Side, point: Vec2, color: usize) {
        let outcome = self.state.scoreboard.on_match(&self.tuning);
        let pitch = self.state.scoreboard.pitch();
        self.state.events.push(GameEvent::Match {
            lane,
            side,
            point,
            color,
            pitch,
        });
        log::debug!("Match lane {lane} {side:?}, combo {}", outcome.combo);

        let tint = Tint::Palette(color);
        let effects = &mut self.state.effects;
        effects.burst_sparks(&mut self.rng, point, tint, MATCH_SPARKS);
        effects.shockwave(point, 8.0, tint);
        effects.text(point, format!("+{}", self.tuning.match_value), tint);
        if outcome.combo > 1 {
            effects.text(point - Vec2::new(0.0, 30.0), format!("COMBO x{}", outcome.combo), Tint::White);
        }
        if self.tuning.score_crediting == ScoreCrediting::OnDelivery {
            let [cx, cy] = self.tuning.collector;
            effects.souls(
                &mut self.rng,
                point,
                Vec2::new(cx, cy),
                self.tuning.match_value,
                self.tuning.souls_per_match,
                tint,
            );
        }

        for crystal in &mut self.state.crystals {
            if crystal.color == color && !(crystal.lane == lane && crystal.side == side) {
                crystal.impulse(RESONANCE_KICK);
            }
        }

        self.shake(0.1);
        if outcome.combo_pulse {
            self.state
                .dilation
                .pulse(self.tuning.combo_pulse_scale, self.tuning.combo_pulse_ms);
            self.hit_stop();
        }
        if let Some(level) = outcome.level_up {
            self.level_up(level);
        }
    }

    fn apply_mismatch(&mut self, lane: usize, side: Side, point: Vec2) {
        self.state.scoreboard.on_mismatch();
        self.state.events.push(GameEvent::Mismatch { lane, side, point });
        log::debug!("Mismatch lane {lane} {side:?}");

        // Debris flies back toward the middle of the playfield
        let angle = match side {
            Side::Near => std::f32::consts::FRAC_PI_2,
            Side::Far => -std::f32::consts::FRAC_PI_2,
        };
        self.state.effects.burst_debris(
            &mut self.rng,
            self.kernel.as_ref(),
            point,
            Tint::Ash,
            MISMATCH_DEBRIS,
            Some(angle),
            5.0,
        );
        self.shake(0.3);
    }

    fn level_up(&mut self, level: u32) {
        log::info!("Level up: {level}");
        self.state.events.push(GameEvent::LevelUp { level });
        self.state
            .dilation
            .pulse(self.tuning.level_up_scale, self.tuning.level_up_slowmo_ms);
        self.state.zoom = 1.0;
        self.state.flash = self.state.flash.max(0.5);

        let center = Vec2::new(self.tuning.screen_width, self.tuning.screen_height) / 2.0;
        let effects = &mut self.state.effects;
        effects.burst_sparks(&mut self.rng, center, Tint::White, LEVEL_UP_SPARKS);
        effects.shockwave(center, 20.0, Tint::White);
        effects.text(center, format!("LEVEL {level}"), Tint::White);
        self.hit_stop();
    }

    fn game_over(&mut self, lane: usize) {
        let state = &mut self.state;
        state.phase = GamePhase::GameOver;
        let score = state.scoreboard.score;
        state.events.push(GameEvent::GameOver { score });
        log::info!("Game over in lane {lane}: score {score}, level {}", state.scoreboard.level);

        let extent = self.tuning.screen_height;
        for crystal in std::mem::take(&mut state.crystals) {
            let x = self.tuning.lane_center(crystal.lane);
            let y = match crystal.side {
                Side::Near => crystal.height / 2.0,
                Side::Far => extent - crystal.height / 2.0,
            };
            let pos = Vec2::new(x, y);
            let tint = Tint::Palette(crystal.color);
            state
                .effects
                .burst_chunks(&mut self.rng, self.kernel.as_ref(), pos, tint, GAME_OVER_CHUNKS, 6.0);
            state.effects.burst_debris(
                &mut self.rng,
                self.kernel.as_ref(),
                pos,
                tint,
                GAME_OVER_DEBRIS,
                None,
                8.0,
            );
        }
        state.spores.clear();

        state
            .dilation
            .pulse(self.tuning.game_over_scale, self.tuning.game_over_slowmo_ms);
        if self.settings.effective_screen_shake() {
            state.screen_shake = 1.0;
        }
        state.zoom = 1.0;
        state.game_over_ui_timer_ms = self.tuning.game_over_ui_delay_ms;
        state.game_over_ui_visible = false;
    }

    /// Force the next level with its full feedback (debug hook)
    pub fn trigger_level_up(&mut self) {
        let level = self.state.scoreboard.level + 1;
        self.state.scoreboard.level = level;
        self.level_up(level);
    }
}

/// Advance the session by one frame of `dt_ms` raw milliseconds
pub fn tick(session: &mut Session, input: &TickInput, dt_ms: f32) {
    if input.start && !session.state.is_active() {
        session.start();
    }
    if let Some(lane) = input.target_lane {
        session.set_target_lane(lane);
    }
    if input.fire {
        session.fire();
    }

    let dt = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, session.tuning.max_dt_ms)
    } else {
        0.0
    };
    session.state.frame += 1;

    // 1. Raw-time transients
    {
        let state = &mut session.state;
        state.screen_shake = decay(state.screen_shake, SHAKE_KEEP, dt);
        state.flash = decay(state.flash, FLASH_KEEP, dt);
        state.zoom = decay(state.zoom, ZOOM_KEEP, dt);
        state.scoreboard.tick_combo(dt);
        for crystal in &mut state.crystals {
            crystal.tick_timers(dt);
        }
        if state.phase == GamePhase::GameOver && !state.game_over_ui_visible {
            state.game_over_ui_timer_ms -= dt;
            if state.game_over_ui_timer_ms <= 0.0 {
                state.game_over_ui_timer_ms = 0.0;
                state.game_over_ui_visible = true;
            }
        }
    }

    // 2. Time scale
    let time_scale = session.state.dilation.update(dt, session.tuning.dilation_blend);

    if session.state.hit_stop_ms > 0.0 {
        session.state.hit_stop_ms = (session.state.hit_stop_ms - dt).max(0.0);
        return;
    }

    // 3 + 4. Growth, game-over, spores
    if session.state.is_active() {
        let resolutions = collision::advance(
            &mut session.state.crystals,
            &mut session.state.spores,
            session.kernel.as_ref(),
            &session.tuning,
            session.state.scoreboard.score,
            time_scale,
            &mut session.rng,
        );
        for resolution in resolutions {
            session.apply(resolution);
        }
    }
    if session.state.is_active() {
        session.spore_trails();
    }
    if session.state.is_active() {
        let state = &mut session.state;
        if let Some(intensity) = state.scoreboard.update_critical(&mut state.crystals, &session.tuning, dt) {
            state.events.push(GameEvent::Heartbeat { intensity });
        }
    }

    // 5. Launcher
    session.state.launcher.update(&session.tuning, time_scale);
    if session.state.launcher.is_streaking() {
        let pos = session.state.launcher.fire_position(&session.tuning);
        session.state.effects.trail(pos, Tint::White, 8.0);
    }

    // 6. Effects and soul delivery
    let bounds = session.bounds();
    let delivered = session
        .state
        .effects
        .update(&mut session.rng, session.kernel.as_ref(), &bounds, time_scale);
    for points in delivered {
        if !session.state.is_active() {
            continue;
        }
        session.state.events.push(GameEvent::ScoreDelivered { points });
        if let Some(level) = session.state.scoreboard.credit(points, &session.tuning) {
            session.level_up(level);
        }
    }
}
