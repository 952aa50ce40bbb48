//! Position + velocity + decay stepper shared by every particle-like entity
//!
//! All quantities are per nominal frame and multiplied by the time scale, so
//! slow-motion slows motion, gravity, drag and fading alike.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::kernel::MathKernel;

/// Kinematic state common to all particles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life (starts at `max_life`, dead at <= 0)
    pub life: f32,
    pub max_life: f32,
}

/// Floor/wall bounce response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    /// Fraction of normal speed kept after the bounce
    pub damping: f32,
    /// Max random tangential nudge per bounce
    pub nudge: f32,
}

/// Per-variant physical constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    pub gravity: f32,
    /// Velocity kept per frame (1 = no drag)
    pub friction: f32,
    /// Life lost per frame
    pub decay: f32,
    pub bounce: Option<Bounce>,
}

/// Playfield limits for bouncing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub floor: f32,
}

/// What happened during one integration step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    /// Struck the floor or a wall this step
    pub hit: bool,
    /// Normal speed at the moment of impact
    pub impact_speed: f32,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, life: f32) -> Self {
        Self {
            pos,
            vel,
            life,
            max_life: life,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Remaining life in [0, 1]
    #[inline]
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    /// Advance one step: translate, gravity, drag, bounce, fade
    pub fn integrate<R: Rng + ?Sized>(
        &mut self,
        physics: &Physics,
        time_scale: f32,
        bounds: &Bounds,
        kernel: &dyn MathKernel,
        rng: &mut R,
    ) -> StepOutcome {
        self.pos += self.vel * time_scale;
        self.vel.y += physics.gravity * time_scale;
        self.vel *= 1.0 - (1.0 - physics.friction) * time_scale;

        let mut outcome = StepOutcome::default();
        if let Some(bounce) = physics.bounce {
            if self.pos.y > bounds.floor && self.vel.y > 0.0 {
                outcome.hit = true;
                outcome.impact_speed = self.vel.y;
                self.pos.y = bounds.floor;
                self.vel.y = kernel.bounce_velocity(self.vel.y, bounce.damping);
                self.vel.x += rng.random_range(-1.0f32..=1.0) * bounce.nudge;
            }
            let off_left = self.pos.x < 0.0 && self.vel.x < 0.0;
            let off_right = self.pos.x > bounds.width && self.vel.x > 0.0;
            if off_left || off_right {
                outcome.hit = true;
                outcome.impact_speed = outcome.impact_speed.max(self.vel.x.abs());
                self.pos.x = self.pos.x.clamp(0.0, bounds.width);
                self.vel.x = kernel.bounce_velocity(self.vel.x, bounce.damping);
                self.vel.y += rng.random_range(-1.0f32..=1.0) * bounce.nudge;
            }
        }

        self.life -= physics.decay * time_scale;
        outcome
    }

    /// Steering step: blend velocity toward `target` at `speed`
    ///
    /// Returns the squared distance to the target after moving.
    pub fn home(&mut self, target: Vec2, speed: f32, agility: f32, decay: f32, time_scale: f32) -> f32 {
        let desired = (target - self.pos).normalize_or_zero() * speed;
        let blend = (agility * time_scale).min(1.0);
        self.vel = self.vel.lerp(desired, blend);
        self.pos += self.vel * time_scale;
        self.life -= decay * time_scale;
        self.pos.distance_squared(target)
    }
}
