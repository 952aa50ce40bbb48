//! Particle catalog
//!
//! Every visual effect is one of a few typed variants built on [`Body`].
//! None of them influence gameplay except [`Soul`], which carries a score
//! payload to the collector.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::integrator::{Body, Bounce, Bounds, Physics};
use crate::ease_out_elastic;
use crate::kernel::MathKernel;

/// Particle color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    /// Palette index
    Palette(usize),
    /// Mismatch grey
    Ash,
    White,
}

/// Variant-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParticleKind {
    Spark,
    Debris { polygon: Vec<Vec2>, angle: f32, spin: f32 },
    Shard { polygon: Vec<Vec2>, angle: f32, spin: f32 },
    /// Heavy piece that shatters into shards on a hard landing
    Chunk { polygon: Vec<Vec2>, angle: f32, spin: f32 },
    Trail,
}

const SPARK: Physics = Physics {
    gravity: 0.0,
    friction: 0.96,
    decay: 0.02,
    bounce: None,
};
const DEBRIS: Physics = Physics {
    gravity: 0.25,
    friction: 0.98,
    decay: 0.012,
    bounce: Some(Bounce {
        damping: 0.5,
        nudge: 0.5,
    }),
};
const SHARD: Physics = Physics {
    gravity: 0.15,
    friction: 0.97,
    decay: 0.025,
    bounce: None,
};
const CHUNK: Physics = Physics {
    gravity: 0.4,
    friction: 0.99,
    decay: 0.006,
    bounce: Some(Bounce {
        damping: 0.4,
        nudge: 1.0,
    }),
};
const TRAIL: Physics = Physics {
    gravity: 0.0,
    friction: 0.9,
    decay: 0.08,
    bounce: None,
};
const DUST: Physics = Physics {
    gravity: 0.0,
    friction: 0.995,
    decay: 0.0,
    bounce: None,
};
const FLOATING_TEXT: Physics = Physics {
    gravity: 0.0,
    friction: 0.97,
    decay: 0.015,
    bounce: None,
};

/// Trail size kept per frame
const TRAIL_SHRINK: f32 = 0.92;
/// Landing speed above which a chunk breaks up
const CHUNK_SHATTER_SPEED: f32 = 4.0;
const CHUNK_SHARDS: u32 = 5;

/// Soul steering
const SOUL_SPEED: f32 = 14.0;
const SOUL_AGILITY: f32 = 0.12;
const SOUL_DECAY: f32 = 0.01;
const SOUL_ARRIVE_SQ: f32 = 400.0;

/// Shockwave ring growth per frame and fade
const SHOCK_SPEED: f32 = 12.0;
const SHOCK_DECAY: f32 = 0.04;
/// Dust push from a passing ring
const SHOCK_PUSH: f32 = 1.5;

impl ParticleKind {
    pub fn physics(&self) -> &'static Physics {
        match self {
            ParticleKind::Spark => &SPARK,
            ParticleKind::Debris { .. } => &DEBRIS,
            ParticleKind::Shard { .. } => &SHARD,
            ParticleKind::Chunk { .. } => &CHUNK,
            ParticleKind::Trail => &TRAIL,
        }
    }
}

/// Spark, debris, shard, chunk or trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub body: Body,
    pub kind: ParticleKind,
    pub tint: Tint,
    pub size: f32,
}

/// Expanding ring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shockwave {
    pub center: Vec2,
    pub radius: f32,
    pub max_width: f32,
    pub life: f32,
    pub tint: Tint,
}

impl Shockwave {
    /// Ring thickness fades with life
    pub fn width(&self) -> f32 {
        self.max_width * self.life.max(0.0)
    }
}

/// Rising label with an elastic pop-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub body: Body,
    pub text: String,
    pub tint: Tint,
    pub scale: f32,
}

/// Homing carrier of a score payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soul {
    pub body: Body,
    pub target: Vec2,
    pub payload: u64,
    pub tint: Tint,
}

impl Soul {
    /// Steer toward the collector; `Some(payload)` once on arrival or timeout
    pub fn update(&mut self, time_scale: f32) -> Option<u64> {
        let dist_sq = self
            .body
            .home(self.target, SOUL_SPEED, SOUL_AGILITY, SOUL_DECAY, time_scale);
        if dist_sq < SOUL_ARRIVE_SQ || !self.body.is_alive() {
            self.body.life = 0.0;
            Some(self.payload)
        } else {
            None
        }
    }
}

/// Ambient mote that wraps at the screen edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dust {
    pub body: Body,
    pub size: f32,
}

/// All visual collections
#[derive(Debug, Clone, Default, Serialize)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub shockwaves: Vec<Shockwave>,
    pub texts: Vec<FloatingText>,
    pub souls: Vec<Soul>,
    pub dust: Vec<Dust>,
    /// Cap on `particles` (souls, rings and labels are never capped)
    pub max_particles: usize,
}

/// Random convex-ish polygon around the origin
fn random_polygon<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec<Vec2> {
    let sides = rng.random_range(3..=6);
    (0..sides)
        .map(|i| {
            let angle = i as f32 / sides as f32 * std::f32::consts::TAU;
            let r = radius * rng.random_range(0.6f32..=1.0);
            Vec2::new(angle.cos(), angle.sin()) * r
        })
        .collect()
}

impl Effects {
    pub fn new(max_particles: usize) -> Self {
        Self {
            max_particles,
            ..Self::default()
        }
    }

    /// Drop everything except ambient dust
    pub fn clear_transient(&mut self) {
        self.particles.clear();
        self.shockwaves.clear();
        self.texts.clear();
        self.souls.clear();
    }

    #[inline]
    fn has_room(&self) -> bool {
        self.particles.len() < self.max_particles
    }

    fn push(&mut self, particle: Particle) {
        if self.has_room() {
            self.particles.push(particle);
        }
    }

    /// Omnidirectional spark burst
    pub fn burst_sparks<R: Rng + ?Sized>(&mut self, rng: &mut R, pos: Vec2, tint: Tint, count: u32) {
        for _ in 0..count {
            let vel = Vec2::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
            let size = rng.random_range(1.0..5.0);
            self.push(Particle {
                body: Body::new(pos, vel, 1.0),
                kind: ParticleKind::Spark,
                tint,
                size,
            });
        }
    }

    /// Polygonal debris; a full ring, or a cone around `angle` when given
    pub fn burst_debris<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        kernel: &dyn MathKernel,
        pos: Vec2,
        tint: Tint,
        count: u32,
        angle: Option<f32>,
        force: f32,
    ) {
        for i in 0..count {
            let speed = force * rng.random_range(0.5f32..1.0);
            let vel = match angle {
                Some(a) => {
                    let theta = a + rng.random_range(-0.6f32..0.6);
                    Vec2::new(theta.cos(), theta.sin()) * speed
                }
                None => kernel.shatter_velocity(i, count, speed),
            };
            let size = rng.random_range(2.0..6.0);
            let kind = ParticleKind::Debris {
                polygon: random_polygon(rng, size),
                angle: rng.random_range(0.0..std::f32::consts::TAU),
                spin: rng.random_range(-0.3..0.3),
            };
            self.push(Particle {
                body: Body::new(pos, vel, 1.0),
                kind,
                tint,
                size,
            });
        }
    }

    /// Thin fast shards in a ring
    pub fn burst_shards<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        kernel: &dyn MathKernel,
        pos: Vec2,
        tint: Tint,
        count: u32,
        force: f32,
    ) {
        for i in 0..count {
            let vel = kernel.shatter_velocity(i, count, force * rng.random_range(0.7f32..1.3));
            let size = rng.random_range(1.5..3.5);
            let kind = ParticleKind::Shard {
                polygon: random_polygon(rng, size),
                angle: rng.random_range(0.0..std::f32::consts::TAU),
                spin: rng.random_range(-0.6..0.6),
            };
            self.push(Particle {
                body: Body::new(pos, vel, 1.0),
                kind,
                tint,
                size,
            });
        }
    }

    /// Heavy chunks thrown outward and upward
    pub fn burst_chunks<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        kernel: &dyn MathKernel,
        pos: Vec2,
        tint: Tint,
        count: u32,
        force: f32,
    ) {
        for i in 0..count {
            let mut vel = kernel.shatter_velocity(i, count, force * rng.random_range(0.6f32..1.0));
            vel.y -= force * 0.5;
            let size = rng.random_range(6.0..12.0);
            let kind = ParticleKind::Chunk {
                polygon: random_polygon(rng, size),
                angle: rng.random_range(0.0..std::f32::consts::TAU),
                spin: rng.random_range(-0.15..0.15),
            };
            self.push(Particle {
                body: Body::new(pos, vel, 1.0),
                kind,
                tint,
                size,
            });
        }
    }

    /// One trail puff
    pub fn trail(&mut self, pos: Vec2, tint: Tint, size: f32) {
        self.push(Particle {
            body: Body::new(pos, Vec2::ZERO, 1.0),
            kind: ParticleKind::Trail,
            tint,
            size,
        });
    }

    pub fn shockwave(&mut self, center: Vec2, max_width: f32, tint: Tint) {
        self.shockwaves.push(Shockwave {
            center,
            radius: 0.0,
            max_width,
            life: 1.0,
            tint,
        });
    }

    pub fn text(&mut self, pos: Vec2, text: impl Into<String>, tint: Tint) {
        self.texts.push(FloatingText {
            body: Body::new(pos, Vec2::new(0.0, -1.2), 1.0),
            text: text.into(),
            tint,
            scale: 0.0,
        });
    }

    /// Split `payload` across up to `count` souls flying to `target`
    ///
    /// Souls are never capped; the payload total is always preserved.
    pub fn souls<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        pos: Vec2,
        target: Vec2,
        payload: u64,
        count: u32,
        tint: Tint,
    ) {
        // Never more souls than points, so every delivery carries something
        let count = u64::from(count.max(1)).min(payload.max(1));
        let share = payload / count;
        let remainder = payload % count;
        for i in 0..count {
            let vel = Vec2::new(rng.random_range(-6.0..6.0), rng.random_range(-6.0..6.0));
            self.souls.push(Soul {
                body: Body::new(pos, vel, 1.0),
                target,
                payload: share + u64::from(i < remainder),
                tint,
            });
        }
    }

    /// Scatter `count` motes over the playfield
    pub fn seed_dust<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, width: f32, height: f32) {
        self.dust.clear();
        for _ in 0..count {
            let pos = Vec2::new(rng.random_range(0.0..width), rng.random_range(0.0..height));
            let vel = Vec2::new(rng.random_range(-0.3..0.3), rng.random_range(-0.3..0.3));
            self.dust.push(Dust {
                body: Body::new(pos, vel, 1.0),
                size: rng.random_range(0.5..2.0),
            });
        }
    }

    /// Advance every collection; returns payloads of souls delivered this step
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        kernel: &dyn MathKernel,
        bounds: &Bounds,
        time_scale: f32,
    ) -> Vec<u64> {
        // Shockwaves first so dust sees this step's rings
        for ring in &mut self.shockwaves {
            ring.radius += SHOCK_SPEED * time_scale;
            ring.life -= SHOCK_DECAY * time_scale;
        }
        self.shockwaves.retain(|r| r.life > 0.0);

        let mut shattered = Vec::new();
        for p in &mut self.particles {
            let outcome = p.body.integrate(p.kind.physics(), time_scale, bounds, kernel, rng);
            match &mut p.kind {
                ParticleKind::Debris { angle, spin, .. } | ParticleKind::Shard { angle, spin, .. } => {
                    *angle += *spin * time_scale;
                }
                ParticleKind::Chunk { angle, spin, .. } => {
                    *angle += *spin * time_scale;
                    if outcome.hit && outcome.impact_speed > CHUNK_SHATTER_SPEED {
                        shattered.push((p.body.pos, p.tint, outcome.impact_speed));
                        p.body.life = 0.0;
                    }
                }
                ParticleKind::Trail => {
                    p.size *= 1.0 - (1.0 - TRAIL_SHRINK) * time_scale;
                }
                ParticleKind::Spark => {}
            }
        }
        self.particles.retain(|p| p.body.is_alive());
        for (pos, tint, speed) in shattered {
            self.burst_shards(rng, kernel, pos, tint, CHUNK_SHARDS, speed * 0.6);
        }

        for label in &mut self.texts {
            label.body.integrate(&FLOATING_TEXT, time_scale, bounds, kernel, rng);
            let age = 1.0 - label.body.life_fraction();
            label.scale = ease_out_elastic((age * 3.0).min(1.0));
        }
        self.texts.retain(|t| t.body.is_alive());

        let height = bounds.floor;
        for mote in &mut self.dust {
            for ring in &self.shockwaves {
                let offset = mote.body.pos - ring.center;
                let dist = offset.length();
                if (dist - ring.radius).abs() < ring.width().max(1.0) {
                    mote.body.vel += offset.normalize_or_zero() * SHOCK_PUSH * ring.life * time_scale;
                }
            }
            mote.body.integrate(&DUST, time_scale, bounds, kernel, rng);
            mote.body.pos.x = mote.body.pos.x.rem_euclid(bounds.width);
            mote.body.pos.y = mote.body.pos.y.rem_euclid(height);
        }

        let mut delivered = Vec::new();
        for soul in &mut self.souls {
            if let Some(payload) = soul.update(time_scale) {
                delivered.push(payload);
            }
        }
        self.souls.retain(|s| s.body.is_alive());
        delivered
    }

    /// Total particle-family entity count
    pub fn len(&self) -> usize {
        self.particles.len() + self.shockwaves.len() + self.texts.len() + self.souls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PureKernel;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOUNDS: Bounds = Bounds {
        width: 1280.0,
        floor: 800.0,
    };

    fn run(effects: &mut Effects, rng: &mut Pcg32, steps: usize) -> Vec<u64> {
        let mut delivered = Vec::new();
        for _ in 0..steps {
            delivered.extend(effects.update(rng, &PureKernel, &BOUNDS, 1.0));
        }
        delivered
    }

    #[test]
    fn test_sparks_expire() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut effects = Effects::new(100);
        effects.burst_sparks(&mut rng, Vec2::new(640.0, 400.0), Tint::Palette(1), 20);
        assert_eq!(effects.particles.len(), 20);
        run(&mut effects, &mut rng, 49);
        assert_eq!(effects.particles.len(), 20);
        run(&mut effects, &mut rng, 2);
        assert!(effects.particles.is_empty());
    }

    #[test]
    fn test_cap_limits_particles_but_not_souls() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut effects = Effects::new(10);
        effects.burst_sparks(&mut rng, Vec2::ZERO, Tint::White, 50);
        effects.souls(&mut rng, Vec2::ZERO, Vec2::ONE, 40, 20, Tint::White);
        assert_eq!(effects.particles.len(), 10);
        assert_eq!(effects.souls.len(), 20);
    }

    #[test]
    fn test_no_empty_souls_when_count_exceeds_payload() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut effects = Effects::new(0);
        effects.souls(&mut rng, Vec2::ZERO, Vec2::ONE, 3, 8, Tint::White);
        assert_eq!(effects.souls.len(), 3);
        assert!(effects.souls.iter().all(|s| s.payload == 1));
    }

    #[test]
    fn test_soul_payload_split_preserves_total() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut effects = Effects::new(0);
        effects.souls(&mut rng, Vec2::ZERO, Vec2::ONE, 10, 3, Tint::White);
        let total: u64 = effects.souls.iter().map(|s| s.payload).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_souls_deliver_exactly_once() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut effects = Effects::new(0);
        effects.souls(
            &mut rng,
            Vec2::new(900.0, 700.0),
            Vec2::new(80.0, 40.0),
            10,
            5,
            Tint::Palette(0),
        );
        let delivered = run(&mut effects, &mut rng, 200);
        assert_eq!(delivered.iter().sum::<u64>(), 10);
        assert_eq!(delivered.len(), 5);
        assert!(effects.souls.is_empty());
    }

    #[test]
    fn test_soul_timeout_still_delivers() {
        let mut soul = Soul {
            body: Body::new(Vec2::new(1000.0, 1000.0), Vec2::ZERO, 0.005),
            target: Vec2::ZERO,
            payload: 4,
            tint: Tint::White,
        };
        assert_eq!(soul.update(1.0), Some(4));
        assert!(!soul.body.is_alive());
    }

    #[test]
    fn test_directional_debris_follows_angle() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut effects = Effects::new(100);
        let down = std::f32::consts::FRAC_PI_2;
        effects.burst_debris(&mut rng, &PureKernel, Vec2::new(640.0, 400.0), Tint::Ash, 20, Some(down), 8.0);
        assert!(effects.particles.iter().all(|p| p.body.vel.y > 0.0));
    }

    #[test]
    fn test_chunk_shatters_on_hard_landing() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut effects = Effects::new(100);
        effects.particles.push(Particle {
            body: Body::new(Vec2::new(640.0, 790.0), Vec2::new(0.0, 15.0), 1.0),
            kind: ParticleKind::Chunk {
                polygon: vec![Vec2::X, Vec2::Y, Vec2::NEG_X],
                angle: 0.0,
                spin: 0.0,
            },
            tint: Tint::Palette(2),
            size: 8.0,
        });
        effects.update(&mut rng, &PureKernel, &BOUNDS, 1.0);
        let shards = effects
            .particles
            .iter()
            .filter(|p| matches!(p.kind, ParticleKind::Shard { .. }))
            .count();
        assert_eq!(shards, CHUNK_SHARDS as usize);
        assert!(!effects.particles.iter().any(|p| matches!(p.kind, ParticleKind::Chunk { .. })));
    }

    #[test]
    fn test_dust_wraps_and_is_pushed_by_rings() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut effects = Effects::new(0);
        effects.dust.push(Dust {
            body: Body::new(Vec2::new(1279.0, 400.0), Vec2::new(5.0, 0.0), 1.0),
            size: 1.0,
        });
        effects.update(&mut rng, &PureKernel, &BOUNDS, 1.0);
        assert!(effects.dust[0].body.pos.x < 10.0);

        let mut effects = Effects::new(0);
        effects.dust.push(Dust {
            body: Body::new(Vec2::new(112.0, 100.0), Vec2::ZERO, 1.0),
            size: 1.0,
        });
        effects.shockwave(Vec2::new(100.0, 100.0), 10.0, Tint::White);
        effects.update(&mut rng, &PureKernel, &BOUNDS, 1.0);
        assert!(effects.dust[0].body.vel.x > 0.0);
        assert!(effects.dust[0].body.life > 0.0);
    }

    #[test]
    fn test_floating_text_pops_in_and_rises() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut effects = Effects::new(0);
        effects.text(Vec2::new(300.0, 300.0), "+10", Tint::White);
        run(&mut effects, &mut rng, 30);
        let label = &effects.texts[0];
        assert!(label.body.pos.y < 300.0);
        assert!(label.scale > 0.5);
    }
}
