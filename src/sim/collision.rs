//! Crystal growth and spore resolution
//!
//! One call to [`advance`] per unfrozen tick grows every crystal, checks the
//! game-over predicate and resolves spores against their lane pair. Nothing
//! here touches score or effects; callers interpret the returned
//! [`Resolution`]s.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Crystal, Side, Spore, lane_pair};
use crate::Tuning;
use crate::kernel::{CollisionProbe, MathKernel};

/// Squash applied to a crystal on a match (wider, shorter)
const MATCH_SQUASH: Vec2 = Vec2::new(0.25, -0.35);
/// Sideways jolt on a mismatch
const MISMATCH_JOLT: Vec2 = Vec2::new(0.4, 0.0);

/// Outcome of one side of a spore hit, or the end of the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    MatchResolved {
        lane: usize,
        side: Side,
        point: Vec2,
        color: usize,
    },
    MismatchResolved {
        lane: usize,
        side: Side,
        point: Vec2,
    },
    GameOver {
        lane: usize,
    },
}

/// Height every crystal gains this tick
pub fn current_growth(kernel: &dyn MathKernel, tuning: &Tuning, score: u64, time_scale: f32) -> f32 {
    tuning.base_growth_rate * kernel.growth_multiplier(score, tuning.progression_divisor) * time_scale
}

/// Grow all crystals, deferred ones included
pub fn grow_crystals(crystals: &mut [Crystal], amount: f32) {
    for crystal in crystals {
        crystal.height += amount;
    }
}

/// First lane whose pair meets across the playfield
///
/// Every lane is checked; lanes with a crystal still waiting to spawn are
/// skipped, as are lanes missing a side.
pub fn overflowing_lane(crystals: &[Crystal], tuning: &Tuning) -> Option<usize> {
    let mut hit = None;
    for lane in 0..tuning.lanes {
        let Some((near, far)) = lane_pair(crystals, lane) else {
            continue;
        };
        let (near, far) = (&crystals[near], &crystals[far]);
        if !near.is_spawned() || !far.is_spawned() {
            continue;
        }
        if near.height + far.height >= tuning.screen_height && hit.is_none() {
            hit = Some(lane);
        }
    }
    hit
}

pub fn expand_spores(spores: &mut [Spore], tuning: &Tuning, time_scale: f32) {
    for spore in spores.iter_mut().filter(|s| s.active) {
        spore.radius += tuning.spore_expand_rate * time_scale;
    }
}

/// Resolve every active spore against its lane pair
///
/// A spore that hits either side is consumed this tick, even if both sides
/// resolve. Spores in a lane without a full pair are left alone.
pub fn resolve_spores<R: Rng + ?Sized>(
    crystals: &mut [Crystal],
    spores: &mut Vec<Spore>,
    kernel: &dyn MathKernel,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<Resolution> {
    let extent = tuning.screen_height;
    let mut out = Vec::new();

    for spore in spores.iter_mut().filter(|s| s.active) {
        let Some((ni, fi)) = lane_pair(crystals, spore.lane) else {
            continue;
        };
        let flags = kernel.collision_flags(&CollisionProbe {
            spore_y: spore.pos.y,
            spore_radius: spore.radius,
            spore_color: spore.color,
            near_height: crystals[ni].height,
            near_color: crystals[ni].color,
            far_height: crystals[fi].height,
            far_color: crystals[fi].color,
            extent,
        });
        if !flags.any_hit() {
            continue;
        }

        let sides = [
            (ni, flags.near_hit(), flags.near_match()),
            (fi, flags.far_hit(), flags.far_match()),
        ];
        for (idx, hit, matched) in sides {
            if !hit {
                continue;
            }
            let crystal = &mut crystals[idx];
            let point = Vec2::new(spore.pos.x, crystal.face_y(extent));
            if matched {
                crystal.height = (crystal.height - tuning.shrink_amount).max(tuning.min_height);
                crystal.color = rng.random_range(0..tuning.palette_size);
                crystal.flash = 1.0;
                crystal.impulse(MATCH_SQUASH);
                out.push(Resolution::MatchResolved {
                    lane: spore.lane,
                    side: crystal.side,
                    point,
                    color: spore.color,
                });
            } else {
                crystal.height += tuning.penalty_growth;
                crystal.impulse(MISMATCH_JOLT);
                out.push(Resolution::MismatchResolved {
                    lane: spore.lane,
                    side: crystal.side,
                    point,
                });
            }
        }
        spore.active = false;
    }

    spores.retain(|s| s.active);
    out
}

/// Growth, game-over check, then spore resolution
///
/// On game-over the spores are left untouched and the only resolution is
/// [`Resolution::GameOver`].
pub fn advance<R: Rng + ?Sized>(
    crystals: &mut [Crystal],
    spores: &mut Vec<Spore>,
    kernel: &dyn MathKernel,
    tuning: &Tuning,
    score: u64,
    time_scale: f32,
    rng: &mut R,
) -> Vec<Resolution> {
    let growth = current_growth(kernel, tuning, score, time_scale);
    grow_crystals(crystals, growth);
    for crystal in crystals.iter_mut() {
        crystal.update_spring(time_scale);
    }

    if let Some(lane) = overflowing_lane(crystals, tuning) {
        return vec![Resolution::GameOver { lane }];
    }

    expand_spores(spores, tuning, time_scale);
    resolve_spores(crystals, spores, kernel, tuning, rng)
}
