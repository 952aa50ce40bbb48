//! Accelerated math kernels
//!
//! The simulation routes a handful of pure functions through a
//! [`MathKernel`]: growth multiplier, spore/crystal collision flags, burst
//! directions and bounce velocity. Every kernel must return exactly what the
//! pure fallback returns; kernels only change how fast the answer arrives.
//! If a kernel fails to initialize, [`select_kernel`] logs it and hands back
//! [`PureKernel`].

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kernel initialization failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    #[error("ring table kernel needs at least one ring size")]
    EmptyTable,
    #[error("ring size 0 cannot be tabulated")]
    ZeroRingSize,
}

/// Collision result bit flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionFlags(pub u8);

impl CollisionFlags {
    pub const NEAR_HIT: u8 = 1;
    pub const NEAR_MATCH: u8 = 2;
    pub const FAR_HIT: u8 = 4;
    pub const FAR_MATCH: u8 = 8;

    #[inline]
    pub fn near_hit(self) -> bool {
        self.0 & Self::NEAR_HIT != 0
    }
    #[inline]
    pub fn near_match(self) -> bool {
        self.0 & Self::NEAR_MATCH != 0
    }
    #[inline]
    pub fn far_hit(self) -> bool {
        self.0 & Self::FAR_HIT != 0
    }
    #[inline]
    pub fn far_match(self) -> bool {
        self.0 & Self::FAR_MATCH != 0
    }
    #[inline]
    pub fn any_hit(self) -> bool {
        self.near_hit() || self.far_hit()
    }
}

/// Inputs for one spore against its lane pair
#[derive(Debug, Clone, Copy)]
pub struct CollisionProbe {
    pub spore_y: f32,
    pub spore_radius: f32,
    pub spore_color: usize,
    pub near_height: f32,
    pub near_color: usize,
    pub far_height: f32,
    pub far_color: usize,
    /// Playfield extent between the near and far walls
    pub extent: f32,
}

/// Reference implementations every kernel must agree with
pub mod pure {
    use super::*;

    #[inline]
    pub fn growth_multiplier(score: u64, divisor: f32) -> f32 {
        1.0 + score as f32 / divisor
    }

    pub fn collision_flags(p: &CollisionProbe) -> CollisionFlags {
        let mut flags = 0;
        if p.spore_y - p.spore_radius < p.near_height {
            flags |= CollisionFlags::NEAR_HIT;
            if p.spore_color == p.near_color {
                flags |= CollisionFlags::NEAR_MATCH;
            }
        }
        if p.spore_y + p.spore_radius > p.extent - p.far_height {
            flags |= CollisionFlags::FAR_HIT;
            if p.spore_color == p.far_color {
                flags |= CollisionFlags::FAR_MATCH;
            }
        }
        CollisionFlags(flags)
    }

    /// Unit direction for slot `index` of an evenly spaced ring
    #[inline]
    pub fn ring_direction(index: u32, total: u32) -> Vec2 {
        let angle = index as f32 / total.max(1) as f32 * std::f32::consts::TAU;
        Vec2::new(angle.cos(), angle.sin())
    }

    #[inline]
    pub fn shatter_velocity(index: u32, total: u32, force: f32) -> Vec2 {
        ring_direction(index, total) * force
    }

    #[inline]
    pub fn bounce_velocity(v: f32, damping: f32) -> f32 {
        -v * damping
    }
}

/// Swappable math backend
pub trait MathKernel: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn growth_multiplier(&self, score: u64, divisor: f32) -> f32 {
        pure::growth_multiplier(score, divisor)
    }

    fn collision_flags(&self, probe: &CollisionProbe) -> CollisionFlags {
        pure::collision_flags(probe)
    }

    fn shatter_velocity(&self, index: u32, total: u32, force: f32) -> Vec2 {
        pure::shatter_velocity(index, total, force)
    }

    fn bounce_velocity(&self, v: f32, damping: f32) -> f32 {
        pure::bounce_velocity(v, damping)
    }
}

/// Always-available fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct PureKernel;

impl MathKernel for PureKernel {
    fn name(&self) -> &'static str {
        "pure"
    }
}

/// Precomputed ring directions for the burst sizes the game actually uses
#[derive(Debug, Clone)]
pub struct RingTableKernel {
    rings: Vec<(u32, Vec<Vec2>)>,
}

impl RingTableKernel {
    pub fn new(sizes: &[u32]) -> Result<Self, KernelError> {
        if sizes.is_empty() {
            return Err(KernelError::EmptyTable);
        }
        if sizes.contains(&0) {
            return Err(KernelError::ZeroRingSize);
        }
        let rings = sizes
            .iter()
            .map(|&total| {
                let dirs = (0..total).map(|i| pure::ring_direction(i, total)).collect();
                (total, dirs)
            })
            .collect();
        Ok(Self { rings })
    }

    fn lookup(&self, index: u32, total: u32) -> Option<Vec2> {
        self.rings
            .iter()
            .find(|(size, _)| *size == total)
            .and_then(|(_, dirs)| dirs.get(index as usize).copied())
    }
}

impl MathKernel for RingTableKernel {
    fn name(&self) -> &'static str {
        "ring-table"
    }

    fn shatter_velocity(&self, index: u32, total: u32, force: f32) -> Vec2 {
        match self.lookup(index, total) {
            Some(dir) => dir * force,
            None => pure::shatter_velocity(index, total, force),
        }
    }
}

/// Burst sizes spawned by the effect catalog
pub const DEFAULT_RING_SIZES: [u32; 6] = [5, 8, 12, 20, 24, 40];

/// Which kernel to try at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelChoice {
    Pure,
    RingTable(Vec<u32>),
}

impl Default for KernelChoice {
    fn default() -> Self {
        KernelChoice::RingTable(DEFAULT_RING_SIZES.to_vec())
    }
}

/// Initialize the requested kernel, falling back to [`PureKernel`] on failure
pub fn select_kernel(choice: &KernelChoice) -> Box<dyn MathKernel> {
    match choice {
        KernelChoice::Pure => Box::new(PureKernel),
        KernelChoice::RingTable(sizes) => match RingTableKernel::new(sizes) {
            Ok(kernel) => {
                log::info!("Math kernel: ring-table ({} rings)", sizes.len());
                Box::new(kernel)
            }
            Err(e) => {
                log::warn!("Ring-table kernel unavailable ({e}), using pure fallback");
                Box::new(PureKernel)
            }
        },
    }
}
