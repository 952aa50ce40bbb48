//! Cave Crystals - A lane-based crystal matching arcade game
//!
//! Core modules:
//! - `sim`: Simulation (growth, collisions, scoring, time dilation, particles)
//! - `tuning`: Data-driven game balance
//! - `settings`: Presentation preferences (particle caps, shake, hit-stop)
//! - `kernel`: Optional accelerated math with a pure fallback
//! - `audio`: Sound cue sink used by the frame loop

pub mod audio;
pub mod kernel;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{QualityPreset, Settings};
pub use tuning::{ScoreCrediting, Tuning};

/// Game configuration constants
pub mod consts {
    /// Number of lanes when no tuning file says otherwise
    pub const DEFAULT_LANES: usize = 7;

    /// Reference playfield size (pixels)
    pub const SCREEN_WIDTH: f32 = 1280.0;
    pub const SCREEN_HEIGHT: f32 = 800.0;

    /// Largest frame delta fed to the simulation (tab backgrounding guard)
    pub const MAX_DT_MS: f32 = 100.0;
    /// Nominal frame length the per-frame constants were tuned at
    pub const FRAME_MS: f32 = 1000.0 / 60.0;

    /// Spore radius at the moment of firing
    pub const SPORE_START_RADIUS: f32 = 10.0;

    /// Fresh crystals start somewhere in [min, min + spread)
    pub const CRYSTAL_START_HEIGHT_MIN: f32 = 20.0;
    pub const CRYSTAL_START_HEIGHT_SPREAD: f32 = 60.0;

    /// Crystal palette
    pub const PALETTE: [PaletteColor; 5] = [
        PaletteColor { name: "Ruby", hex: "#FF0055" },
        PaletteColor { name: "Emerald", hex: "#00FF66" },
        PaletteColor { name: "Sapphire", hex: "#00CCFF" },
        PaletteColor { name: "Amethyst", hex: "#CC00FF" },
        PaletteColor { name: "Amber", hex: "#FFAA00" },
    ];

    /// Named palette entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PaletteColor {
        pub name: &'static str,
        pub hex: &'static str,
    }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Exponential approach toward zero, frame-rate independent
///
/// `per_frame` is the factor kept per nominal 60 Hz frame.
#[inline]
pub fn decay(value: f32, per_frame: f32, dt_ms: f32) -> f32 {
    let v = value * per_frame.powf(dt_ms / consts::FRAME_MS);
    if v.abs() < 0.001 { 0.0 } else { v }
}

/// Elastic ease-out on [0, 1] (overshoots then settles at 1)
pub fn ease_out_elastic(t: f32) -> f32 {
    use std::f32::consts::TAU;
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let c4 = TAU / 3.0;
    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}
