//! Presentation settings and preferences
//!
//! Nothing here changes game outcome; it only shapes how much visual
//! feedback the simulation produces.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
pub enum QualityPreset {
    Low,
    #[default]
    #[value(alias = "med")]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Maximum live particles (sparks, debris, shards, chunks, trails)
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 600,
            QualityPreset::High => 2000,
        }
    }

    /// Ambient dust motes
    pub fn dust_count(&self) -> usize {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 40,
            QualityPreset::High => 120,
        }
    }
}

/// Presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Screen shake on impacts and recoil
    pub screen_shake: bool,
    /// Particle effects (bursts, debris, trails)
    pub particles: bool,
    /// Brief freeze-frame after strong impacts
    pub hit_stop: bool,
    /// Length of one hit-stop (wall-clock ms)
    pub hit_stop_ms: f32,

    // === Accessibility ===
    /// Reduced motion (no shake, no hit-stop)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            screen_shake: true,
            particles: true,
            hit_stop: true,
            hit_stop_ms: 60.0,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective hit-stop (respects reduced_motion)
    pub fn effective_hit_stop(&self) -> bool {
        self.hit_stop && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective dust mote count
    pub fn dust_count(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.dust_count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::from_str("HIGH", true), Ok(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("med", false), Ok(QualityPreset::Medium));
        assert!(QualityPreset::from_str("ultra", true).is_err());
    }

    #[test]
    fn test_reduced_motion_overrides() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_screen_shake());
        assert!(!settings.effective_hit_stop());
    }

    #[test]
    fn test_particles_off_caps_to_zero() {
        let settings = Settings {
            particles: false,
            ..Settings::from_preset(QualityPreset::High)
        };
        assert_eq!(settings.max_particles(), 0);
        assert_eq!(settings.dust_count(), 0);
    }
}
