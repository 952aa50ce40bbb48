//! Audio cue dispatch
//!
//! The simulation only decides *which* sounds happen; synthesis belongs to
//! whatever [`AudioSink`] the frame loop plugs in. Cues are fire-and-forget.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundEffect {
    /// Spore fired
    Shoot,
    /// Color match; pitch multiplier rises with the combo
    Match { pitch: f32 },
    /// Wrong color fed into a crystal
    Mismatch,
    /// New level reached
    LevelUp,
    /// Run ended
    GameOver,
    /// Critical-mass alarm pulse
    Heartbeat,
}

impl SoundEffect {
    /// Map a simulation event to its cue, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::Shoot { .. } => Some(SoundEffect::Shoot),
            GameEvent::Match { pitch, .. } => Some(SoundEffect::Match { pitch }),
            GameEvent::Mismatch { .. } => Some(SoundEffect::Mismatch),
            GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::Heartbeat { .. } => Some(SoundEffect::Heartbeat),
            GameEvent::ScoreDelivered { .. } => None,
        }
    }
}

/// Receives sound cues
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Forward every cue-bearing event
    fn play_events(&mut self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.play(effect);
        }
    }
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Writes cues to the log and counts them (headless runs)
#[derive(Debug)]
pub struct LogAudio {
    master_volume: f32,
    muted: bool,
    /// Cues played so far
    pub played: u64,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAudio {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            muted: false,
            played: 0,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.played += 1;
        match effect {
            SoundEffect::Heartbeat => log::trace!("♪ {:?} @ {:.2}", effect, vol),
            _ => log::debug!("♪ {:?} @ {:.2}", effect, vol),
        }
    }
}
