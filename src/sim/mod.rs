//! Simulation module
//!
//! All gameplay and feedback-state logic lives here:
//! - Variable timestep, clamped to a maximum per tick
//! - Per-frame constants scaled by the global time scale
//! - Timers on raw milliseconds
//! - No rendering or platform dependencies

pub mod collision;
pub mod dilation;
pub mod integrator;
pub mod launcher;
pub mod particles;
pub mod scoring;
pub mod state;
pub mod tick;

pub use collision::Resolution;
pub use dilation::TimeDilation;
pub use integrator::{Body, Bounds, Physics};
pub use launcher::Launcher;
pub use particles::{Dust, Effects, FloatingText, Particle, ParticleKind, Shockwave, Soul, Tint};
pub use scoring::{MatchOutcome, Scoreboard};
pub use state::{Crystal, GameEvent, GamePhase, GameState, Side, Spore, lane_pair};
pub use tick::{Session, TickInput, tick};
