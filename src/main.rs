//! Cave Crystals entry point
//!
//! Headless runner: plays a session with a simple autoplay bot, routes audio
//! cues to the log and prints a summary (or a JSON snapshot).

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use cave_crystals::audio::{AudioSink, LogAudio};
use cave_crystals::consts::FRAME_MS;
use cave_crystals::kernel::{DEFAULT_RING_SIZES, KernelChoice};
use cave_crystals::sim::{GameState, Session, TickInput, lane_pair, tick};
use cave_crystals::{QualityPreset, Settings, Tuning};

/// Run a headless Cave Crystals session
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON tuning file (missing fields keep their defaults)
    #[arg(long, value_name = "PATH")]
    tuning: Option<PathBuf>,
    /// Frames to simulate at 60 Hz
    #[arg(long, default_value_t = 3600)]
    frames: u64,
    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Particle quality preset
    #[arg(long, value_enum, default_value_t = QualityPreset::Medium)]
    quality: QualityPreset,
    /// Force the pure math kernel
    #[arg(long)]
    pure_kernel: bool,
    /// Print the final state as JSON
    #[arg(long)]
    dump: bool,
}

/// Lane the bot wants: a matching crystal under the most pressure
fn pick_lane(state: &GameState, lanes: usize) -> Option<usize> {
    (0..lanes)
        .filter_map(|lane| {
            let (near, far) = lane_pair(&state.crystals, lane)?;
            let (near, far) = (&state.crystals[near], &state.crystals[far]);
            if !near.is_spawned() || !far.is_spawned() {
                return None;
            }
            let matches = near.color == state.next_color || far.color == state.next_color;
            matches.then_some((lane, near.height + far.height))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(lane, _)| lane)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let quality = args.quality;
    let seed = args.seed.unwrap_or_else(rand::random);
    let kernel = if args.pure_kernel {
        KernelChoice::Pure
    } else {
        KernelChoice::RingTable(DEFAULT_RING_SIZES.to_vec())
    };

    let mut session = Session::new(tuning, Settings::from_preset(quality), seed).with_kernel(&kernel);
    let mut audio = LogAudio::new();
    log::info!(
        "Cave Crystals (headless) seed={seed} quality={} kernel={}",
        quality.as_str(),
        session.kernel_name()
    );

    let mut input = TickInput {
        start: true,
        ..Default::default()
    };
    let mut frames = 0;
    while frames < args.frames {
        tick(&mut session, &input, FRAME_MS);
        audio.play_events(&session.drain_events());
        frames += 1;
        if session.state.game_over_ui_visible {
            break;
        }

        input = TickInput::default();
        if let Some(lane) = pick_lane(&session.state, session.tuning.lanes) {
            input.target_lane = Some(lane as i64);
            let launcher = &session.state.launcher;
            let settled = (launcher.x - launcher.target_x(&session.tuning)).abs() < 2.0;
            let in_flight = session.state.spores.iter().any(|s| s.lane == lane);
            input.fire = launcher.target_lane == lane && settled && !in_flight;
        }
    }

    let board = &session.state.scoreboard;
    if args.dump {
        println!("{}", session.snapshot()?);
    } else {
        println!(
            "{frames} frames: phase={:?} score={} level={} combo={} critical={:.2} effects={} cues={}",
            session.state.phase,
            board.score,
            board.level,
            board.combo,
            board.critical_intensity,
            session.state.effects.len(),
            audio.played
        );
    }
    Ok(())
}
