//! Blast Grid headless runner
//!
//! Loads a map (or the built-in demo level), drives the simulation with a
//! simple seeded autopilot and prints every game event as a JSON line.
//!
//! Usage: `blast-grid [MAP] [--seed N] [--tuning FILE] [--frames N]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::process::ExitCode;

    use blast_grid::consts::SIM_DT;
    use blast_grid::map::{MapError, load_map, parse_map};
    use blast_grid::sim::{Direction, GamePhase, GameState, TickInput};
    use blast_grid::tuning::{Tuning, TuningError};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use serde::Serialize;

    const DEMO_MAP: &str = include_str!("../maps/demo.map");
    /// Two minutes at 60 frames per second
    const DEFAULT_FRAMES: u32 = 60 * 120;
    /// Frames between autopilot direction changes
    const TURN_EVERY: u32 = 30;
    /// Frames between autopilot bombs
    const BOMB_EVERY: u32 = 240;

    #[derive(Debug, thiserror::Error)]
    enum RunError {
        #[error("map: {0}")]
        Map(#[from] MapError),
        #[error("tuning: {0}")]
        Tuning(#[from] TuningError),
        #[error("bad argument: {0}")]
        Usage(String),
    }

    #[derive(Debug, Default)]
    struct Args {
        map: Option<String>,
        tuning: Option<String>,
        seed: u64,
        frames: u32,
    }

    fn parse_args() -> Result<Args, RunError> {
        let mut args = Args {
            frames: DEFAULT_FRAMES,
            ..Default::default()
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--seed" => args.seed = number(iter.next(), "--seed")?,
                "--frames" => args.frames = number(iter.next(), "--frames")?,
                "--tuning" => {
                    args.tuning =
                        Some(iter.next().ok_or_else(|| RunError::Usage("--tuning needs a path".into()))?)
                }
                other if other.starts_with("--") => {
                    return Err(RunError::Usage(format!("unknown flag {other}")));
                }
                path => args.map = Some(path.to_string()),
            }
        }
        Ok(args)
    }

    fn number<T: std::str::FromStr>(value: Option<String>, flag: &str) -> Result<T, RunError> {
        value
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| RunError::Usage(format!("{flag} needs a number")))
    }

    #[derive(Serialize)]
    struct Summary {
        phase: GamePhase,
        score: u64,
        remaining_enemies: usize,
        elapsed: f32,
    }

    /// Wander in a random direction, dropping a bomb now and then and
    /// walking away from it
    fn autopilot(frame: u32, rng: &mut Pcg32, current: &mut Direction) -> TickInput {
        let place_bomb = frame % BOMB_EVERY == 0 && frame > 0;
        if place_bomb {
            *current = current.opposite();
        } else if frame % TURN_EVERY == 0 {
            *current = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        }
        TickInput {
            direction: current.to_vec2(),
            place_bomb,
            shoot_arrow: frame % TURN_EVERY == 1,
        }
    }

    fn run() -> Result<GameState, RunError> {
        let args = parse_args()?;
        let map = match &args.map {
            Some(path) => load_map(path)?,
            None => parse_map(DEMO_MAP)?,
        };
        let tuning = match &args.tuning {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };

        let mut state = GameState::from_map(&map, tuning, args.seed);
        let mut pilot_rng = Pcg32::seed_from_u64(args.seed.wrapping_add(1));
        let mut heading = Direction::Down;

        for frame in 0..args.frames {
            let input = autopilot(frame, &mut pilot_rng, &mut heading);
            state.tick_with_input(&input, SIM_DT);
            for event in state.drain_events() {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => log::warn!("Could not encode event {event:?}: {e}"),
                }
            }
            if state.phase().is_over() {
                break;
            }
        }
        Ok(state)
    }

    pub fn main() -> ExitCode {
        env_logger::init();
        log::info!("Blast Grid (headless) starting...");

        match run() {
            Ok(state) => {
                let summary = Summary {
                    phase: state.phase(),
                    score: state.score(),
                    remaining_enemies: state.remaining_enemies(),
                    elapsed: state.elapsed,
                };
                match serde_json::to_string(&summary) {
                    Ok(line) => println!("{line}"),
                    Err(e) => log::warn!("Could not encode summary: {e}"),
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web; nothing to run here
}
