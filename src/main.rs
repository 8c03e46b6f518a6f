//! Disc Chain headless demo
//!
//! Plays one seeded session with a greedy autoplayer and reports the result.
//!
//! Usage: `disc-chain [tuning.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
use disc_chain::sim::{FrameInput, GameEvent, GamePhase, GameState};

/// Rendered frame length the demo pretends to run at
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after this much simulated time
#[cfg(not(target_arch = "wasm32"))]
const MAX_SECONDS: f32 = 600.0;

/// Builds chains greedily: start anywhere settled, extend while anything
/// reachable connects to the tail, release when stuck.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
struct Autoplayer {
    next_start: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl Autoplayer {
    fn decide(&mut self, state: &GameState) -> FrameInput {
        let puzzle = state.puzzle();

        if state.skill().is_ready() {
            // Spend the wildcard on the highest normal piece
            let target = puzzle
                .pieces()
                .iter()
                .filter(|p| !p.deleting && !p.is_wildcard())
                .max_by(|a, b| {
                    let ya = puzzle.arena().position(a.physics).y;
                    let yb = puzzle.arena().position(b.physics).y;
                    ya.total_cmp(&yb)
                });
            return FrameInput {
                touched: target.map(|p| p.view),
                ..Default::default()
            };
        }
        if state.skill().is_charged() && !puzzle.is_selecting() {
            return FrameInput {
                skill_pressed: true,
                ..Default::default()
            };
        }

        if puzzle.is_selecting() {
            let next = puzzle
                .pieces()
                .iter()
                .find(|p| p.highlighted && puzzle.can_connect(p.key));
            return match next {
                Some(piece) => FrameInput {
                    touched: Some(piece.view),
                    ..Default::default()
                },
                None => FrameInput {
                    released: true,
                    ..Default::default()
                },
            };
        }

        let candidates: Vec<_> = puzzle
            .pieces()
            .iter()
            .filter(|p| !p.deleting && puzzle.arena().is_settled(p.physics))
            .collect();
        if candidates.is_empty() {
            return FrameInput::default();
        }
        self.next_start = (self.next_start + 1) % candidates.len();
        FrameInput {
            touched: Some(candidates[self.next_start].view),
            ..Default::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn report(event: &GameEvent) {
    match event {
        GameEvent::ScoreGained { points, total } => log::info!("+{points} (total {total})"),
        GameEvent::ChainCleared { length, bombs } => {
            log::debug!("Chain of {length} cleared, {bombs} caught in blast")
        }
        GameEvent::PieceEvolved { kind, .. } => log::debug!("Evolved into kind {kind}"),
        GameEvent::SkillCharged => log::info!("Skill charged"),
        GameEvent::SkillReady => log::debug!("Skill armed"),
        GameEvent::SkillUsed { .. } => log::info!("Wildcard created"),
        GameEvent::GameOver { score } => log::info!("Game over, final score {score}"),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use disc_chain::consts::{MAX_SUBSTEPS, SIM_DT};
    use disc_chain::sim::{fixed_tick, frame};
    use disc_chain::{NullViews, Silent, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Disc Chain (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::error!("Failed to load tuning from {path}: {err}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);

    let mut state = GameState::new(&tuning, seed);
    let mut views = NullViews::default();
    let mut sound = Silent;
    let mut player = Autoplayer::default();
    state.start(&mut views);

    let wall_clock = std::time::Instant::now();
    let mut accumulator = 0.0f32;
    let mut elapsed = 0.0f32;
    while state.phase == GamePhase::Playing && elapsed < MAX_SECONDS {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            fixed_tick(&mut state, SIM_DT, &mut views, &mut sound);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        let input = player.decide(&state);
        frame(
            &mut state,
            &input,
            FRAME_DT,
            accumulator / SIM_DT,
            &mut views,
            &mut sound,
        );
        for event in state.drain_events() {
            report(&event);
        }
    }

    if state.phase == GamePhase::Playing {
        log::info!("Time limit reached");
    }
    println!(
        "Score {} after {:.1}s simulated ({} ticks, {:.2?} wall clock)",
        state.score,
        elapsed,
        state.time_ticks,
        wall_clock.elapsed()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is embedded by a host page; there is no standalone wasm demo
}
