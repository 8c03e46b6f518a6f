//! Game session state
//!
//! Everything one run owns: the puzzle world, loss timer, skill meter, drop
//! pacing, seeded RNG and score. Driven by [`super::tick`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::gameover::GameoverMonitor;
use super::piece::PieceKey;
use super::puzzle::{Puzzle, PuzzleEvent};
use super::skill::SkillMeter;
use super::spawn::SpawnTimer;
use crate::lerp;
use crate::tuning::{FieldTuning, KindId, Tuning};
use crate::view::{PieceViews, SoundEffect, SoundSink, ViewHandle};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Created, waiting for `start`
    Ready,
    Playing,
    GameOver,
}

/// Things the embedder may want to react to (UI, effects, analytics)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScoreGained { points: u64, total: u64 },
    ChainCleared { length: usize, bombs: usize },
    PieceEvolved { key: PieceKey, kind: KindId },
    /// Skill meter just filled
    SkillCharged,
    /// Skill armed; the next touched piece becomes a wildcard
    SkillReady,
    SkillUsed { key: PieceKey },
    GameOver { score: u64 },
}

/// An evolved piece growing from its old size to its new one
#[derive(Debug, Clone, Copy)]
struct Growth {
    key: PieceKey,
    from: f32,
    to: f32,
    elapsed: f32,
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    pub score: u64,
    /// Fixed ticks simulated so far
    pub time_ticks: u64,
    pub(super) field: FieldTuning,
    pub(super) grace_seconds: f32,
    pub(super) growth_seconds: f32,
    pub(super) puzzle: Puzzle,
    pub(super) gameover: GameoverMonitor,
    pub(super) skill: SkillMeter,
    pub(super) spawner: SpawnTimer,
    rng: Pcg32,
    growth: Vec<Growth>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a session in the `Ready` phase
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Ready,
            score: 0,
            time_ticks: 0,
            field: tuning.field,
            grace_seconds: tuning.game.game_over_grace_seconds,
            growth_seconds: tuning.game.evolution_growth_seconds,
            puzzle: Puzzle::new(tuning),
            gameover: GameoverMonitor::new(),
            skill: SkillMeter::new(tuning.game.max_skill_points),
            spawner: SpawnTimer::new(&tuning.game),
            rng: Pcg32::seed_from_u64(seed),
            growth: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn skill(&self) -> &SkillMeter {
        &self.skill
    }

    pub fn field(&self) -> &FieldTuning {
        &self.field
    }

    /// Fraction of the loss grace period used, for the dead-line warning
    pub fn danger_progress(&self) -> f32 {
        self.gameover.grace_progress(self.grace_seconds)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Ready -> Playing, dropping the opening pieces
    pub fn start(&mut self, views: &mut dyn PieceViews) {
        if self.phase != GamePhase::Ready {
            log::warn!("start() called in {:?}, ignored", self.phase);
            return;
        }
        self.phase = GamePhase::Playing;
        self.spawner.reset();
        for _ in 0..self.puzzle.rules().game().initial_piece_count {
            self.spawn_random(views);
        }
        log::info!("Run started with seed {}", self.seed);
    }

    /// Drop a random low-level piece from a random spot along the top
    pub fn spawn_random(&mut self, views: &mut dyn PieceViews) -> Option<PieceKey> {
        let kind = self.puzzle.rules().random_kind(&mut self.rng);
        let position = self.random_spawn_position();
        self.puzzle.create_piece(kind, position, views)
    }

    /// Player-requested drop
    pub fn drop_piece(&mut self, views: &mut dyn PieceViews, sound: &mut dyn SoundSink) {
        sound.play(SoundEffect::Drop);
        self.spawn_random(views);
    }

    fn random_spawn_position(&mut self) -> Vec2 {
        let bounds = self.field.bounds;
        let inset = self.puzzle.rules().catalog().max_radius();
        let (lo, hi) = (bounds.left + inset, bounds.right - inset);
        let x = if lo < hi {
            self.rng.random_range(lo..hi)
        } else {
            (bounds.left + bounds.right) * 0.5
        };
        Vec2::new(x, self.field.spawn_height)
    }

    /// Spend a full skill meter. The next touched piece becomes a wildcard.
    pub fn activate_skill(&mut self, sound: &mut dyn SoundSink) -> bool {
        if !self.skill.try_activate() {
            return false;
        }
        sound.play(SoundEffect::SkillActivated);
        self.events.push(GameEvent::SkillReady);
        log::debug!("Skill armed");
        true
    }

    /// Use the armed skill on the piece under `view`
    pub fn use_skill(
        &mut self,
        view: ViewHandle,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) -> bool {
        if !self.skill.is_ready() {
            return false;
        }
        let Some(key) = self.puzzle.convert_to_wildcard(view, views) else {
            return false;
        };
        self.skill.complete();
        sound.play(SoundEffect::SkillUsed);
        self.events.push(GameEvent::SkillUsed { key });
        true
    }

    pub(super) fn end_game(&mut self, sound: &mut dyn SoundSink) {
        self.phase = GamePhase::GameOver;
        sound.play(SoundEffect::GameOver);
        self.events.push(GameEvent::GameOver { score: self.score });
        log::info!(
            "Game over after {} ticks with score {}",
            self.time_ticks,
            self.score
        );
    }

    /// Ramp evolved pieces toward their full radius
    pub(super) fn advance_growth(&mut self, dt: f32) {
        let seconds = self.growth_seconds;
        let puzzle = &mut self.puzzle;
        self.growth.retain_mut(|growth| {
            growth.elapsed += dt;
            let t = if seconds > 0.0 {
                (growth.elapsed / seconds).min(1.0)
            } else {
                1.0
            };
            puzzle.set_piece_radius(growth.key, lerp(growth.from, growth.to, t)) && t < 1.0
        });
    }

    /// Turn puzzle outcomes into score, skill points and session events
    pub(super) fn absorb_puzzle_events(&mut self, sound: &mut dyn SoundSink) {
        let events: Vec<PuzzleEvent> = self.puzzle.drain_events().collect();
        for event in events {
            match event {
                PuzzleEvent::PieceCleared(_) => {
                    if self.skill.add(1) {
                        sound.play(SoundEffect::SkillCharged);
                        self.events.push(GameEvent::SkillCharged);
                    }
                }
                PuzzleEvent::Exploded { count } => {
                    log::debug!("Blast caught {count} pieces");
                }
                PuzzleEvent::Evolved {
                    key,
                    from_radius,
                    to_radius,
                } => {
                    self.growth.push(Growth {
                        key,
                        from: from_radius,
                        to: to_radius,
                        elapsed: 0.0,
                    });
                    if let Some(piece) = self.puzzle.pieces().get(key) {
                        self.events.push(GameEvent::PieceEvolved {
                            key,
                            kind: piece.kind,
                        });
                    }
                }
                PuzzleEvent::ChainResolved {
                    length,
                    bombs,
                    score,
                } => {
                    self.score += score;
                    self.events.push(GameEvent::ChainCleared { length, bombs });
                    self.events.push(GameEvent::ScoreGained {
                        points: score,
                        total: self.score,
                    });
                }
            }
        }
    }
}
