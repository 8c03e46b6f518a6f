//! Fixed timestep simulation tick and per-frame input routing
//!
//! `fixed_tick` advances physics and everything timed by the simulation
//! clock. `frame` runs once per rendered frame: it interpolates transforms,
//! routes pointer and button input and paces timed drops.

use super::state::{GamePhase, GameState};
use crate::view::{PieceViews, SoundSink, ViewHandle};

/// Input gathered for one rendered frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Piece under the pointer while it is held down
    pub touched: Option<ViewHandle>,
    /// Pointer lifted this frame
    pub released: bool,
    /// Drop button
    pub spawn_pressed: bool,
    /// Skill button
    pub skill_pressed: bool,
}

/// Advance the session by one fixed timestep
pub fn fixed_tick(
    state: &mut GameState,
    dt: f32,
    views: &mut dyn PieceViews,
    sound: &mut dyn SoundSink,
) {
    // The world holds still while the skill waits for a target
    if state.phase != GamePhase::Playing || state.skill.is_ready() {
        return;
    }
    state.time_ticks += 1;

    let bounds = state.field.bounds;
    let dead_line = state.field.dead_line;
    let arena = state.puzzle.arena_mut();
    arena.step(dt, bounds);
    arena.mark_settled(dt);
    let dangerous = arena.exists_above_deadline(dead_line);

    if state.gameover.tick(dt, dangerous, state.grace_seconds) {
        state.end_game(sound);
        return;
    }

    state.puzzle.advance_clears(dt, views, sound);
    state.advance_growth(dt);
    state.absorb_puzzle_events(sound);
}

/// Per-frame update. `alpha` is the fraction of a fixed step elapsed since
/// the last `fixed_tick`.
pub fn frame(
    state: &mut GameState,
    input: &FrameInput,
    dt: f32,
    alpha: f32,
    views: &mut dyn PieceViews,
    sound: &mut dyn SoundSink,
) {
    if state.phase != GamePhase::Playing {
        return;
    }

    if state.skill.is_ready() {
        if let Some(view) = input.touched {
            state.use_skill(view, views, sound);
        }
        return;
    }

    state.puzzle.sync_views(alpha, views);

    if input.skill_pressed && state.activate_skill(sound) {
        return;
    }

    if let Some(view) = input.touched {
        state.puzzle.update_selection(view, views, sound);
    }
    if input.released {
        state.puzzle.end_selection(views, sound);
        state.absorb_puzzle_events(sound);
    }
    if input.spawn_pressed {
        state.drop_piece(views, sound);
    }

    if state.spawner.tick(dt) {
        state.spawn_random(views);
    }
}
