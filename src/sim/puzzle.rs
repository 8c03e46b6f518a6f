//! Drag selection, reachability highlighting and chain resolution
//!
//! A gesture starts on the first touched piece, grows while the player drags
//! over connectable pieces, shrinks when they drag back over the previous
//! piece, and ends on release. Long enough chains are handed to a clear
//! sequence that deletes members one by one on the fixed tick, blows up
//! anything caught in a wildcard blast, spawns the evolved piece and reports
//! the score.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;

use super::arena::PhysicsArena;
use super::chain::ChainTracker;
use super::piece::{Piece, PieceKey, PieceRegistry};
use super::rules::PuzzleRules;
use crate::tuning::{KindId, Tuning};
use crate::view::{PieceViews, SoundEffect, SoundSink, ViewHandle};

/// Outcomes the session turns into score, skill points and effects
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleEvent {
    /// A chain member played its delete step
    PieceCleared(PieceKey),
    /// Wildcard blast caught `count` extra pieces
    Exploded { count: usize },
    /// Evolved piece spawned; its radius should grow from `from_radius` to `to_radius`
    Evolved {
        key: PieceKey,
        from_radius: f32,
        to_radius: f32,
    },
    ChainResolved {
        length: usize,
        bombs: usize,
        score: u64,
    },
}

/// A committed chain being deleted piece by piece
#[derive(Debug, Clone)]
struct ClearSequence {
    chain: Vec<Piece>,
    bombs: Vec<Piece>,
    /// Next chain member to delete
    next: usize,
    /// Seconds until the next delete step
    countdown: f32,
    evolve_from: Option<KindId>,
    evolve_position: Vec2,
}

/// Selection state machine plus the world it selects from
#[derive(Debug)]
pub struct Puzzle {
    rules: PuzzleRules,
    arena: PhysicsArena,
    pieces: PieceRegistry,
    chain: ChainTracker,
    locked_kind: Option<KindId>,
    selecting: bool,
    clearing: Vec<ClearSequence>,
    events: Vec<PuzzleEvent>,
    // Scratch space reused across calls
    visited: HashSet<PieceKey>,
    queue: VecDeque<PieceKey>,
    nearby: Vec<usize>,
}

impl Puzzle {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            rules: PuzzleRules::new(tuning),
            arena: PhysicsArena::new(tuning.physics),
            pieces: PieceRegistry::new(),
            chain: ChainTracker::new(),
            locked_kind: None,
            selecting: false,
            clearing: Vec::new(),
            events: Vec::new(),
            visited: HashSet::new(),
            queue: VecDeque::new(),
            nearby: Vec::new(),
        }
    }

    pub fn rules(&self) -> &PuzzleRules {
        &self.rules
    }

    pub fn arena(&self) -> &PhysicsArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut PhysicsArena {
        &mut self.arena
    }

    pub fn pieces(&self) -> &PieceRegistry {
        &self.pieces
    }

    pub fn chain(&self) -> &[PieceKey] {
        self.chain.as_slice()
    }

    pub fn locked_kind(&self) -> Option<KindId> {
        self.locked_kind
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    /// Whether any clear sequence is still running
    pub fn is_clearing(&self) -> bool {
        !self.clearing.is_empty()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = PuzzleEvent> + '_ {
        self.events.drain(..)
    }

    /// Kind the chain is collecting: the lock, or the first member's kind
    pub fn selecting_kind(&self) -> Option<KindId> {
        self.locked_kind.or_else(|| {
            let first = *self.chain.as_slice().first()?;
            self.pieces.get(first).map(|p| p.kind)
        })
    }

    pub fn create_piece(
        &mut self,
        kind: KindId,
        position: Vec2,
        views: &mut dyn PieceViews,
    ) -> Option<PieceKey> {
        self.pieces
            .spawn(kind, position, &mut self.arena, self.rules.catalog(), views)
    }

    /// Resize a live, non-deleting piece. Returns false once it is gone.
    pub fn set_piece_radius(&mut self, key: PieceKey, radius: f32) -> bool {
        match self.pieces.get(key) {
            Some(piece) if !piece.deleting => {
                self.arena.set_radius(piece.physics, radius);
                true
            }
            _ => false,
        }
    }

    /// Push interpolated transforms to every view
    pub fn sync_views(&self, alpha: f32, views: &mut dyn PieceViews) {
        for piece in self.pieces.iter() {
            views.update_transform(
                piece.view,
                self.arena.interpolated_position(piece.physics, alpha),
                self.arena.interpolated_rotation(piece.physics, alpha),
            );
        }
    }

    /// Route a touch on `view`: start a gesture or extend the current one
    pub fn update_selection(
        &mut self,
        view: ViewHandle,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) {
        let Some(key) = self.pieces.by_view(view) else {
            return;
        };
        if self.selecting {
            self.extend_selection(key, views, sound);
        } else {
            self.begin_selection(key, views, sound);
            self.update_selectable_highlight(views);
        }
    }

    pub fn begin_selection(
        &mut self,
        key: PieceKey,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) {
        let Some(piece) = self.pieces.get(key) else {
            return;
        };
        if piece.deleting {
            return;
        }
        self.locked_kind = (!piece.is_wildcard()).then_some(piece.kind);
        self.selecting = true;
        self.chain.clear();
        self.chain.append(key, &self.pieces, &self.arena, &self.rules);
        self.select(key, views, sound);
        self.update_line(views);
    }

    pub fn extend_selection(
        &mut self,
        key: PieceKey,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) {
        let Some(piece) = self.pieces.get(key) else {
            return;
        };
        if piece.deleting {
            return;
        }
        let Some(tail) = self.chain.last().and_then(|k| self.pieces.get(k)) else {
            return;
        };
        let wildcard_involved = piece.is_wildcard() || tail.is_wildcard();
        if !wildcard_involved && self.selecting_kind() != Some(piece.kind) {
            return;
        }

        // Dragging back over the previous piece undoes the tail
        if self.chain.second_to_last() == Some(key) {
            if let Some(removed) = self.chain.remove_last() {
                self.unselect(removed, views);
            }
            self.locked_kind = self.recompute_lock();
            self.update_line(views);
            return;
        }

        if self.chain.contains(key) {
            return;
        }
        let Some(lock) = self.connection_lock(key) else {
            return;
        };
        if self.chain.append(key, &self.pieces, &self.arena, &self.rules) {
            self.locked_kind = lock;
            self.select(key, views, sound);
            self.update_line(views);
        }
    }

    /// Whether `key` may become the new chain tail right now
    pub fn can_connect(&self, key: PieceKey) -> bool {
        self.connection_lock(key).is_some()
    }

    /// Lock in force after appending `key`, or `None` if it cannot follow the tail
    fn connection_lock(&self, key: PieceKey) -> Option<Option<KindId>> {
        let tail = self.pieces.get(self.chain.last()?)?;
        let candidate = self.pieces.get(key)?;
        let lock = lock_after(self.locked_kind, tail, candidate)?;
        let within = self.rules.can_connect(
            self.arena.position(tail.physics),
            self.arena.position(candidate.physics),
        );
        within.then_some(lock)
    }

    /// Lock implied by the remaining members: unset if they disagree or are all wildcards
    fn recompute_lock(&self) -> Option<KindId> {
        let mut found = None;
        for piece in self.chain.as_slice().iter().filter_map(|&k| self.pieces.get(k)) {
            if piece.is_wildcard() {
                continue;
            }
            match found {
                None => found = Some(piece.kind),
                Some(kind) if kind != piece.kind => return None,
                Some(_) => {}
            }
        }
        found
    }

    pub fn end_selection(&mut self, views: &mut dyn PieceViews, sound: &mut dyn SoundSink) {
        if !self.selecting {
            return;
        }
        self.selecting = false;
        self.clear_highlights(views);

        let chain = self.chain.take();
        if chain.len() >= self.rules.min_chain_to_clear() {
            let interval = self.rules.game().chain_clear_interval;
            views.fix_chain_line(chain.len() as f32 * interval);
            self.resolve_chain(&chain, views, sound);
        } else {
            views.update_chain_line(&[]);
            for key in chain {
                self.unselect(key, views);
            }
        }
        self.locked_kind = None;
        self.update_selectable_highlight(views);
    }

    /// Breadth-first search from the chain tail, highlighting every piece the
    /// chain could still reach under the current lock
    pub fn update_selectable_highlight(&mut self, views: &mut dyn PieceViews) {
        self.clear_highlights(views);
        if !self.selecting {
            return;
        }
        let Some(start) = self.chain.last() else {
            return;
        };

        self.visited.clear();
        self.visited.extend(self.chain.as_slice().iter().copied());
        self.queue.clear();
        self.queue.push_back(start);

        while let Some(current_key) = self.queue.pop_front() {
            let Some(current) = self.pieces.get(current_key) else {
                continue;
            };
            let current_pos = self.arena.position(current.physics);
            for neighbor in self.pieces.iter() {
                if neighbor.deleting || self.visited.contains(&neighbor.key) {
                    continue;
                }
                if !self
                    .rules
                    .can_connect(current_pos, self.arena.position(neighbor.physics))
                {
                    continue;
                }
                if highlight_compatible(self.locked_kind, current, neighbor) {
                    self.visited.insert(neighbor.key);
                    self.queue.push_back(neighbor.key);
                }
            }
        }

        for piece in self.pieces.iter_mut() {
            if self.visited.contains(&piece.key) && !self.chain.contains(piece.key) {
                piece.highlighted = true;
                views.set_highlight(piece.view, true);
            }
        }
    }

    fn clear_highlights(&mut self, views: &mut dyn PieceViews) {
        for piece in self.pieces.iter_mut() {
            piece.highlighted = false;
            views.set_highlight(piece.view, false);
        }
    }

    fn select(&mut self, key: PieceKey, views: &mut dyn PieceViews, sound: &mut dyn SoundSink) {
        if let Some(piece) = self.pieces.get_mut(key) {
            piece.selected = true;
            views.set_selected(piece.view, true);
            sound.play(SoundEffect::Selected);
        }
    }

    fn unselect(&mut self, key: PieceKey, views: &mut dyn PieceViews) {
        if let Some(piece) = self.pieces.get_mut(key) {
            piece.selected = false;
            views.set_selected(piece.view, false);
        }
    }

    fn update_line(&self, views: &mut dyn PieceViews) {
        let line: Vec<ViewHandle> = self
            .chain
            .as_slice()
            .iter()
            .filter_map(|&k| self.pieces.get(k).map(|p| p.view))
            .collect();
        views.update_chain_line(&line);
    }

    /// Commit a chain to clearing. Members are pinned and flagged deleting at
    /// once; the first delete step plays immediately.
    pub fn resolve_chain(
        &mut self,
        chain: &[PieceKey],
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) {
        let members: Vec<Piece> = chain
            .iter()
            .filter_map(|&k| self.pieces.get(k))
            .filter(|p| !p.deleting)
            .cloned()
            .collect();
        let Some(tail) = members.last() else {
            return;
        };

        let mut bombs: Vec<Piece> = Vec::new();
        if let Some(blast) = self.rules.catalog().wildcard().map(|w| w.explosion_radius) {
            for wildcard in members.iter().filter(|p| p.is_wildcard()) {
                let center = self.arena.position(wildcard.physics);
                self.arena.query_radius(center, blast, &mut self.nearby);
                for &index in &self.nearby {
                    let Some(neighbor) = self
                        .pieces
                        .by_physics_index(index)
                        .and_then(|k| self.pieces.get(k))
                    else {
                        continue;
                    };
                    if neighbor.deleting
                        || chain.contains(&neighbor.key)
                        || bombs.iter().any(|b| b.key == neighbor.key)
                    {
                        continue;
                    }
                    bombs.push(neighbor.clone());
                }
            }
        }

        let evolve_position = self.arena.position(tail.physics);
        // Only a chain started on a normal piece evolves
        let evolve_from = members
            .first()
            .filter(|p| !p.is_wildcard())
            .map(|p| p.kind);

        for piece in members.iter().chain(&bombs) {
            self.pieces.mark_deleting(piece.key, &mut self.arena, views);
        }
        log::debug!(
            "Resolving chain of {} ({} in blast radius)",
            members.len(),
            bombs.len()
        );

        self.clearing.push(ClearSequence {
            chain: members,
            bombs,
            next: 0,
            countdown: 0.0,
            evolve_from,
            evolve_position,
        });
        self.advance_clears(0.0, views, sound);
    }

    /// Advance every running clear sequence by `dt` seconds
    pub fn advance_clears(
        &mut self,
        dt: f32,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) {
        let mut sequences = std::mem::take(&mut self.clearing);
        sequences.retain_mut(|seq| !self.advance_sequence(seq, dt, views, sound));
        sequences.append(&mut self.clearing);
        self.clearing = sequences;
    }

    /// Returns true once the sequence has finished
    fn advance_sequence(
        &mut self,
        seq: &mut ClearSequence,
        dt: f32,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) -> bool {
        let interval = self.rules.game().chain_clear_interval;
        seq.countdown -= dt;
        while seq.countdown <= 0.0 {
            let Some(piece) = seq.chain.get(seq.next) else {
                self.finish_clear(seq, views, sound);
                return true;
            };
            views.play_deleted(piece.view, true);
            self.events.push(PuzzleEvent::PieceCleared(piece.key));
            seq.next += 1;
            seq.countdown += interval;
        }
        false
    }

    fn finish_clear(
        &mut self,
        seq: &ClearSequence,
        views: &mut dyn PieceViews,
        sound: &mut dyn SoundSink,
    ) {
        if !seq.bombs.is_empty() {
            sound.play(SoundEffect::Exploded);
            for bomb in &seq.bombs {
                views.play_deleted(bomb.view, false);
            }
            self.events.push(PuzzleEvent::Exploded {
                count: seq.bombs.len(),
            });
        }

        for piece in seq.chain.iter().chain(&seq.bombs) {
            self.pieces.remove(piece.key, &mut self.arena, views);
        }

        if let Some(from) = seq.evolve_from {
            self.spawn_evolution(from, seq.evolve_position, views);
        }

        let score = self.rules.score(&seq.chain, &seq.bombs);
        log::info!(
            "Chain of {} cleared ({} caught in blast) for {} points",
            seq.chain.len(),
            seq.bombs.len(),
            score
        );
        self.events.push(PuzzleEvent::ChainResolved {
            length: seq.chain.len(),
            bombs: seq.bombs.len(),
            score,
        });
    }

    /// Spawn the next kind up the ladder, starting at the old kind's size
    fn spawn_evolution(&mut self, from: KindId, position: Vec2, views: &mut dyn PieceViews) {
        let catalog = self.rules.catalog();
        let Some(next) = catalog.next_level(from) else {
            log::debug!("Kind {from} has no next level, nothing evolves");
            return;
        };
        let (Some(from_radius), Some(to_radius)) = (catalog.radius(from), catalog.radius(next))
        else {
            return;
        };
        let Some(key) = self.create_piece(next, position, views) else {
            return;
        };
        if let Some(piece) = self.pieces.get(key) {
            self.arena.set_radius(piece.physics, from_radius);
            views.play_selected(piece.view, false);
        }
        self.events.push(PuzzleEvent::Evolved {
            key,
            from_radius,
            to_radius,
        });
    }

    /// Replace the piece under `view` with a wildcard at the same spot
    pub fn convert_to_wildcard(
        &mut self,
        view: ViewHandle,
        views: &mut dyn PieceViews,
    ) -> Option<PieceKey> {
        let key = self.pieces.by_view(view)?;
        let piece = self.pieces.get(key)?;
        if piece.deleting || piece.is_wildcard() || self.chain.contains(key) {
            return None;
        }
        let Some(wildcard) = self.rules.catalog().wildcard().map(|w| w.id) else {
            log::error!("No wildcard kind in the catalog, skill has no effect");
            return None;
        };
        let position = self.arena.position(piece.physics);
        self.pieces.remove(key, &mut self.arena, views);
        let new_key = self.create_piece(wildcard, position, views)?;
        if let Some(piece) = self.pieces.get(new_key) {
            views.play_selected(piece.view, false);
        }
        Some(new_key)
    }
}

/// Lock in force after `candidate` follows `tail`, or `None` if the kinds clash.
///
/// Wildcards never set the lock themselves; the first normal piece next to a
/// wildcard does, and two matching normal pieces do.
fn lock_after(lock: Option<KindId>, tail: &Piece, candidate: &Piece) -> Option<Option<KindId>> {
    if tail.is_wildcard() || candidate.is_wildcard() {
        return match lock {
            None if candidate.is_wildcard() => Some(None),
            None => Some(Some(candidate.kind)),
            Some(locked) if candidate.is_wildcard() || candidate.kind == locked => Some(lock),
            Some(_) => None,
        };
    }
    match lock {
        None => (tail.kind == candidate.kind).then_some(Some(candidate.kind)),
        Some(locked) => (candidate.kind == locked).then_some(lock),
    }
}

/// Whether the highlight search may step from `current` to `neighbor`
fn highlight_compatible(lock: Option<KindId>, current: &Piece, neighbor: &Piece) -> bool {
    if neighbor.is_wildcard() || current.is_wildcard() {
        return lock.is_none_or(|locked| neighbor.is_wildcard() || neighbor.kind == locked);
    }
    match lock {
        None => neighbor.kind == current.kind,
        Some(locked) => neighbor.kind == locked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::testing::{RecordingSound, RecordingViews};

    const WILD: KindId = 99;

    struct Fixture {
        puzzle: Puzzle,
        views: RecordingViews,
        sound: RecordingSound,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                puzzle: Puzzle::new(&Tuning::default()),
                views: RecordingViews::default(),
                sound: RecordingSound::default(),
            }
        }

        fn spawn(&mut self, kind: KindId, x: f32, y: f32) -> PieceKey {
            self.puzzle
                .create_piece(kind, Vec2::new(x, y), &mut self.views)
                .unwrap()
        }

        fn touch(&mut self, key: PieceKey) {
            let view = self.puzzle.pieces().get(key).unwrap().view;
            self.puzzle.update_selection(view, &mut self.views, &mut self.sound);
        }

        fn release(&mut self) {
            self.puzzle.end_selection(&mut self.views, &mut self.sound);
        }

        fn advance(&mut self, dt: f32) {
            self.puzzle.advance_clears(dt, &mut self.views, &mut self.sound);
        }

        fn highlighted(&self) -> Vec<PieceKey> {
            self.puzzle
                .pieces()
                .iter()
                .filter(|p| p.highlighted)
                .map(|p| p.key)
                .collect()
        }
    }

    #[test]
    fn test_drag_builds_chain_and_locks_kind() {
        let mut f = Fixture::new();
        let a = f.spawn(0, 0.0, 0.0);
        let b = f.spawn(0, 1.2, 0.0);
        let c = f.spawn(0, 2.4, 0.0);
        f.touch(a);
        f.touch(b);
        f.touch(c);
        assert!(f.puzzle.is_selecting());
        assert_eq!(f.puzzle.chain(), &[a, b, c]);
        assert_eq!(f.puzzle.locked_kind(), Some(0));
        assert_eq!(f.views.chain_line.len(), 3);
        assert_eq!(f.sound.played, vec![SoundEffect::Selected; 3]);
    }

    #[test]
    fn test_rejects_other_kind_and_far_pieces() {
        let mut f = Fixture::new();
        let a = f.spawn(0, 0.0, 0.0);
        let other = f.spawn(1, 1.2, 0.0);
        let far = f.spawn(0, 5.0, 0.0);
        f.touch(a);
        f.touch(other);
        f.touch(far);
        assert_eq!(f.puzzle.chain(), &[a]);
    }

    #[test]
    fn test_retouch_previous_backs_up() {
        let mut f = Fixture::new();
        let a = f.spawn(0, 0.0, 0.0);
        let b = f.spawn(0, 1.2, 0.0);
        f.touch(a);
        f.touch(b);
        f.touch(a);
        assert_eq!(f.puzzle.chain(), &[a]);
        assert!(!f.puzzle.pieces().get(b).unwrap().selected);
        assert!(f.views.selected.contains(&f.puzzle.pieces().get(a).unwrap().view));
    }

    #[test]
    fn test_wildcard_lock_crystallizes() {
        let mut f = Fixture::new();
        let w1 = f.spawn(WILD, 0.0, 0.0);
        let w2 = f.spawn(WILD, 1.2, 0.0);
        let three = f.spawn(3, 2.4, 0.0);
        let five = f.spawn(5, 3.6, 0.0);

        f.touch(w1);
        f.touch(w2);
        assert_eq!(f.puzzle.chain(), &[w1, w2]);
        assert_eq!(f.puzzle.locked_kind(), None);

        f.touch(three);
        assert_eq!(f.puzzle.locked_kind(), Some(3));

        assert!(!f.puzzle.can_connect(five));
        f.touch(five);
        assert_eq!(f.puzzle.chain(), &[w1, w2, three]);
    }

    #[test]
    fn test_backing_up_recomputes_lock() {
        let mut f = Fixture::new();
        let w = f.spawn(WILD, 0.0, 0.0);
        let three = f.spawn(3, 1.2, 0.0);
        f.touch(w);
        f.touch(three);
        assert_eq!(f.puzzle.locked_kind(), Some(3));
        f.touch(w);
        assert_eq!(f.puzzle.chain(), &[w]);
        assert_eq!(f.puzzle.locked_kind(), None);
    }

    #[test]
    fn test_highlight_reaches_through_neighbors() {
        let mut f = Fixture::new();
        let a = f.spawn(0, 0.0, 0.0);
        let b = f.spawn(0, 1.2, 0.0);
        let c = f.spawn(0, 2.4, 0.0);
        let _other_kind = f.spawn(1, 0.0, 1.2);
        let _too_far = f.spawn(0, 10.0, 0.0);
        let wild = f.spawn(WILD, 2.4, 1.2);

        f.touch(a);
        let first = f.highlighted();
        assert_eq!(first, vec![b, c, wild]);

        f.puzzle.update_selectable_highlight(&mut f.views);
        assert_eq!(f.highlighted(), first);
        assert_eq!(f.views.highlighted.len(), 3);
    }

    #[test]
    fn test_short_chain_is_abandoned() {
        let mut f = Fixture::new();
        let a = f.spawn(0, 0.0, 0.0);
        let b = f.spawn(0, 1.2, 0.0);
        f.touch(a);
        f.touch(b);
        f.release();
        assert!(!f.puzzle.is_selecting());
        assert!(!f.puzzle.is_clearing());
        assert!(f.views.chain_line.is_empty());
        assert!(f.views.selected.is_empty());
        assert!(f.views.highlighted.is_empty());
        assert_eq!(f.puzzle.pieces().len(), 2);
    }

    #[test]
    fn test_clear_sequence_deletes_evolves_and_scores() {
        let mut f = Fixture::new();
        let keys = [f.spawn(0, 0.0, 0.0), f.spawn(0, 1.2, 0.0), f.spawn(0, 2.4, 0.0)];
        for key in keys {
            f.touch(key);
        }
        f.release();

        assert!(f.puzzle.is_clearing());
        assert_eq!(f.views.fixed_lines.len(), 1);
        assert_eq!(f.views.deleted_animations.len(), 1);
        assert!(keys.iter().all(|&k| f.puzzle.pieces().get(k).unwrap().deleting));

        f.advance(0.1);
        f.advance(0.1);
        assert_eq!(f.views.deleted_animations.len(), 3);
        assert!(f.puzzle.is_clearing());

        f.advance(0.1);
        assert!(!f.puzzle.is_clearing());
        assert_eq!(f.puzzle.pieces().len(), 1);
        let evolved = f.puzzle.pieces().iter().next().unwrap();
        assert_eq!(evolved.kind, 1);
        let radius = f.puzzle.arena().radius(evolved.physics);
        assert!((radius - 0.38 * 1.7).abs() < 1e-5);

        let events: Vec<_> = f.puzzle.drain_events().collect();
        let cleared = events
            .iter()
            .filter(|e| matches!(e, PuzzleEvent::PieceCleared(_)))
            .count();
        assert_eq!(cleared, 3);
        assert!(events.iter().any(|e| matches!(e, PuzzleEvent::Evolved { .. })));
        assert_eq!(
            events.last(),
            Some(&PuzzleEvent::ChainResolved {
                length: 3,
                bombs: 0,
                score: 30
            })
        );
    }

    #[test]
    fn test_wildcard_blast_catches_neighbors() {
        let mut f = Fixture::new();
        let w = f.spawn(WILD, 0.0, 0.0);
        let a = f.spawn(0, 1.2, 0.0);
        let b = f.spawn(0, 2.4, 0.0);
        let bystander = f.spawn(2, 0.0, 1.5);
        let out_of_range = f.spawn(2, -3.0, 0.0);

        f.touch(w);
        f.touch(a);
        f.touch(b);
        f.release();
        assert!(f.puzzle.pieces().get(bystander).unwrap().deleting);
        assert!(!f.puzzle.pieces().get(out_of_range).unwrap().deleting);

        for _ in 0..3 {
            f.advance(0.1);
        }
        assert!(!f.puzzle.pieces().contains(bystander));
        assert!(f.puzzle.pieces().contains(out_of_range));
        assert!(f.sound.played.contains(&SoundEffect::Exploded));
        let silent: Vec<_> = f
            .views
            .deleted_animations
            .iter()
            .filter(|(_, with_sound)| !with_sound)
            .collect();
        assert_eq!(silent.len(), 1);

        let events: Vec<_> = f.puzzle.drain_events().collect();
        assert!(events.contains(&PuzzleEvent::Exploded { count: 1 }));
        // chain (50 + 10 + 10) * 1.0 * 1.0 * 1.5 + bomb 40 * 2
        assert!(events.contains(&PuzzleEvent::ChainResolved {
            length: 3,
            bombs: 1,
            score: 185
        }));
    }

    #[test]
    fn test_wildcard_blast_with_no_neighbors_catches_nothing() {
        let mut f = Fixture::new();
        let chain = [
            f.spawn(WILD, 0.0, 0.0),
            f.spawn(0, 1.2, 0.0),
            f.spawn(0, 2.4, 0.0),
        ];
        let far = f.spawn(2, -4.0, 0.0);
        for key in chain {
            f.touch(key);
        }
        f.release();
        assert!(!f.puzzle.pieces().get(far).unwrap().deleting);

        for _ in 0..3 {
            f.advance(0.1);
        }
        assert!(!f.puzzle.is_clearing());
        assert!(!f.sound.played.contains(&SoundEffect::Exploded));
        let with_sound = f.views.deleted_animations.iter().filter(|(_, s)| *s);
        assert_eq!(with_sound.count(), 3);

        let events: Vec<_> = f.puzzle.drain_events().collect();
        let exploded = events
            .iter()
            .any(|e| matches!(e, PuzzleEvent::Exploded { .. }));
        assert!(!exploded);
        // (50 + 10 + 10) * 1.0 * 1.0 * 1.5
        assert_eq!(
            events.last(),
            Some(&PuzzleEvent::ChainResolved {
                length: 3,
                bombs: 0,
                score: 105
            })
        );
    }

    #[test]
    fn test_only_chains_started_on_normal_piece_evolve() {
        // Wildcard first: nothing replaces the chain
        let mut f = Fixture::new();
        let chain = [
            f.spawn(WILD, 0.0, 0.0),
            f.spawn(0, 1.2, 0.0),
            f.spawn(0, 2.4, 0.0),
        ];
        for key in chain {
            f.touch(key);
        }
        assert_eq!(f.puzzle.chain(), &chain);
        f.release();
        for _ in 0..3 {
            f.advance(0.1);
        }
        assert!(f.puzzle.pieces().is_empty());
        let events: Vec<_> = f.puzzle.drain_events().collect();
        let evolved = events
            .iter()
            .any(|e| matches!(e, PuzzleEvent::Evolved { .. }));
        assert!(!evolved);

        // All wildcards
        let mut f = Fixture::new();
        let chain = [
            f.spawn(WILD, 0.0, 0.0),
            f.spawn(WILD, 1.2, 0.0),
            f.spawn(WILD, 2.4, 0.0),
        ];
        for key in chain {
            f.touch(key);
        }
        assert_eq!(f.puzzle.chain(), &chain);
        f.release();
        for _ in 0..3 {
            f.advance(0.1);
        }
        assert!(f.puzzle.pieces().is_empty());

        // Normal first with a wildcard in the middle evolves the first kind
        let mut f = Fixture::new();
        let chain = [
            f.spawn(0, 0.0, 0.0),
            f.spawn(WILD, 1.2, 0.0),
            f.spawn(0, 2.4, 0.0),
        ];
        for key in chain {
            f.touch(key);
        }
        f.release();
        for _ in 0..3 {
            f.advance(0.1);
        }
        let kinds: Vec<_> = f.puzzle.pieces().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![1]);
    }

    #[test]
    fn test_deleting_pieces_cannot_be_selected() {
        let mut f = Fixture::new();
        let keys = [f.spawn(0, 0.0, 0.0), f.spawn(0, 1.2, 0.0), f.spawn(0, 2.4, 0.0)];
        for key in keys {
            f.touch(key);
        }
        f.release();
        f.touch(keys[0]);
        assert!(!f.puzzle.is_selecting());
        assert!(f.puzzle.chain().is_empty());
    }

    #[test]
    fn test_resolve_empty_chain_is_noop() {
        let mut f = Fixture::new();
        f.puzzle.resolve_chain(&[], &mut f.views, &mut f.sound);
        assert!(!f.puzzle.is_clearing());
        assert_eq!(f.puzzle.drain_events().count(), 0);
    }

    #[test]
    fn test_top_kind_does_not_evolve() {
        let mut f = Fixture::new();
        let keys = [f.spawn(6, 0.0, 0.0), f.spawn(6, 1.4, 0.0), f.spawn(6, 2.8, 0.0)];
        for key in keys {
            f.touch(key);
        }
        f.release();
        for _ in 0..3 {
            f.advance(0.1);
        }
        assert!(f.puzzle.pieces().is_empty());
    }

    #[test]
    fn test_convert_to_wildcard() {
        let mut f = Fixture::new();
        let a = f.spawn(2, 1.0, 1.0);
        let view = f.puzzle.pieces().get(a).unwrap().view;
        let wild = f.puzzle.convert_to_wildcard(view, &mut f.views).unwrap();
        assert!(!f.puzzle.pieces().contains(a));
        let piece = f.puzzle.pieces().get(wild).unwrap();
        assert!(piece.is_wildcard());
        assert_eq!(f.puzzle.arena().position(piece.physics), Vec2::new(1.0, 1.0));
        assert_eq!(f.views.live.len(), 1);
    }
}
