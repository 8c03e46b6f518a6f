//! Matching and scoring rules

use glam::Vec2;
use rand::Rng;

use super::piece::Piece;
use crate::tuning::{GameTuning, KindId, PieceCatalog, Tuning};

/// Connect predicate, score formula and random kind selection
#[derive(Debug, Clone)]
pub struct PuzzleRules {
    game: GameTuning,
    catalog: PieceCatalog,
}

impl PuzzleRules {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            game: tuning.game.clone(),
            catalog: tuning.catalog.clone(),
        }
    }

    pub fn game(&self) -> &GameTuning {
        &self.game
    }

    pub fn catalog(&self) -> &PieceCatalog {
        &self.catalog
    }

    pub fn min_chain_to_clear(&self) -> usize {
        self.game.min_chain_to_clear
    }

    /// Two pieces connect when their centers are within the connect distance
    #[inline]
    pub fn can_connect(&self, a: Vec2, b: Vec2) -> bool {
        a.distance(b) <= self.game.connect_distance
    }

    /// Uniform pick among the first `max_spawn_level_index + 1` normal kinds
    pub fn random_kind(&self, rng: &mut impl Rng) -> KindId {
        let kinds = self.catalog.kinds();
        let mut index = rng.random_range(0..=self.game.max_spawn_level_index);
        if index >= kinds.len() {
            index = 0;
        }
        kinds[index].id
    }

    /// Score for a cleared chain plus the pieces its wildcards blew up
    pub fn score(&self, chain: &[Piece], bomb_targets: &[Piece]) -> u64 {
        if chain.is_empty() {
            return 0;
        }

        let mut main_kind = None;
        let mut wildcard_count = 0u32;
        let mut base = 0.0f32;
        for piece in chain {
            base += self.base_score(piece.kind);
            if piece.is_wildcard() {
                wildcard_count += 1;
            } else {
                main_kind = Some(piece.kind);
            }
        }
        let rank = main_kind.unwrap_or(self.game.wildcard_only_virtual_id) as f32;

        let length_mult = self.game.chain_length_bonus.evaluate(chain.len() as f32);
        let rank_mult = self.game.rank_bonus.evaluate(rank);
        let wildcard_mult = if wildcard_count > 0 {
            1.0 + wildcard_count as f32 * self.game.wildcard_bonus.evaluate(rank)
        } else {
            1.0
        };
        let chain_score = base * length_mult * rank_mult * wildcard_mult;

        let bomb_score = if bomb_targets.is_empty() {
            0.0
        } else {
            let bomb_base: f32 = bomb_targets.iter().map(|p| self.base_score(p.kind)).sum();
            bomb_base * self.game.explosion_score_multiplier
        };

        (chain_score + bomb_score).round().max(0.0) as u64
    }

    fn base_score(&self, kind: KindId) -> f32 {
        match self.catalog.score(kind) {
            Some(score) => score as f32,
            None => {
                log::warn!("No score entry for kind {kind}, counting 0");
                0.0
            }
        }
    }
}
