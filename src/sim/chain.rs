//! The in-progress selection path

use super::arena::PhysicsArena;
use super::piece::{PieceKey, PieceRegistry};
use super::rules::PuzzleRules;

/// Ordered pieces of the current drag, no duplicates.
///
/// Adjacency is checked only when a piece is appended; later drift does not
/// break the chain.
#[derive(Debug, Clone, Default)]
pub struct ChainTracker {
    chain: Vec<PieceKey>,
}

impl ChainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[PieceKey] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last(&self) -> Option<PieceKey> {
        self.chain.last().copied()
    }

    /// Entry before the tail, used to detect the player backing up
    pub fn second_to_last(&self) -> Option<PieceKey> {
        self.chain.len().checked_sub(2).map(|i| self.chain[i])
    }

    pub fn contains(&self, key: PieceKey) -> bool {
        self.chain.contains(&key)
    }

    /// Append `key` if the chain is empty or it lies within connect distance
    /// of the current tail. Returns false without mutating otherwise.
    pub fn append(
        &mut self,
        key: PieceKey,
        pieces: &PieceRegistry,
        arena: &PhysicsArena,
        rules: &PuzzleRules,
    ) -> bool {
        let Some(last) = self.last() else {
            self.chain.push(key);
            return true;
        };
        if self.contains(key) {
            return false;
        }
        let (Some(tail), Some(added)) = (pieces.get(last), pieces.get(key)) else {
            return false;
        };
        if rules.can_connect(arena.position(tail.physics), arena.position(added.physics)) {
            self.chain.push(key);
            true
        } else {
            false
        }
    }

    pub fn remove_last(&mut self) -> Option<PieceKey> {
        self.chain.pop()
    }

    pub fn clear(&mut self) {
        self.chain.clear();
    }

    /// Empty the chain, handing back its members in order
    pub fn take(&mut self) -> Vec<PieceKey> {
        std::mem::take(&mut self.chain)
    }
}
