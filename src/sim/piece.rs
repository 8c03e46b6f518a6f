//! Logical pieces and their registry
//!
//! A piece ties a kind to one physics slot and one view. The registry is the
//! only place that allocates or releases physics slots for pieces, so a live
//! piece always owns a live slot.

use glam::Vec2;

use super::arena::{PhysicsArena, PhysicsHandle};
use crate::tuning::{KindId, PieceCatalog};
use crate::view::{PieceViews, ViewHandle};

/// Stable identity of a piece for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceKey(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceType {
    Normal,
    /// Connects to any kind and blasts its neighbors on clear
    Wildcard,
}

#[derive(Debug, Clone)]
pub struct Piece {
    pub key: PieceKey,
    pub kind: KindId,
    pub piece_type: PieceType,
    pub physics: PhysicsHandle,
    pub view: ViewHandle,
    /// Committed to a clear: pinned and no longer selectable
    pub deleting: bool,
    pub selected: bool,
    /// Reachable from the chain tail right now
    pub highlighted: bool,
}

impl Piece {
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.piece_type == PieceType::Wildcard
    }
}

/// All live pieces, kept in creation order
#[derive(Debug, Clone, Default)]
pub struct PieceRegistry {
    pieces: Vec<Piece>,
    next_key: u32,
}

impl PieceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.pieces.iter_mut()
    }

    pub fn get(&self, key: PieceKey) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.key == key)
    }

    pub fn get_mut(&mut self, key: PieceKey) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.key == key)
    }

    pub fn contains(&self, key: PieceKey) -> bool {
        self.get(key).is_some()
    }

    /// Piece presented by `view`, if it is still live
    pub fn by_view(&self, view: ViewHandle) -> Option<PieceKey> {
        self.pieces.iter().find(|p| p.view == view).map(|p| p.key)
    }

    /// Piece owning physics slot `index`, if any
    pub fn by_physics_index(&self, index: usize) -> Option<PieceKey> {
        self.pieces
            .iter()
            .find(|p| p.physics.index() == index)
            .map(|p| p.key)
    }

    /// Create a piece of `kind` at `position`.
    ///
    /// Returns `None` (and leaks nothing) when the physics pool or the view
    /// pool is exhausted, or when the kind is unknown.
    pub fn spawn(
        &mut self,
        kind: KindId,
        position: Vec2,
        arena: &mut PhysicsArena,
        catalog: &PieceCatalog,
        views: &mut dyn PieceViews,
    ) -> Option<PieceKey> {
        let Some(radius) = catalog.radius(kind) else {
            log::error!("Unknown piece kind {kind}, spawn aborted");
            return None;
        };

        let Some(physics) = arena.allocate() else {
            log::debug!("Physics pool full, skipping spawn of kind {kind}");
            return None;
        };
        arena.initialize(physics, position, radius);

        let Some(view) = views.spawn(kind, position, radius) else {
            log::debug!("View pool full, rolling back spawn of kind {kind}");
            arena.release(physics);
            return None;
        };

        let piece_type = if catalog.is_wildcard(kind) {
            PieceType::Wildcard
        } else {
            PieceType::Normal
        };

        let key = PieceKey(self.next_key);
        self.next_key += 1;
        self.pieces.push(Piece {
            key,
            kind,
            piece_type,
            physics,
            view,
            deleting: false,
            selected: false,
            highlighted: false,
        });
        Some(key)
    }

    /// Flag a piece as committed to a clear and pin it in place
    pub fn mark_deleting(
        &mut self,
        key: PieceKey,
        arena: &mut PhysicsArena,
        views: &mut dyn PieceViews,
    ) {
        if let Some(piece) = self.get_mut(key) {
            piece.deleting = true;
            arena.set_static(piece.physics, true);
            views.set_deleting(piece.view);
        }
    }

    /// Destroy a piece: release its slot and return its view to the pool
    pub fn remove(
        &mut self,
        key: PieceKey,
        arena: &mut PhysicsArena,
        views: &mut dyn PieceViews,
    ) -> Option<Piece> {
        let index = self.pieces.iter().position(|p| p.key == key)?;
        let piece = self.pieces.remove(index);
        arena.release(piece.physics);
        views.delete(piece.view);
        Some(piece)
    }
}
