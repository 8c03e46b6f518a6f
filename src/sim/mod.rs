//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by slot index and creation order)
//! - No rendering or platform dependencies; views and sound go through traits

pub mod arena;
pub mod chain;
pub mod curve;
pub mod gameover;
pub mod piece;
pub mod puzzle;
pub mod rules;
pub mod skill;
pub mod spawn;
pub mod state;
pub mod tick;

pub use arena::{Bounds, PhysicsArena, PhysicsHandle};
pub use chain::ChainTracker;
pub use curve::{Curve, CurveKey};
pub use gameover::GameoverMonitor;
pub use piece::{Piece, PieceKey, PieceRegistry, PieceType};
pub use puzzle::{Puzzle, PuzzleEvent};
pub use rules::PuzzleRules;
pub use skill::SkillMeter;
pub use spawn::SpawnTimer;
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{FrameInput, fixed_tick, frame};
