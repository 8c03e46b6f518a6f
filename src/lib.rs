//! Disc Chain - falling-disc chain-matching puzzle core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics arena, chain selection, scoring, session)
//! - `tuning`: Data-driven game balance loaded once at startup
//! - `view`: Presentation and sound collaborator interfaces

pub mod sim;
pub mod tuning;
pub mod view;

pub use tuning::{Tuning, TuningError};
pub use view::{NullViews, PieceViews, Silent, SoundEffect, SoundSink, ViewHandle};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
