//! Data-driven game balance
//!
//! Loaded once at startup from JSON (or taken from `Default`) and treated as
//! read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Bounds;
use crate::sim::curve::Curve;

/// Identifies a piece kind (and its rank on the evolution ladder)
pub type KindId = u32;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("piece catalog has no normal kinds")]
    EmptyCatalog,
    #[error("curve {0} has no keys")]
    EmptyCurve(&'static str),
    #[error("wildcard id {0} collides with a normal kind")]
    WildcardIdCollision(KindId),
}

/// Verlet solver constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Vertical acceleration (y-up, so negative pulls down)
    pub gravity: f32,
    /// Velocity damping per step, in (0, 1]
    pub friction: f32,
    pub constraint_iterations: u32,
    /// Fraction of an overlap corrected per relaxation pass
    pub push_factor: f32,
    pub max_push_distance: f32,
    /// Number of physics slots
    pub capacity: usize,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            friction: 0.95,
            constraint_iterations: 2,
            push_factor: 0.6,
            max_push_distance: 0.2,
            capacity: 100,
        }
    }
}

/// Play field geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldTuning {
    pub bounds: Bounds,
    /// Settled discs above this height count as danger
    pub dead_line: f32,
    /// Height new pieces drop in from
    pub spawn_height: f32,
}

impl Default for FieldTuning {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(-4.0, 4.0, -6.0, 8.0),
            dead_line: 5.0,
            spawn_height: 7.0,
        }
    }
}

/// Rules, pacing and score curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    pub game_over_grace_seconds: f32,
    pub initial_spawn_interval: f32,
    pub min_spawn_interval: f32,
    pub time_to_max_difficulty: f32,
    /// Highest ladder index random drops may pick
    pub max_spawn_level_index: usize,
    pub initial_piece_count: usize,
    pub max_skill_points: u32,

    pub connect_distance: f32,
    pub min_chain_to_clear: usize,
    /// Delay between deleting consecutive chain members
    pub chain_clear_interval: f32,
    /// Time an evolved piece takes to grow to its full radius
    pub evolution_growth_seconds: f32,

    pub chain_length_bonus: Curve,
    pub rank_bonus: Curve,
    pub wildcard_bonus: Curve,
    /// Rank used when a chain holds only wildcards
    pub wildcard_only_virtual_id: KindId,
    pub explosion_score_multiplier: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            game_over_grace_seconds: 3.0,
            initial_spawn_interval: 2.0,
            min_spawn_interval: 0.5,
            time_to_max_difficulty: 120.0,
            max_spawn_level_index: 3,
            initial_piece_count: 1,
            max_skill_points: 100,
            connect_distance: 1.5,
            min_chain_to_clear: 3,
            chain_clear_interval: 0.1,
            evolution_growth_seconds: 0.5,
            chain_length_bonus: Curve::linear(3.0, 1.0, 20.0, 5.0),
            rank_bonus: Curve::linear(0.0, 1.0, 10.0, 3.0),
            wildcard_bonus: Curve::linear(0.0, 0.5, 10.0, 2.0),
            wildcard_only_virtual_id: 100,
            explosion_score_multiplier: 2.0,
        }
    }
}

/// A normal piece kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSpec {
    pub id: KindId,
    #[serde(default)]
    pub name: String,
    /// Unscaled radius, multiplied by the catalog base scale
    pub radius: f32,
    pub score: u32,
}

/// The wildcard (bomb) kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardSpec {
    pub id: KindId,
    pub radius: f32,
    pub score: u32,
    /// Blast radius around each wildcard in a clearing chain
    pub explosion_radius: f32,
}

/// All piece kinds. Order of `kinds` is the evolution ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatalogData", into = "CatalogData")]
pub struct PieceCatalog {
    base_scale: f32,
    kinds: Vec<KindSpec>,
    wildcard: Option<WildcardSpec>,
    /// id -> index into `kinds`
    lookup: HashMap<KindId, usize>,
}

#[derive(Clone, Serialize, Deserialize)]
struct CatalogData {
    #[serde(default = "default_base_scale")]
    base_scale: f32,
    kinds: Vec<KindSpec>,
    #[serde(default)]
    wildcard: Option<WildcardSpec>,
}

fn default_base_scale() -> f32 {
    1.7
}

impl From<CatalogData> for PieceCatalog {
    fn from(data: CatalogData) -> Self {
        Self::new(data.base_scale, data.kinds, data.wildcard)
    }
}

impl From<PieceCatalog> for CatalogData {
    fn from(catalog: PieceCatalog) -> Self {
        Self {
            base_scale: catalog.base_scale,
            kinds: catalog.kinds,
            wildcard: catalog.wildcard,
        }
    }
}

impl Default for PieceCatalog {
    fn default() -> Self {
        let names = ["pebble", "acorn", "berry", "plum", "peach", "melon", "pumpkin"];
        let kinds = names
            .iter()
            .enumerate()
            .map(|(i, name)| KindSpec {
                id: i as KindId,
                name: (*name).to_string(),
                radius: 0.38 + 0.01 * i as f32,
                score: 10 << i,
            })
            .collect();
        Self::new(
            default_base_scale(),
            kinds,
            Some(WildcardSpec {
                id: 99,
                radius: 0.4,
                score: 50,
                explosion_radius: 2.0,
            }),
        )
    }
}

impl PieceCatalog {
    /// Build the catalog. A duplicated id keeps the later entry's stats.
    pub fn new(base_scale: f32, kinds: Vec<KindSpec>, wildcard: Option<WildcardSpec>) -> Self {
        let mut lookup = HashMap::with_capacity(kinds.len());
        for (index, kind) in kinds.iter().enumerate() {
            if let Some(previous) = lookup.insert(kind.id, index) {
                log::warn!(
                    "Duplicate piece id {} (entries {} and {}), later entry wins",
                    kind.id,
                    previous,
                    index
                );
            }
        }
        Self {
            base_scale,
            kinds,
            wildcard,
            lookup,
        }
    }

    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    pub fn kinds(&self) -> &[KindSpec] {
        &self.kinds
    }

    pub fn wildcard(&self) -> Option<&WildcardSpec> {
        self.wildcard.as_ref()
    }

    pub fn is_wildcard(&self, id: KindId) -> bool {
        self.wildcard.as_ref().is_some_and(|w| w.id == id)
    }

    pub fn kind(&self, id: KindId) -> Option<&KindSpec> {
        self.lookup.get(&id).map(|&i| &self.kinds[i])
    }

    /// Scaled physics radius for any kind, wildcard included
    pub fn radius(&self, id: KindId) -> Option<f32> {
        let unscaled = match self.wildcard.as_ref() {
            Some(w) if w.id == id => w.radius,
            _ => self.kind(id)?.radius,
        };
        Some(unscaled * self.base_scale)
    }

    /// Base score for any kind, wildcard included
    pub fn score(&self, id: KindId) -> Option<u32> {
        match self.wildcard.as_ref() {
            Some(w) if w.id == id => Some(w.score),
            _ => self.kind(id).map(|k| k.score),
        }
    }

    /// Next kind up the evolution ladder, `None` at the top or for unknown ids
    pub fn next_level(&self, id: KindId) -> Option<KindId> {
        let index = *self.lookup.get(&id)?;
        self.kinds.get(index + 1).map(|k| k.id)
    }

    /// Largest scaled radius in the catalog
    pub fn max_radius(&self) -> f32 {
        self.kinds
            .iter()
            .map(|k| k.radius)
            .chain(self.wildcard.iter().map(|w| w.radius))
            .fold(0.0, f32::max)
            * self.base_scale
    }
}

/// Complete tuning bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub field: FieldTuning,
    pub game: GameTuning,
    pub catalog: PieceCatalog,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!(
            "Loaded tuning from {} ({} piece kinds)",
            path.display(),
            tuning.catalog.kinds().len()
        );
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.physics;
        if !(p.friction > 0.0 && p.friction <= 1.0) {
            return Err(invalid("physics.friction", format!("{} not in (0, 1]", p.friction)));
        }
        if p.constraint_iterations == 0 {
            return Err(invalid("physics.constraint_iterations", "must be at least 1".into()));
        }
        if p.capacity == 0 {
            return Err(invalid("physics.capacity", "must be at least 1".into()));
        }

        let b = &self.field.bounds;
        if b.left >= b.right || b.bottom >= b.top {
            return Err(invalid("field.bounds", format!("{b:?} is empty")));
        }

        let g = &self.game;
        if g.connect_distance <= 0.0 {
            return Err(invalid("game.connect_distance", "must be positive".into()));
        }
        if g.initial_spawn_interval <= 0.0 || g.min_spawn_interval <= 0.0 {
            return Err(invalid("game.spawn_interval", "intervals must be positive".into()));
        }
        for (name, curve) in [
            ("chain_length_bonus", &g.chain_length_bonus),
            ("rank_bonus", &g.rank_bonus),
            ("wildcard_bonus", &g.wildcard_bonus),
        ] {
            if curve.is_empty() {
                return Err(TuningError::EmptyCurve(name));
            }
        }

        if self.catalog.kinds().is_empty() {
            return Err(TuningError::EmptyCatalog);
        }
        if let Some(w) = self.catalog.wildcard() {
            if self.catalog.kind(w.id).is_some() {
                return Err(TuningError::WildcardIdCollision(w.id));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: String) -> TuningError {
    TuningError::Invalid { field, message }
}
