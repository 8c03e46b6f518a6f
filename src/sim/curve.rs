//! Piecewise-linear curves for score multipliers

use serde::{Deserialize, Serialize};

/// A single (x, y) keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub x: f32,
    pub y: f32,
}

/// Piecewise-linear curve. Keys are kept sorted by x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct Curve {
    keys: Vec<CurveKey>,
}

impl From<Vec<CurveKey>> for Curve {
    fn from(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { keys }
    }
}

impl From<Curve> for Vec<CurveKey> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

impl Curve {
    /// Straight line through two keys
    pub fn linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        vec![CurveKey { x: x0, y: y0 }, CurveKey { x: x1, y: y1 }].into()
    }

    /// Same value everywhere
    pub fn constant(y: f32) -> Self {
        vec![CurveKey { x: 0.0, y }].into()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// x range covered by the keys
    pub fn domain(&self) -> Option<(f32, f32)> {
        Some((self.keys.first()?.x, self.keys.last()?.x))
    }

    /// Value at `x`, clamped to the key domain so the curve never extrapolates.
    ///
    /// An empty curve evaluates to 1.0 (neutral multiplier).
    pub fn evaluate(&self, x: f32) -> f32 {
        let Some((min, max)) = self.domain() else {
            log::warn!("Evaluating empty curve, using 1.0");
            return 1.0;
        };
        let x = x.clamp(min, max);

        let upper = self.keys.partition_point(|k| k.x < x);
        if upper == 0 {
            return self.keys[0].y;
        }
        if upper == self.keys.len() {
            return self.keys[upper - 1].y;
        }
        let (a, b) = (self.keys[upper - 1], self.keys[upper]);
        let span = b.x - a.x;
        if span <= f32::EPSILON {
            return b.y;
        }
        crate::lerp(a.y, b.y, (x - a.x) / span)
    }
}
