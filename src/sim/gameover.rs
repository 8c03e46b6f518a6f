//! Loss detection: time spent with a settled disc above the dead line

/// Accumulates danger time and reports loss once the grace period is used up
#[derive(Debug, Clone, Default)]
pub struct GameoverMonitor {
    time_in_danger: f32,
}

impl GameoverMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds accumulated so far (0 while safe)
    pub fn time_in_danger(&self) -> f32 {
        self.time_in_danger
    }

    /// Advance by one fixed tick. Returns true on the tick the grace runs out.
    ///
    /// Recovery is instant: any safe tick resets the accumulator.
    pub fn tick(&mut self, dt: f32, dangerous: bool, grace: f32) -> bool {
        if !dangerous {
            self.time_in_danger = 0.0;
            return false;
        }
        self.time_in_danger += dt;
        self.time_in_danger >= grace
    }

    /// Fraction of the grace period used, for the dead-line warning
    pub fn grace_progress(&self, max_grace: f32) -> f32 {
        if max_grace <= 0.0 {
            return 0.0;
        }
        self.time_in_danger / max_grace
    }
}
