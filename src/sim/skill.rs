//! Skill meter: filled by cleared pieces, spent to turn a piece into a wildcard

/// Points accumulate without a cap; the meter counts as charged at `max`.
#[derive(Debug, Clone)]
pub struct SkillMeter {
    points: u32,
    max: u32,
    /// Activated and waiting for the player to pick a target
    ready: bool,
}

impl SkillMeter {
    pub fn new(max: u32) -> Self {
        Self {
            points: 0,
            max,
            ready: false,
        }
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_charged(&self) -> bool {
        self.points >= self.max
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Fill fraction for the meter display, capped at 1
    pub fn progress(&self) -> f32 {
        if self.max == 0 {
            return 1.0;
        }
        (self.points as f32 / self.max as f32).min(1.0)
    }

    /// Add points. Returns true on the call that first fills the meter.
    pub fn add(&mut self, amount: u32) -> bool {
        let was_charged = self.is_charged();
        self.points = self.points.saturating_add(amount);
        !was_charged && self.is_charged()
    }

    /// Spend a full meter and arm the skill. Does nothing unless charged.
    pub fn try_activate(&mut self) -> bool {
        if !self.is_charged() || self.ready {
            return false;
        }
        self.points = 0;
        self.ready = true;
        true
    }

    /// The armed skill has been used on a piece
    pub fn complete(&mut self) {
        self.ready = false;
    }
}
