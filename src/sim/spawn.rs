//! Timed drops that speed up as the run goes on

use crate::lerp;
use crate::tuning::GameTuning;

/// Spawn rate ramps linearly from `1 / initial_spawn_interval` to
/// `1 / min_spawn_interval` over `time_to_max_difficulty` seconds, and keeps
/// ramping past it.
#[derive(Debug, Clone)]
pub struct SpawnTimer {
    timer: f32,
    elapsed: f32,
    interval: f32,
    start_rate: f32,
    max_rate: f32,
    ramp_seconds: f32,
}

impl SpawnTimer {
    pub fn new(game: &GameTuning) -> Self {
        Self {
            timer: 0.0,
            elapsed: 0.0,
            interval: game.initial_spawn_interval,
            start_rate: 1.0 / game.initial_spawn_interval,
            max_rate: 1.0 / game.min_spawn_interval,
            ramp_seconds: game.time_to_max_difficulty,
        }
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.elapsed = 0.0;
        self.interval = 1.0 / self.start_rate;
    }

    /// Current seconds between drops
    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance by `dt`. Returns true when a drop is due.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer += dt;
        self.elapsed += dt;

        let t = if self.ramp_seconds > 0.0 {
            self.elapsed / self.ramp_seconds
        } else {
            1.0
        };
        let rate = lerp(self.start_rate, self.max_rate, t);
        self.interval = 1.0 / rate;

        if self.timer >= self.interval {
            self.timer = 0.0;
            return true;
        }
        false
    }
}
