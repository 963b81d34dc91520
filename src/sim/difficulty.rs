//! Score-driven difficulty for the Titanic runner
//!
//! Score maps to a level through fixed-width bands; the level then picks the
//! gate spawn interval, the opening between paired icebergs, and the scroll
//! speed. Interval and spacing only shrink (down to a positive floor) and
//! speed only grows as the level rises.

use serde::{Deserialize, Serialize};

/// Highest level the runner can reach
pub const MAX_LEVEL: u8 = 10;
/// Longest allowed gap between gate spawns
pub const MAX_SPAWN_INTERVAL_MS: u64 = 60_000;

/// Tunable difficulty curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Top level (clamped to 1..=MAX_LEVEL)
    pub max_level: u8,
    /// Stars needed per level band
    pub score_per_level: u32,

    pub base_spawn_interval_ms: u64,
    /// Interval lost per level
    pub spawn_interval_step_ms: u64,
    pub min_spawn_interval_ms: u64,

    /// Opening between the top and bottom iceberg of a gate (px)
    pub base_spacing: f32,
    pub spacing_step: f32,
    pub min_spacing: f32,

    /// Iceberg scroll speed (px/s)
    pub base_speed: f32,
    pub speed_step: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            score_per_level: 5,

            base_spawn_interval_ms: 1500,
            spawn_interval_step_ms: 80,
            min_spawn_interval_ms: 700,

            base_spacing: 220.0,
            spacing_step: 8.0,
            min_spacing: 140.0,

            base_speed: 240.0,
            speed_step: 27.0,
        }
    }
}

impl DifficultyTuning {
    /// Clamp values so the curve stays monotonic and positive whatever the
    /// settings file says.
    pub fn sanitized(mut self) -> Self {
        self.max_level = self.max_level.clamp(1, MAX_LEVEL);
        self.score_per_level = self.score_per_level.max(1);

        self.min_spawn_interval_ms = self.min_spawn_interval_ms.clamp(1, MAX_SPAWN_INTERVAL_MS);
        self.base_spawn_interval_ms = self
            .base_spawn_interval_ms
            .clamp(self.min_spawn_interval_ms, MAX_SPAWN_INTERVAL_MS);
        self.spawn_interval_step_ms = self.spawn_interval_step_ms.min(MAX_SPAWN_INTERVAL_MS);

        if !self.min_spacing.is_finite() || self.min_spacing <= 0.0 {
            self.min_spacing = 1.0;
        }
        if !self.base_spacing.is_finite() || self.base_spacing < self.min_spacing {
            self.base_spacing = self.min_spacing;
        }
        if !self.spacing_step.is_finite() || self.spacing_step < 0.0 {
            self.spacing_step = 0.0;
        }

        if !self.base_speed.is_finite() || self.base_speed <= 0.0 {
            self.base_speed = Self::default().base_speed;
        }
        if !self.speed_step.is_finite() || self.speed_step < 0.0 {
            self.speed_step = 0.0;
        }
        self
    }
}

/// Parameters for one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyParams {
    pub spawn_interval_ms: u64,
    pub spacing: f32,
    pub speed: f32,
}

/// Maps score → level → spawn/spacing/speed
#[derive(Debug, Clone)]
pub struct DifficultyController {
    tuning: DifficultyTuning,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(DifficultyTuning::default())
    }
}

impl DifficultyController {
    pub fn new(tuning: DifficultyTuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
        }
    }

    pub fn tuning(&self) -> &DifficultyTuning {
        &self.tuning
    }

    pub fn max_level(&self) -> u8 {
        self.tuning.max_level
    }

    /// Level for a cumulative score, in `1..=max_level`
    pub fn level_for_score(&self, score: u32) -> u8 {
        let band = score / self.tuning.score_per_level;
        let level = band.saturating_add(1).min(self.tuning.max_level as u32);
        level as u8
    }

    /// Spawn interval, gate spacing and speed for a level (clamped into range)
    pub fn params(&self, level: u8) -> DifficultyParams {
        let t = &self.tuning;
        let steps = level.clamp(1, t.max_level) as u64 - 1;

        let spawn_interval_ms = t
            .base_spawn_interval_ms
            .saturating_sub(steps.saturating_mul(t.spawn_interval_step_ms))
            .max(t.min_spawn_interval_ms);
        let spacing = (t.base_spacing - steps as f32 * t.spacing_step).max(t.min_spacing);
        let speed = t.base_speed + steps as f32 * t.speed_step;

        DifficultyParams {
            spawn_interval_ms,
            spacing,
            speed,
        }
    }
}
