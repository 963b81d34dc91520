//! Titanic runner: one fixed step of the endless-runner simulation
//!
//! Order per step: steer ship → spawn gate if due → scroll → cull → collide
//! → score/level.

use glam::Vec2;
use rand::Rng;

use super::collision::{CollisionReport, resolve_collisions};
use super::difficulty::{DifficultyController, DifficultyParams};
use super::state::{Iceberg, RunnerSession, Star};
use crate::consts::*;

/// Which directions are active this step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Steer {
    pub up: bool,
    pub down: bool,
}

/// Result of a runner step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerOutcome {
    Running,
    /// Lives exhausted this step
    Ended { score: u32, level: u8 },
}

impl RunnerSession {
    /// Advance the run by `dt` seconds at session time `now_ms`
    pub fn step(
        &mut self,
        steer: Steer,
        now_ms: u64,
        dt: f32,
        difficulty: &DifficultyController,
    ) -> RunnerOutcome {
        let params = difficulty.params(self.level);

        self.ship.steer(steer.up, steer.down);
        self.ship.advance(dt);

        if now_ms >= self.next_spawn_ms {
            self.spawn_gate(&params, now_ms);
            self.next_spawn_ms = now_ms.saturating_add(params.spawn_interval_ms);
        }

        for iceberg in &mut self.icebergs {
            iceberg.advance(params.speed, dt);
        }
        for star in &mut self.stars {
            star.advance(params.speed, dt);
        }
        self.icebergs.retain(|i| !i.is_off_screen());
        self.stars.retain(|s| !s.is_off_screen());

        let report = resolve_collisions(&mut self.ship, &mut self.icebergs, &mut self.stars);
        self.apply_report(&report, difficulty);

        if report.run_ended {
            RunnerOutcome::Ended {
                score: self.score,
                level: self.level,
            }
        } else {
            RunnerOutcome::Running
        }
    }

    fn apply_report(&mut self, report: &CollisionReport, difficulty: &DifficultyController) {
        if report.lives_lost > 0 {
            log::debug!(
                "Ship struck {} iceberg(s), {} lives left",
                report.lives_lost,
                self.ship.lives
            );
        }
        if report.stars_collected > 0 {
            self.score = self.score.saturating_add(report.stars_collected);
            let level = difficulty.level_for_score(self.score);
            if level > self.level {
                log::info!("Titanic level {} -> {} (score {})", self.level, level, self.score);
                self.level = level;
            }
        }
    }

    /// Spawn a top/bottom iceberg pair around a random opening, with a star inside
    pub fn spawn_gate(&mut self, params: &DifficultyParams, now_ms: u64) {
        let center = self
            .rng
            .random_range(GATE_CENTER_MARGIN..=CANVAS_HEIGHT - GATE_CENTER_MARGIN);
        let half = params.spacing / 2.0;
        let opening_top = center - half;
        let opening_bottom = center + half;

        if opening_top > 0.0 {
            let id = self.next_entity_id();
            self.icebergs.push(Iceberg {
                id,
                x: ICEBERG_SPAWN_X,
                y: 0.0,
                width: ICEBERG_WIDTH,
                height: opening_top,
                spawned_at_ms: now_ms,
            });
        }
        if opening_bottom < CANVAS_HEIGHT {
            let id = self.next_entity_id();
            self.icebergs.push(Iceberg {
                id,
                x: ICEBERG_SPAWN_X,
                y: opening_bottom,
                width: ICEBERG_WIDTH,
                height: CANVAS_HEIGHT - opening_bottom,
                spawned_at_ms: now_ms,
            });
        }

        let clearance = STAR_SIZE / 2.0 + STAR_GAP_MARGIN;
        let lo = opening_top + clearance;
        let hi = opening_bottom - clearance;
        let star_y = if lo >= hi {
            center
        } else {
            self.rng.random_range(lo..hi)
        };
        let id = self.next_entity_id();
        self.stars.push(Star {
            id,
            pos: Vec2::new(ICEBERG_SPAWN_X + ICEBERG_WIDTH / 2.0, star_y),
            collected: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Ship;
    use proptest::prelude::*;

    const DT: f32 = SIM_DT;

    fn run_until(session: &mut RunnerSession, dc: &DifficultyController, until_ms: u64) {
        let mut now = 0;
        while now <= until_ms {
            session.step(Steer::default(), now, DT, dc);
            now += 16;
        }
    }

    #[test]
    fn test_first_gate_after_delay() {
        let dc = DifficultyController::default();
        let mut run = RunnerSession::new(1, 0);

        run.step(Steer::default(), FIRST_SPAWN_DELAY_MS - 1, DT, &dc);
        assert!(run.icebergs.is_empty());
        assert!(run.stars.is_empty());

        run.step(Steer::default(), FIRST_SPAWN_DELAY_MS, DT, &dc);
        assert_eq!(run.icebergs.len(), 2);
        assert_eq!(run.stars.len(), 1);
        assert_eq!(
            run.next_spawn_ms,
            FIRST_SPAWN_DELAY_MS + dc.params(1).spawn_interval_ms
        );
    }

    #[test]
    fn test_gate_geometry() {
        let dc = DifficultyController::default();
        let params = dc.params(1);
        let mut run = RunnerSession::new(3, 0);
        run.spawn_gate(&params, 0);

        let top = &run.icebergs[0];
        let bottom = &run.icebergs[1];
        assert_eq!(top.y, 0.0);
        let opening = bottom.y - (top.y + top.height);
        assert!((opening - params.spacing).abs() < 1e-3);
        assert!((bottom.y + bottom.height - CANVAS_HEIGHT).abs() < 1e-3);

        let star = &run.stars[0];
        let clearance = STAR_SIZE / 2.0 + STAR_GAP_MARGIN;
        assert!(star.pos.y >= top.height + clearance - 1e-3);
        assert!(star.pos.y <= bottom.y - clearance + 1e-3);
        assert!(!star.collected);
    }

    #[test]
    fn test_entities_scroll_left_and_get_culled() {
        let dc = DifficultyController::default();
        let mut run = RunnerSession::new(5, 0);
        // Collisions are not under test here
        run.ship.lives = u8::MAX;
        run.spawn_gate(&dc.params(1), 0);
        run.next_spawn_ms = u64::MAX;
        let x0 = run.icebergs[0].x;

        run.step(Steer::default(), 1, DT, &dc);
        assert_eq!(run.icebergs.len(), 2);
        assert!(run.icebergs.iter().all(|i| i.x < x0));

        // Scroll well past the left edge
        for t in 0..2000 {
            run.step(Steer::default(), 2 + t, DT, &dc);
        }
        assert!(run.icebergs.is_empty());
        assert!(run.stars.is_empty());
    }

    #[test]
    fn test_passing_gate_without_overlap_keeps_lives() {
        let dc = DifficultyController::default();
        let mut run = RunnerSession::new(9, 0);
        run.next_spawn_ms = u64::MAX;
        // Iceberg ending just above the ship hitbox
        let ship_box = run.ship.hitbox();
        let id = run.next_entity_id();
        run.icebergs.push(Iceberg {
            id,
            x: 400.0,
            y: 0.0,
            width: ICEBERG_WIDTH,
            height: ship_box.min.y - 5.0,
            spawned_at_ms: 0,
        });

        for t in 0..200 {
            run.step(Steer::default(), t, DT, &dc);
        }
        assert_eq!(run.ship.lives, INITIAL_LIVES);
        assert!(run.icebergs.is_empty());
    }

    #[test]
    fn test_star_scores_and_levels_up() {
        let dc = DifficultyController::default();
        let mut run = RunnerSession::new(11, 0);
        run.next_spawn_ms = u64::MAX;
        run.score = 4;
        let id = run.next_entity_id();
        run.stars.push(Star {
            id,
            pos: run.ship.pos,
            collected: false,
        });

        let outcome = run.step(Steer::default(), 0, 0.0, &dc);
        assert_eq!(outcome, RunnerOutcome::Running);
        assert_eq!(run.score, 5);
        assert_eq!(run.level, 2);
        assert!(run.stars.is_empty());
    }

    #[test]
    fn test_run_ends_when_lives_exhausted() {
        let dc = DifficultyController::default();
        let mut run = RunnerSession::new(13, 0);
        run.next_spawn_ms = u64::MAX;
        run.ship.lives = 1;
        run.score = 7;
        let id = run.next_entity_id();
        run.icebergs.push(Iceberg {
            id,
            x: run.ship.pos.x - ICEBERG_WIDTH / 2.0,
            y: 0.0,
            width: ICEBERG_WIDTH,
            height: CANVAS_HEIGHT,
            spawned_at_ms: 0,
        });

        let outcome = run.step(Steer::default(), 0, 0.0, &dc);
        assert_eq!(outcome, RunnerOutcome::Ended { score: 7, level: 1 });
        assert_eq!(run.ship.lives, 0);
    }

    #[test]
    fn test_same_seed_same_gates() {
        let dc = DifficultyController::default();
        let mut a = RunnerSession::new(77, 0);
        let mut b = RunnerSession::new(77, 0);
        a.ship.lives = u8::MAX;
        b.ship.lives = u8::MAX;
        run_until(&mut a, &dc, 5000);
        run_until(&mut b, &dc, 5000);
        assert_eq!(a.icebergs.len(), b.icebergs.len());
        for (x, y) in a.icebergs.iter().zip(&b.icebergs) {
            assert_eq!(x.y, y.y);
            assert_eq!(x.height, y.height);
        }
    }

    proptest! {
        #[test]
        fn prop_ship_never_leaves_canvas(
            steps in prop::collection::vec((any::<bool>(), any::<bool>(), 0.0f32..0.1), 1..200)
        ) {
            let dc = DifficultyController::default();
            let mut run = RunnerSession::new(21, 0);
            run.ship.lives = u8::MAX;
            let mut now = 0;
            for (up, down, dt) in steps {
                run.step(Steer { up, down }, now, dt, &dc);
                now += 16;
                let b = run.ship.bounds();
                prop_assert!(b.min.y >= SHIP_MARGIN - 1e-3);
                prop_assert!(b.max.y <= CANVAS_HEIGHT - SHIP_MARGIN + 1e-3);
            }
        }
    }

    #[test]
    fn test_default_ship_fits_band() {
        let ship = Ship::default();
        assert!(ship.bounds().min.y >= SHIP_MARGIN);
        assert!(ship.bounds().max.y <= CANVAS_HEIGHT - SHIP_MARGIN);
    }
}
