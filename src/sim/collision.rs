//! Collision detection for the Titanic runner
//!
//! Ship hitbox vs iceberg hitbox costs a life; ship box vs star scores.
//! All overlap tests are closed-interval: touching edges collide, which matters
//! because iceberg hitboxes are only ~1 px wide.

use super::state::{Iceberg, Ship, Star};

/// What happened during one collision pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Lives removed this pass
    pub lives_lost: u8,
    /// Stars picked up this pass
    pub stars_collected: u32,
    /// IDs of icebergs removed because they were struck
    pub struck: Vec<u32>,
    /// Lives reached zero
    pub run_ended: bool,
}

/// Ship hitbox vs iceberg hitbox
#[inline]
pub fn ship_hits_iceberg(ship: &Ship, iceberg: &Iceberg) -> bool {
    ship.hitbox().overlaps(&iceberg.hitbox())
}

/// Stars are picked up with the full visual box
#[inline]
pub fn ship_collects_star(ship: &Ship, star: &Star) -> bool {
    !star.collected && ship.bounds().overlaps(&star.bounds())
}

/// Resolve every overlap for this tick.
///
/// Each struck iceberg costs one life and leaves play. Once lives hit zero
/// the pass stops: later icebergs and stars are left untouched.
pub fn resolve_collisions(
    ship: &mut Ship,
    icebergs: &mut Vec<Iceberg>,
    stars: &mut Vec<Star>,
) -> CollisionReport {
    let mut report = CollisionReport::default();

    icebergs.retain(|iceberg| {
        if report.run_ended || !ship_hits_iceberg(ship, iceberg) {
            return true;
        }
        report.lives_lost += 1;
        report.struck.push(iceberg.id);
        if ship.lose_life() {
            report.run_ended = true;
        }
        false
    });

    if report.run_ended {
        return report;
    }

    for star in stars.iter_mut() {
        if ship_collects_star(ship, star) {
            star.collected = true;
            report.stars_collected += 1;
        }
    }
    stars.retain(|s| !s.collected);

    report
}
