//! Reconciliation of client-reported collisions
//!
//! Clients report their own proposed position and an approximate partner
//! position. The server only sanity-filters these: positions are clamped to
//! the arena, re-checked against every other body, and rejected outright if
//! they sit implausibly far from the authoritative position.

use std::f64::consts::PI;

use super::arena::{clamp_to_bounds, MIN_SEPARATION, RECONCILE_PUSH};
use super::player::PlayerId;
use super::world::{World, WorldState};
use crate::util::time;

/// A decoded collision report
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    pub reporter: PlayerId,
    pub partner: PlayerId,
    pub my_new_x: f64,
    pub my_new_y: f64,
    pub partner_x: f64,
    pub partner_y: f64,
    pub angle: Option<f64>,
}

impl CollisionReport {
    fn is_finite(&self) -> bool {
        [self.my_new_x, self.my_new_y, self.partner_x, self.partner_y]
            .iter()
            .chain(self.angle.iter())
            .all(|v| v.is_finite())
    }
}

/// Positions applied by a reconciliation, for `player_move` fan-out
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub reporter: Option<(PlayerId, f64, f64)>,
    pub partner: Option<(PlayerId, f64, f64)>,
}

/// Move a participant to `(x, y)`, clamped to the arena.
///
/// If the target overlaps another body, the participant is placed exactly
/// `MIN_SEPARATION` from the first body it overlaps, along the line from that
/// body to the target, then clamped again. Returns the applied position or
/// `None` if the participant is absent.
pub fn set_position_checked(state: &mut WorldState, id: &PlayerId, x: f64, y: f64) -> Option<(f64, f64)> {
    if !state.contains(id) {
        return None;
    }

    let (x, y) = clamp_to_bounds(x, y);
    let min_sq = MIN_SEPARATION * MIN_SEPARATION;

    let bounce = state
        .bodies_except(id)
        .find(|other| other.distance_sq_to(x, y) < min_sq)
        .map(|other| {
            let angle = (y - other.y).atan2(x - other.x);
            clamp_to_bounds(
                other.x + angle.cos() * MIN_SEPARATION,
                other.y + angle.sin() * MIN_SEPARATION,
            )
        });

    let (x, y) = bounce.unwrap_or((x, y));
    let player = state.get_mut(id)?;
    player.body.x = x;
    player.body.y = y;
    player.last_seen = time::now();
    Some((x, y))
}

/// Sanity filter for client-reported positions
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    /// Max distance a reported position may be from the authoritative one
    pub max_distance: f64,
}

impl Reconciler {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    fn plausible(&self, state: &WorldState, id: &PlayerId, x: f64, y: f64) -> bool {
        state
            .get(id)
            .map(|p| p.body.distance_sq_to(x, y) <= self.max_distance_sq())
            .unwrap_or(false)
    }

    fn max_distance_sq(&self) -> f64 {
        self.max_distance * self.max_distance
    }

    /// Apply a report in one exclusive lock window.
    ///
    /// The reporter moves to its proposed position (if plausible). The partner
    /// is pushed `RECONCILE_PUSH` units opposite the collision angle from its
    /// reported position, or from its authoritative position when the report
    /// is implausible. Without a reported angle, the push direction is taken
    /// from wherever the reporter stands after this report. A report naming an absent partner moves nobody but the
    /// reporter.
    pub fn apply(&self, world: &World, report: &CollisionReport) -> Reconciled {
        if !report.is_finite() || report.reporter == report.partner {
            return Reconciled {
                reporter: None,
                partner: None,
            };
        }

        world.write(|state| {
            let reporter = if self.plausible(state, &report.reporter, report.my_new_x, report.my_new_y) {
                set_position_checked(state, &report.reporter, report.my_new_x, report.my_new_y)
                    .map(|(x, y)| (report.reporter.clone(), x, y))
            } else {
                None
            };

            let partner_base = state.get(&report.partner).map(|partner| {
                let body = partner.body;
                if body.distance_sq_to(report.partner_x, report.partner_y) <= self.max_distance_sq() {
                    (report.partner_x, report.partner_y)
                } else {
                    (body.x, body.y)
                }
            });

            // where the reporter actually ended up; its claim only if it was accepted
            let (rx, ry) = reporter
                .as_ref()
                .map(|(_, x, y)| (*x, *y))
                .or_else(|| state.get(&report.reporter).map(|p| (p.body.x, p.body.y)))
                .unwrap_or((report.my_new_x, report.my_new_y));

            let partner = partner_base.and_then(|(px, py)| {
                let angle = report.angle.unwrap_or_else(|| (ry - py).atan2(rx - px));
                let opposite = angle + PI;
                let (nx, ny) = clamp_to_bounds(
                    px + opposite.cos() * RECONCILE_PUSH,
                    py + opposite.sin() * RECONCILE_PUSH,
                );
                set_position_checked(state, &report.partner, nx, ny)
                    .map(|(x, y)| (report.partner.clone(), x, y))
            });

            Reconciled { reporter, partner }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::{in_bounds, MAX_X};
    use crate::game::player::Player;
    use crate::game::world::RenamePolicy;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn nearby<R: Rng>(rng: &mut R, x: f64, y: f64, radius: f64) -> (f64, f64) {
        (x + rng.gen_range(-radius..radius), y + rng.gen_range(-radius..radius))
    }

    fn world_with(players: &[(&str, f64, f64)]) -> World {
        let world = World::new(Some(4), RenamePolicy::ResetAll);
        for (id, x, y) in players {
            world.add(Player::new(PlayerId::from(*id), "", "#FF6B6B", *x, *y));
        }
        world
    }

    fn report(me: &str, partner: &str, mine: (f64, f64), theirs: (f64, f64), angle: Option<f64>) -> CollisionReport {
        CollisionReport {
            reporter: PlayerId::from(me),
            partner: PlayerId::from(partner),
            my_new_x: mine.0,
            my_new_y: mine.1,
            partner_x: theirs.0,
            partner_y: theirs.1,
            angle,
        }
    }

    #[test]
    fn free_target_is_applied_as_is() {
        let world = world_with(&[("aaaaaaaa", 100.0, 100.0), ("bbbbbbbb", 400.0, 400.0)]);
        let applied = world.write(|s| set_position_checked(s, &PlayerId::from("aaaaaaaa"), 120.0, 90.0));
        assert_eq!(applied, Some((120.0, 90.0)));
    }

    #[test]
    fn overlapping_target_bounces_to_min_separation() {
        let world = world_with(&[("aaaaaaaa", 100.0, 100.0), ("bbbbbbbb", 200.0, 200.0)]);
        let (x, y) = world
            .write(|s| set_position_checked(s, &PlayerId::from("aaaaaaaa"), 190.0, 200.0))
            .unwrap();
        assert_approx_eq!(x, 170.0);
        assert_approx_eq!(y, 200.0);
    }

    #[test]
    fn out_of_bounds_target_is_clamped() {
        let world = world_with(&[("aaaaaaaa", 700.0, 300.0)]);
        let applied = world.write(|s| set_position_checked(s, &PlayerId::from("aaaaaaaa"), 900.0, 300.0));
        assert_eq!(applied, Some((MAX_X, 300.0)));
    }

    #[test]
    fn absent_player_is_ignored() {
        let world = world_with(&[]);
        assert!(world
            .write(|s| set_position_checked(s, &PlayerId::from("ghost000"), 10.0, 10.0))
            .is_none());
    }

    #[test]
    fn partner_is_pushed_opposite_the_reported_angle() {
        let world = world_with(&[("aaaaaaaa", 300.0, 300.0), ("bbbbbbbb", 330.0, 300.0)]);
        let reconciler = Reconciler::new(90.0);
        // reporter sits left of the partner; collision angle points from partner to reporter
        let outcome = reconciler.apply(
            &world,
            &report("aaaaaaaa", "bbbbbbbb", (295.0, 300.0), (330.0, 300.0), Some(PI)),
        );

        let (_, rx, ry) = outcome.reporter.unwrap();
        assert_eq!((rx, ry), (295.0, 300.0));
        let (_, px, py) = outcome.partner.unwrap();
        assert_approx_eq!(px, 360.0);
        assert_approx_eq!(py, 300.0);
    }

    #[test]
    fn missing_angle_is_derived_from_positions() {
        let world = world_with(&[("aaaaaaaa", 300.0, 300.0), ("bbbbbbbb", 300.0, 340.0)]);
        let outcome = Reconciler::new(90.0).apply(
            &world,
            &report("aaaaaaaa", "bbbbbbbb", (300.0, 300.0), (300.0, 340.0), None),
        );
        let (_, px, py) = outcome.partner.unwrap();
        assert_approx_eq!(px, 300.0);
        assert_approx_eq!(py, 370.0);
    }

    #[test]
    fn implausible_reporter_position_is_rejected() {
        let world = world_with(&[("aaaaaaaa", 100.0, 100.0), ("bbbbbbbb", 130.0, 100.0)]);
        let outcome = Reconciler::new(50.0).apply(
            &world,
            &report("aaaaaaaa", "bbbbbbbb", (700.0, 500.0), (130.0, 100.0), Some(PI)),
        );
        assert!(outcome.reporter.is_none());
        assert_eq!(world.get(&PlayerId::from("aaaaaaaa")).unwrap().body.x, 100.0);
        // partner still resolved from its authoritative position
        assert!(outcome.partner.is_some());
    }

    #[test]
    fn rejected_reporter_claim_does_not_steer_derived_angle() {
        let world = world_with(&[("aaaaaaaa", 100.0, 300.0), ("bbbbbbbb", 130.0, 300.0)]);
        // claimed position lies on the far side of the partner
        let outcome = Reconciler::new(50.0).apply(
            &world,
            &report("aaaaaaaa", "bbbbbbbb", (700.0, 300.0), (130.0, 300.0), None),
        );
        assert!(outcome.reporter.is_none());
        let (_, px, py) = outcome.partner.unwrap();
        assert_approx_eq!(px, 160.0);
        assert_approx_eq!(py, 300.0);
    }

    #[test]
    fn implausible_partner_position_uses_authoritative_base() {
        let world = world_with(&[("aaaaaaaa", 100.0, 300.0), ("bbbbbbbb", 130.0, 300.0)]);
        let outcome = Reconciler::new(50.0).apply(
            &world,
            &report("aaaaaaaa", "bbbbbbbb", (100.0, 300.0), (600.0, 100.0), Some(PI)),
        );
        let (_, px, py) = outcome.partner.unwrap();
        assert_approx_eq!(px, 160.0);
        assert_approx_eq!(py, 300.0);
    }

    #[test]
    fn reconciled_positions_stay_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let world = world_with(&[("aaaaaaaa", 20.0, 20.0), ("bbbbbbbb", 40.0, 30.0), ("cccccccc", 30.0, 50.0)]);
        let reconciler = Reconciler::new(90.0);
        for _ in 0..50 {
            let (mx, my) = nearby(&mut rng, 25.0, 25.0, 20.0);
            let (px, py) = nearby(&mut rng, 35.0, 35.0, 20.0);
            reconciler.apply(&world, &report("aaaaaaaa", "bbbbbbbb", (mx, my), (px, py), None));
            world.read(|s| {
                for p in s.players() {
                    assert!(in_bounds(p.body.x, p.body.y));
                }
            });
        }
    }

    #[test]
    fn non_finite_report_moves_nobody() {
        let world = world_with(&[("aaaaaaaa", 100.0, 100.0), ("bbbbbbbb", 130.0, 100.0)]);
        let outcome = Reconciler::new(90.0).apply(
            &world,
            &report("aaaaaaaa", "bbbbbbbb", (f64::NAN, 100.0), (130.0, 100.0), None),
        );
        assert_eq!(outcome, Reconciled { reporter: None, partner: None });
    }
}
