//! Spawn placement search

use rand::Rng;

use super::arena::{CENTER, MAX_X, MAX_Y, MIN_SEPARATION, MIN_X, MIN_Y};
use super::physics::Body;

/// Random trials before falling back to the arena center
pub const MAX_SPAWN_ATTEMPTS: usize = 100;

/// Find a starting point at least two body-radii from every existing body.
///
/// Best effort: after `MAX_SPAWN_ATTEMPTS` failed trials the arena center is
/// returned, occupied or not.
pub fn find_spawn_position<'a, R, I>(rng: &mut R, occupied: I) -> (f64, f64)
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a Body>,
    I::IntoIter: Clone,
{
    let occupied = occupied.into_iter();
    let min_sq = MIN_SEPARATION * MIN_SEPARATION;

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let x = rng.gen_range(MIN_X..=MAX_X);
        let y = rng.gen_range(MIN_Y..=MAX_Y);

        if occupied.clone().all(|body| body.distance_sq_to(x, y) > min_sq) {
            return (x, y);
        }
    }

    CENTER
}

/// True if a point keeps minimum separation from every body
pub fn is_clear<'a, I>(x: f64, y: f64, occupied: I) -> bool
where
    I: IntoIterator<Item = &'a Body>,
{
    let min_sq = MIN_SEPARATION * MIN_SEPARATION;
    occupied
        .into_iter()
        .all(|body| body.distance_sq_to(x, y) >= min_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::{in_bounds, BODY_RADIUS};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_arena_accepts_first_trial() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let (x, y) = find_spawn_position(&mut rng, &[] as &[Body]);
        assert!(in_bounds(x, y));
    }

    #[test]
    fn spawn_keeps_clear_of_existing_bodies() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // crowd the left half; the right half stays free
        let mut bodies = Vec::new();
        let mut x = MIN_X;
        while x < 400.0 {
            let mut y = MIN_Y;
            while y <= MAX_Y {
                bodies.push(Body::at(x, y));
                y += BODY_RADIUS;
            }
            x += BODY_RADIUS;
        }

        for _ in 0..20 {
            let (sx, sy) = find_spawn_position(&mut rng, &bodies);
            assert!(in_bounds(sx, sy));
            assert!(is_clear(sx, sy, &bodies));
        }
    }

    #[test]
    fn full_arena_falls_back_to_center() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut bodies = Vec::new();
        let mut x = MIN_X;
        while x <= MAX_X {
            let mut y = MIN_Y;
            while y <= MAX_Y {
                bodies.push(Body::at(x, y));
                y += BODY_RADIUS;
            }
            x += BODY_RADIUS;
        }

        assert_eq!(find_spawn_position(&mut rng, &bodies), CENTER);
    }
}
