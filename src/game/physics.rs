//! Body kinematics: integration, wall reflection and pairwise elastic collisions

use super::arena::{FRICTION, MAX_X, MAX_Y, MIN_SEPARATION, MIN_X, MIN_Y, WALL_RESTITUTION};

/// Position and velocity of a single body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Body {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    pub fn distance_sq_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy
    }
}

/// Physics system for advancing bodies one fixed step
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance position by velocity, then damp velocity
    pub fn integrate(body: &mut Body) {
        body.x += body.vx;
        body.y += body.vy;
        body.vx *= FRICTION;
        body.vy *= FRICTION;
    }

    /// Clamp to the inset arena, reversing and damping the velocity on each
    /// axis that hit a wall
    pub fn reflect_walls(body: &mut Body) {
        if body.x < MIN_X {
            body.x = MIN_X;
            body.vx *= -WALL_RESTITUTION;
        }
        if body.x > MAX_X {
            body.x = MAX_X;
            body.vx *= -WALL_RESTITUTION;
        }
        if body.y < MIN_Y {
            body.y = MIN_Y;
            body.vy *= -WALL_RESTITUTION;
        }
        if body.y > MAX_Y {
            body.y = MAX_Y;
            body.vy *= -WALL_RESTITUTION;
        }
    }

    /// Clamp position only; used after separation so pushes never leave the arena
    pub fn confine(body: &mut Body) {
        body.x = body.x.clamp(MIN_X, MAX_X);
        body.y = body.y.clamp(MIN_Y, MAX_Y);
    }

    /// Resolve one overlapping pair. Returns true if the pair collided.
    ///
    /// Each body is pushed back along the line of centers by half the overlap,
    /// then the velocity components along that line are exchanged. Tangential
    /// components are untouched. Coincident centers have no normal and are
    /// skipped.
    pub fn resolve_pair(a: &mut Body, b: &mut Body) -> bool {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let dist = (dx * dx + dy * dy).sqrt();

        if !(dist < MIN_SEPARATION && dist > 0.0) {
            return false;
        }

        let nx = dx / dist;
        let ny = dy / dist;

        let half_overlap = (MIN_SEPARATION - dist) / 2.0;
        a.x -= nx * half_overlap;
        a.y -= ny * half_overlap;
        b.x += nx * half_overlap;
        b.y += ny * half_overlap;

        let va = a.vx * nx + a.vy * ny;
        let vb = b.vx * nx + b.vy * ny;
        a.vx += (vb - va) * nx;
        a.vy += (vb - va) * ny;
        b.vx += (va - vb) * nx;
        b.vy += (va - vb) * ny;

        true
    }

    /// Run one full step over a set of bodies.
    ///
    /// Every body is integrated and wall-reflected before any pair is
    /// resolved; each unordered pair is visited exactly once in slice order.
    /// Returns the number of colliding pairs.
    pub fn step(bodies: &mut [&mut Body]) -> usize {
        for body in bodies.iter_mut() {
            Self::integrate(body);
            Self::reflect_walls(body);
        }

        let mut collisions = 0;
        for i in 0..bodies.len() {
            let (head, tail) = bodies.split_at_mut(i + 1);
            let a = &mut *head[i];
            for b in tail.iter_mut() {
                if Self::resolve_pair(a, b) {
                    collisions += 1;
                }
            }
        }

        if collisions > 0 {
            for body in bodies.iter_mut() {
                Self::confine(body);
            }
        }

        collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::{HEIGHT, WIDTH};
    use assert_approx_eq::assert_approx_eq;

    fn moving(x: f64, y: f64, vx: f64, vy: f64) -> Body {
        Body { x, y, vx, vy }
    }

    fn distance(a: &Body, b: &Body) -> f64 {
        a.distance_sq_to(b.x, b.y).sqrt()
    }

    #[test]
    fn integrate_moves_then_damps() {
        let mut body = moving(100.0, 100.0, 10.0, -5.0);
        PhysicsSystem::integrate(&mut body);
        assert_approx_eq!(body.x, 110.0);
        assert_approx_eq!(body.y, 95.0);
        assert_approx_eq!(body.vx, 9.8);
        assert_approx_eq!(body.vy, -4.9);
    }

    #[test]
    fn wall_hit_clamps_and_reverses_axis() {
        let mut body = moving(WIDTH + 20.0, 300.0, 4.0, 1.0);
        PhysicsSystem::reflect_walls(&mut body);
        assert_eq!(body.x, MAX_X);
        assert_approx_eq!(body.vx, -2.8);
        assert_eq!(body.vy, 1.0);

        let mut body = moving(400.0, -3.0, 0.0, -10.0);
        PhysicsSystem::reflect_walls(&mut body);
        assert_eq!(body.y, MIN_Y);
        assert_approx_eq!(body.vy, 7.0);
    }

    #[test]
    fn head_on_pair_swaps_normal_velocity() {
        let mut a = moving(100.0, 300.0, 2.0, 0.0);
        let mut b = moving(120.0, 300.0, -2.0, 0.0);
        {
            let mut bodies = [&mut a, &mut b];
            assert_eq!(PhysicsSystem::step(&mut bodies), 1);
        }
        // friction first: 2.0 * 0.98
        assert_approx_eq!(a.vx, -1.96);
        assert_approx_eq!(b.vx, 1.96);
        assert_eq!(a.vy, 0.0);
        assert_eq!(b.vy, 0.0);
        assert_approx_eq!(distance(&a, &b), MIN_SEPARATION);
    }

    #[test]
    fn tangential_component_is_untouched() {
        // normal along x, tangential along y
        let mut a = moving(100.0, 300.0, 3.0, 1.5);
        let mut b = moving(110.0, 300.0, -1.0, -0.5);
        assert!(PhysicsSystem::resolve_pair(&mut a, &mut b));
        assert_approx_eq!(a.vx, -1.0);
        assert_approx_eq!(b.vx, 3.0);
        assert_approx_eq!(a.vy, 1.5);
        assert_approx_eq!(b.vy, -0.5);
    }

    #[test]
    fn coincident_pair_is_skipped() {
        let mut a = moving(200.0, 200.0, 1.0, 0.0);
        let mut b = moving(200.0, 200.0, -1.0, 0.0);
        assert!(!PhysicsSystem::resolve_pair(&mut a, &mut b));
        assert_eq!(a.x, 200.0);
        assert_eq!(b.vx, -1.0);
        assert!(a.x.is_finite() && a.vx.is_finite());
    }

    #[test]
    fn overlapping_pairs_never_move_closer() {
        let mut a = moving(300.0, 300.0, 0.0, 0.0);
        let mut b = moving(310.0, 305.0, 0.0, 0.0);
        let mut c = moving(290.0, 320.0, 0.0, 0.0);
        let before_ab = distance(&a, &b);
        let before_ac = distance(&a, &c);
        {
            let mut bodies = [&mut a, &mut b, &mut c];
            PhysicsSystem::step(&mut bodies);
        }
        assert!(distance(&a, &b) >= before_ab);
        assert!(distance(&a, &c) >= before_ac);
    }

    #[test]
    fn separation_near_wall_stays_in_bounds() {
        let mut a = moving(MIN_X, 300.0, 0.0, 0.0);
        let mut b = moving(MIN_X + 5.0, 300.0, 0.0, 0.0);
        {
            let mut bodies = [&mut b, &mut a];
            PhysicsSystem::step(&mut bodies);
        }
        for body in [&a, &b] {
            assert!(body.x >= MIN_X && body.x <= MAX_X);
            assert!(body.y >= MIN_Y && body.y <= HEIGHT - MIN_Y);
        }
    }
}
