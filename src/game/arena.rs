//! Arena constants shared bit-for-bit with the browser client

/// Arena width in world units
pub const WIDTH: f64 = 800.0;
/// Arena height in world units
pub const HEIGHT: f64 = 600.0;
/// Body radius, used for wall insets and pair tests
pub const BODY_RADIUS: f64 = 15.0;
/// Minimum center distance between two bodies
pub const MIN_SEPARATION: f64 = BODY_RADIUS * 2.0;
/// Per-tick isotropic velocity damping
pub const FRICTION: f64 = 0.98;
/// Velocity retained (and reversed) on wall impact
pub const WALL_RESTITUTION: f64 = 0.7;
/// Velocity added per discrete key press
pub const KEY_SPEED: f64 = 2.5;
/// Push-back distance used when reconciling client-reported collisions
pub const RECONCILE_PUSH: f64 = 30.0;

pub const MIN_X: f64 = BODY_RADIUS;
pub const MAX_X: f64 = WIDTH - BODY_RADIUS;
pub const MIN_Y: f64 = BODY_RADIUS;
pub const MAX_Y: f64 = HEIGHT - BODY_RADIUS;

/// Arena center, the spawn fallback
pub const CENTER: (f64, f64) = (WIDTH / 2.0, HEIGHT / 2.0);

/// Clamp a point into the inset arena
pub fn clamp_to_bounds(x: f64, y: f64) -> (f64, f64) {
    (x.clamp(MIN_X, MAX_X), y.clamp(MIN_Y, MAX_Y))
}

/// Check a point lies inside the inset arena
pub fn in_bounds(x: f64, y: f64) -> bool {
    (MIN_X..=MAX_X).contains(&x) && (MIN_Y..=MAX_Y).contains(&y)
}
