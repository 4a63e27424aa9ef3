//! Collision detection and response between round bodies
//!
//! Falling objects resolve with a mass-weighted elastic impulse; colors-mode
//! dots use a cheaper equal-split velocity swap.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the first body's surface (if hit)
    pub point: Vec2,
    /// Unit normal from the first body toward the second
    pub normal: Vec2,
    /// Overlap depth before separation
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// A round body taking part in pairwise resolution
pub trait Body {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn radius(&self) -> f32;
    fn mass(&self) -> f32;
    fn set_position(&mut self, pos: Vec2);
    fn set_velocity(&mut self, vel: Vec2);

    /// Dead bodies stay in their collection but take no part in collisions
    fn is_solid(&self) -> bool {
        true
    }
}

/// Runs collision resolution only every Nth frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionThrottle {
    frequency: u64,
}

impl CollisionThrottle {
    pub fn new(frequency: u64) -> Self {
        Self {
            frequency: frequency.max(1),
        }
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    #[inline]
    pub fn should_check(&self, frame: u64) -> bool {
        frame % self.frequency == 0
    }
}

/// Mutable references to two distinct elements, `i != j`
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i != j);
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Mass-weighted elastic resolution of one pair.
///
/// Each body is pushed out by the overlap weighted by the other body's mass
/// share, then receives the impulse `2 (v_rel . n) / (m1 + m2)` scaled by the
/// other mass and `restitution`. Coincident centers are skipped.
pub fn resolve_elastic<B: Body + ?Sized>(a: &mut B, b: &mut B, restitution: f32) -> CollisionResult {
    let delta = b.position() - a.position();
    let dist_sq = delta.length_squared();
    let radii = a.radius() + b.radius();
    if dist_sq >= radii * radii || dist_sq == 0.0 {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    let normal = delta / dist;
    let overlap = radii - dist;
    let (ma, mb) = (a.mass(), b.mass());
    let total = ma + mb;
    if total <= 0.0 {
        return CollisionResult::miss();
    }

    a.set_position(a.position() - normal * overlap * (mb / total));
    b.set_position(b.position() + normal * overlap * (ma / total));

    let along = (a.velocity() - b.velocity()).dot(normal);
    let impulse = 2.0 * along / total;
    a.set_velocity(a.velocity() - normal * impulse * mb * restitution);
    b.set_velocity(b.velocity() + normal * impulse * ma * restitution);

    CollisionResult {
        hit: true,
        point: a.position() + normal * a.radius(),
        normal,
        penetration: overlap,
    }
}

/// Resolve every unordered pair once; returns the number of contacts
pub fn resolve_all<B: Body>(bodies: &mut [B], restitution: f32) -> usize {
    let mut contacts = 0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, b) = pair_mut(bodies, i, j);
            if !a.is_solid() || !b.is_solid() {
                continue;
            }
            if resolve_elastic(a, b, restitution).hit {
                contacts += 1;
            }
        }
    }
    contacts
}

/// Dot variant: separate equally and swap damped velocities.
///
/// Only approaching pairs are resolved. Coincident centers use normal (1, 0).
pub fn resolve_swap<B: Body + ?Sized>(a: &mut B, b: &mut B, dampening: f32) -> CollisionResult {
    let delta = a.position() - b.position();
    let dist = delta.length();
    let radii = a.radius() + b.radius();
    if dist >= radii {
        return CollisionResult::miss();
    }

    let normal = if dist > 0.0 { delta / dist } else { Vec2::X };
    let along = (a.velocity() - b.velocity()).dot(normal);
    if along >= 0.0 {
        return CollisionResult::miss();
    }

    let overlap = radii - dist;
    a.set_position(a.position() + normal * overlap * 0.5);
    b.set_position(b.position() - normal * overlap * 0.5);

    let (va, vb) = (a.velocity(), b.velocity());
    a.set_velocity(vb * dampening);
    b.set_velocity(va * dampening);

    CollisionResult {
        hit: true,
        point: (a.position() + b.position()) * 0.5,
        normal: -normal,
        penetration: overlap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Ball {
        pos: Vec2,
        vel: Vec2,
        radius: f32,
        mass: f32,
        solid: bool,
    }

    impl Ball {
        fn new(pos: Vec2, vel: Vec2, radius: f32, mass: f32) -> Self {
            Self {
                pos,
                vel,
                radius,
                mass,
                solid: true,
            }
        }

        fn momentum(&self) -> Vec2 {
            self.vel * self.mass
        }
    }

    impl Body for Ball {
        fn position(&self) -> Vec2 {
            self.pos
        }
        fn velocity(&self) -> Vec2 {
            self.vel
        }
        fn radius(&self) -> f32 {
            self.radius
        }
        fn mass(&self) -> f32 {
            self.mass
        }
        fn set_position(&mut self, pos: Vec2) {
            self.pos = pos;
        }
        fn set_velocity(&mut self, vel: Vec2) {
            self.vel = vel;
        }
        fn is_solid(&self) -> bool {
            self.solid
        }
    }

    #[test]
    fn test_head_on_equal_masses() {
        let mut a = Ball::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 10.0, 1.0);
        let mut b = Ball::new(Vec2::new(15.0, 0.0), Vec2::new(-1.0, 0.0), 10.0, 1.0);

        let result = resolve_elastic(&mut a, &mut b, 1.0);
        assert!(result.hit);
        assert!((result.penetration - 5.0).abs() < 1e-5);
        assert!((a.pos.x + 2.5).abs() < 1e-5);
        assert!((b.pos.x - 17.5).abs() < 1e-5);
        // Perfect restitution swaps velocities for equal masses
        assert!((a.vel.x + 1.0).abs() < 1e-5);
        assert!((b.vel.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_heavier_body_moves_less() {
        let mut light = Ball::new(Vec2::new(0.0, 0.0), Vec2::ZERO, 10.0, 1.0);
        let mut heavy = Ball::new(Vec2::new(10.0, 0.0), Vec2::ZERO, 10.0, 3.0);
        resolve_elastic(&mut light, &mut heavy, 0.85);
        let light_shift = light.pos.x.abs();
        let heavy_shift = heavy.pos.x - 10.0;
        assert!((light_shift - 7.5).abs() < 1e-4);
        assert!((heavy_shift - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_coincident_and_separated_skip() {
        let mut a = Ball::new(Vec2::ONE, Vec2::X, 10.0, 1.0);
        let mut b = Ball::new(Vec2::ONE, -Vec2::X, 10.0, 1.0);
        assert!(!resolve_elastic(&mut a, &mut b, 0.85).hit);

        let mut c = Ball::new(Vec2::new(100.0, 0.0), Vec2::ZERO, 10.0, 1.0);
        assert!(!resolve_elastic(&mut a, &mut c, 0.85).hit);
    }

    #[test]
    fn test_resolve_all_skips_non_solid() {
        let mut balls = vec![
            Ball::new(Vec2::new(0.0, 0.0), Vec2::X, 10.0, 1.0),
            Ball::new(Vec2::new(5.0, 0.0), -Vec2::X, 10.0, 1.0),
            Ball::new(Vec2::new(2.0, 0.0), Vec2::ZERO, 10.0, 1.0),
        ];
        balls[2].solid = false;
        assert_eq!(resolve_all(&mut balls, 0.85), 1);
        assert_eq!(balls[2].pos, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_swap_only_when_approaching() {
        let mut a = Ball::new(Vec2::new(0.0, 0.0), Vec2::new(-1.0, 0.0), 10.0, 1.0);
        let mut b = Ball::new(Vec2::new(15.0, 0.0), Vec2::new(1.0, 0.0), 10.0, 1.0);
        assert!(!resolve_swap(&mut a, &mut b, 0.8).hit);

        let mut a = Ball::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), 10.0, 1.0);
        let mut b = Ball::new(Vec2::new(15.0, 0.0), Vec2::new(-1.0, 1.0), 10.0, 1.0);
        let result = resolve_swap(&mut a, &mut b, 0.8);
        assert!(result.hit);
        assert!((a.vel - Vec2::new(-0.8, 0.8)).length() < 1e-5);
        assert!((b.vel - Vec2::new(1.6, 0.0)).length() < 1e-5);
        assert!((a.pos.x + 2.5).abs() < 1e-5);
        assert!((b.pos.x - 17.5).abs() < 1e-5);
        assert!((result.point - Vec2::new(7.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_swap_coincident_uses_x_normal() {
        let mut a = Ball::new(Vec2::new(5.0, 5.0), Vec2::new(-1.0, 0.0), 10.0, 1.0);
        let mut b = Ball::new(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0), 10.0, 1.0);
        let result = resolve_swap(&mut a, &mut b, 0.8);
        assert!(result.hit);
        assert!((a.pos.x - 15.0).abs() < 1e-5);
        assert!((b.pos.x + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_throttle() {
        let throttle = CollisionThrottle::new(2);
        assert!(throttle.should_check(0));
        assert!(!throttle.should_check(1));
        assert!(throttle.should_check(4));
        assert_eq!(CollisionThrottle::new(0).frequency(), 1);
    }

    #[test]
    fn test_pair_mut_either_order() {
        let mut items = [1, 2, 3];
        let (a, b) = pair_mut(&mut items, 2, 0);
        std::mem::swap(a, b);
        assert_eq!(items, [3, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_momentum_changes_equal_and_opposite(
            ax in -20.0f32..20.0, ay in -20.0f32..20.0,
            bx in -20.0f32..20.0, by in -20.0f32..20.0,
            avx in -5.0f32..5.0, avy in -5.0f32..5.0,
            bvx in -5.0f32..5.0, bvy in -5.0f32..5.0,
            ma in 40.0f32..60.0, mb in 40.0f32..60.0,
        ) {
            let mut a = Ball::new(Vec2::new(ax, ay), Vec2::new(avx, avy), 20.0, ma);
            let mut b = Ball::new(Vec2::new(bx, by), Vec2::new(bvx, bvy), 20.0, mb);
            let (pa, pb) = (a.momentum(), b.momentum());

            resolve_elastic(&mut a, &mut b, 0.85);

            let da = a.momentum() - pa;
            let db = b.momentum() - pb;
            let scale = 1.0 + pa.length() + pb.length();
            prop_assert!((da + db).length() <= 1e-3 * scale);
        }
    }
}
