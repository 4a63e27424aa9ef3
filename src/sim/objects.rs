//! Falling letters, numbers and shapes
//!
//! Objects drift down from above the screen, start bouncing once they are a
//! fifth of the way down, and collide with each other every Nth frame.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::collision::{self, Body, CollisionThrottle};
use super::mode::GameMode;
use super::rng;
use crate::consts::{BOUNCE_DAMPENING, RESTITUTION};
use crate::renderer::vertex::colors;
use crate::renderer::{Surface, TextRenderer};
use crate::Rect;

/// Rendered size of a spawned object
pub const OBJECT_SIZE: f32 = 240.0;
/// Collision radius is the size divided by this
pub const COLLISION_RADIUS_DIVISOR: f32 = 1.8;
/// Spawn height above the top edge
const SPAWN_Y: f32 = -50.0;
/// Horizontal spawn margin
const SPAWN_MARGIN: f32 = 50.0;
const DX_CHOICES: [f32; 4] = [-1.0, -0.5, 0.5, 1.0];
const DY_CHOICES: [f32; 2] = [1.0, 1.5];
const SPAWN_SPEED: f32 = 1.5;
/// Horizontal nudge range after a bottom bounce
const BOTTOM_NUDGE: (f32, f32) = (0.1, 0.3);

/// Push effect radius around a destroyed target
pub const PUSH_RADIUS: f32 = 150.0;
const PUSH_FORCE: f32 = 15.0;

/// A falling target or distractor
#[derive(Debug, Clone, PartialEq)]
pub struct FallingObject {
    pub value: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub mass: f32,
    /// False until the object has fallen past a fifth of the screen
    pub can_bounce: bool,
    /// Bounds from the last draw; empty until first drawn
    pub rect: Rect,
}

impl FallingObject {
    pub fn new(value: impl Into<String>, pos: Vec2, vel: Vec2, size: f32, mass: f32) -> Self {
        Self {
            value: value.into(),
            pos,
            vel,
            size,
            mass,
            can_bounce: false,
            rect: Rect::ZERO,
        }
    }

    pub fn collision_radius(&self) -> f32 {
        self.size / COLLISION_RADIUS_DIVISOR
    }

    /// Move by one frame of velocity and open the bounce gate when low enough
    pub fn integrate(&mut self, screen_height: f32) {
        self.pos += self.vel;
        if !self.can_bounce && self.pos.y > screen_height / 5.0 {
            self.can_bounce = true;
        }
    }

    /// Reflect off screen edges with dampening.
    ///
    /// Bottom bounces also dampen dx and nudge it away from the horizontal
    /// center so objects do not pile up in the middle.
    pub fn bounce(&mut self, screen: Vec2, rng: &mut Pcg32) {
        if !self.can_bounce {
            return;
        }
        let half = self.size / 2.0;

        if self.pos.x - half <= 0.0 {
            self.pos.x = half;
            self.vel.x = self.vel.x.abs() * BOUNCE_DAMPENING;
        } else if self.pos.x + half >= screen.x {
            self.pos.x = screen.x - half;
            self.vel.x = -self.vel.x.abs() * BOUNCE_DAMPENING;
        }

        if self.pos.y - half <= 0.0 {
            self.pos.y = half;
            self.vel.y = self.vel.y.abs() * BOUNCE_DAMPENING;
        } else if self.pos.y + half >= screen.y {
            self.pos.y = screen.y - half;
            self.vel.y = -self.vel.y.abs() * BOUNCE_DAMPENING;
            self.vel.x *= BOUNCE_DAMPENING;
            let nudge = rng::uniform(rng, BOTTOM_NUDGE.0, BOTTOM_NUDGE.1);
            if self.pos.x < screen.x / 2.0 {
                self.vel.x -= nudge;
            } else {
                self.vel.x += nudge;
            }
        }
    }
}

impl Body for FallingObject {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn velocity(&self) -> Vec2 {
        self.vel
    }
    fn radius(&self) -> f32 {
        self.collision_radius()
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
}

/// Outcome of testing a tap against the falling objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTest {
    /// Index of the first containing object whose value is the target
    Target(usize),
    /// The tap landed only on non-target objects
    Other(usize),
    Miss,
}

/// All objects on screen for the current level
#[derive(Debug, Clone)]
pub struct FallingObjectSet {
    objects: Vec<FallingObject>,
    screen: Vec2,
    throttle: CollisionThrottle,
    rng: Pcg32,
}

impl FallingObjectSet {
    pub fn new(screen: Vec2, collision_frequency: u64, rng: Pcg32) -> Self {
        Self {
            objects: Vec::new(),
            screen,
            throttle: CollisionThrottle::new(collision_frequency),
            rng,
        }
    }

    /// Spawn a value above the screen with randomized drift
    pub fn spawn(&mut self, value: impl Into<String>, speed_scale: f32) -> &FallingObject {
        let x = rng::uniform(&mut self.rng, SPAWN_MARGIN, self.screen.x - SPAWN_MARGIN);
        let dx = *DX_CHOICES.choose(&mut self.rng).unwrap_or(&DX_CHOICES[0]);
        let dy = *DY_CHOICES.choose(&mut self.rng).unwrap_or(&DY_CHOICES[0]);
        let vel = Vec2::new(dx, dy) * SPAWN_SPEED * speed_scale;
        let mass = self.rng.random_range(40.0..=60.0);
        self.insert(FallingObject::new(value, Vec2::new(x, SPAWN_Y), vel, OBJECT_SIZE, mass))
    }

    pub fn insert(&mut self, object: FallingObject) -> &FallingObject {
        self.objects.push(object);
        &self.objects[self.objects.len() - 1]
    }

    /// Integrate and bounce every object
    pub fn advance(&mut self) {
        let screen = self.screen;
        for object in &mut self.objects {
            object.integrate(screen.y);
            object.bounce(screen, &mut self.rng);
        }
    }

    /// Resolve pairwise collisions on throttled frames; returns contacts
    pub fn resolve_collisions(&mut self, frame: u64) -> usize {
        if !self.throttle.should_check(frame) {
            return 0;
        }
        collision::resolve_all(&mut self.objects, RESTITUTION)
    }

    pub fn hit_test(&self, point: Vec2, target: Option<&str>) -> HitTest {
        let mut other = None;
        for (index, object) in self.objects.iter().enumerate() {
            if !object.rect.contains(point) {
                continue;
            }
            if target == Some(object.value.as_str()) {
                return HitTest::Target(index);
            }
            other.get_or_insert(index);
        }
        match other {
            Some(index) => HitTest::Other(index),
            None => HitTest::Miss,
        }
    }

    pub fn remove(&mut self, index: usize) -> FallingObject {
        self.objects.remove(index)
    }

    /// Shove nearby objects outward from `center`
    pub fn apply_push(&mut self, center: Vec2, radius: f32) {
        for object in &mut self.objects {
            let delta = object.pos - center;
            let dist = delta.length();
            if dist > 0.0 && dist < radius {
                let force = (1.0 - dist / radius) * PUSH_FORCE;
                object.vel += delta / dist * force;
                object.can_bounce = true;
            }
        }
    }

    /// Draw every object and refresh its hit-test rectangle
    pub fn draw(
        &mut self,
        surface: &mut dyn Surface,
        text: &mut dyn TextRenderer,
        mode: GameMode,
        target: Option<&str>,
        offset: Vec2,
    ) {
        for object in &mut self.objects {
            let color = if target == Some(object.value.as_str()) {
                colors::TARGET
            } else {
                colors::NON_TARGET
            };
            let glyph = text.glyph(mode, mode.display_value(&object.value), color);
            object.rect = glyph.bounding_rect(object.pos + offset);
            surface.glyph(&glyph, object.rect, 255);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FallingObject> {
        self.objects.iter()
    }

    pub fn get(&self, index: usize) -> Option<&FallingObject> {
        self.objects.get(index)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{BlockGlyphs, VertexBatch};
    use proptest::prelude::*;

    const SCREEN: Vec2 = Vec2::new(1000.0, 800.0);

    fn set() -> FallingObjectSet {
        FallingObjectSet::new(SCREEN, 1, rng::stream(11, rng::streams::OBJECTS))
    }

    #[test]
    fn test_spawn_parameters() {
        let mut objects = set();
        for _ in 0..50 {
            let o = objects.spawn("A", 1.0).clone();
            assert!(o.pos.x >= 50.0 && o.pos.x < 950.0);
            assert_eq!(o.pos.y, -50.0);
            assert!(o.vel.y > 0.0);
            assert!((40.0..=60.0).contains(&o.mass));
            assert!(!o.can_bounce);
            assert_eq!(o.rect, Rect::ZERO);
        }
    }

    #[test]
    fn test_bounce_gate_opens_below_fifth() {
        let mut o = FallingObject::new("A", Vec2::new(500.0, 150.0), Vec2::new(0.0, 6.0), 240.0, 50.0);
        o.integrate(800.0);
        assert!(!o.can_bounce);
        o.integrate(800.0);
        assert!(o.can_bounce);
    }

    #[test]
    fn test_gated_object_passes_through_top() {
        let mut rng = rng::stream(1, 0);
        let mut o = FallingObject::new("A", Vec2::new(500.0, -50.0), Vec2::new(0.0, 1.0), 240.0, 50.0);
        o.bounce(SCREEN, &mut rng);
        assert_eq!(o.pos.y, -50.0);
        assert_eq!(o.vel.y, 1.0);
    }

    #[test]
    fn test_bottom_bounce_nudges_away_from_center() {
        let mut rng = rng::stream(2, 0);
        let mut o = FallingObject::new("A", Vec2::new(300.0, 790.0), Vec2::new(0.0, 4.0), 240.0, 50.0);
        o.can_bounce = true;
        o.bounce(SCREEN, &mut rng);
        assert_eq!(o.pos.y, 680.0);
        assert!((o.vel.y + 3.2).abs() < 1e-5);
        assert!(o.vel.x <= -0.1 && o.vel.x >= -0.3);
    }

    #[test]
    fn test_hit_test_prefers_target() {
        let mut objects = set();
        let mut a = FallingObject::new("A", Vec2::new(100.0, 100.0), Vec2::ZERO, 240.0, 50.0);
        a.rect = Rect::from_center(a.pos, Vec2::splat(100.0));
        let mut b = FallingObject::new("B", Vec2::new(110.0, 100.0), Vec2::ZERO, 240.0, 50.0);
        b.rect = Rect::from_center(b.pos, Vec2::splat(100.0));
        objects.insert(a);
        objects.insert(b);

        assert_eq!(objects.hit_test(Vec2::new(105.0, 100.0), Some("B")), HitTest::Target(1));
        assert_eq!(objects.hit_test(Vec2::new(105.0, 100.0), Some("C")), HitTest::Other(0));
        assert_eq!(objects.hit_test(Vec2::new(900.0, 700.0), Some("B")), HitTest::Miss);
    }

    #[test]
    fn test_undrawn_object_cannot_be_hit() {
        let mut objects = set();
        objects.spawn("A", 1.0);
        assert_eq!(objects.hit_test(Vec2::ZERO, Some("A")), HitTest::Miss);
    }

    #[test]
    fn test_draw_sets_rect_with_offset() {
        let mut objects = set();
        objects.insert(FallingObject::new("A", Vec2::new(200.0, 200.0), Vec2::ZERO, 240.0, 50.0));
        let mut surface = VertexBatch::new(SCREEN);
        let mut text = BlockGlyphs::new(100.0);
        objects.draw(&mut surface, &mut text, GameMode::Alphabet, Some("A"), Vec2::new(3.0, 0.0));

        let rect = objects.get(0).unwrap().rect;
        assert_eq!(rect.center(), Vec2::new(203.0, 200.0));
        assert_eq!(surface.text_runs().len(), 1);
        assert_eq!(surface.text_runs()[0].color, colors::TARGET.to_rgba(255));
    }

    #[test]
    fn test_push_is_radial_and_enables_bounce() {
        let mut objects = set();
        objects.insert(FallingObject::new("A", Vec2::new(175.0, 100.0), Vec2::ZERO, 240.0, 50.0));
        objects.insert(FallingObject::new("B", Vec2::new(400.0, 100.0), Vec2::ZERO, 240.0, 50.0));
        objects.apply_push(Vec2::new(100.0, 100.0), PUSH_RADIUS);

        let near = objects.get(0).unwrap();
        assert!((near.vel.x - 7.5).abs() < 1e-5);
        assert!(near.can_bounce);
        let far = objects.get(1).unwrap();
        assert_eq!(far.vel, Vec2::ZERO);
        assert!(!far.can_bounce);
    }

    #[test]
    fn test_throttled_collisions() {
        let mut objects = FallingObjectSet::new(SCREEN, 2, rng::stream(5, 0));
        objects.insert(FallingObject::new("A", Vec2::new(400.0, 400.0), Vec2::X, 240.0, 50.0));
        objects.insert(FallingObject::new("B", Vec2::new(450.0, 400.0), -Vec2::X, 240.0, 50.0));
        assert_eq!(objects.resolve_collisions(1), 0);
        assert_eq!(objects.resolve_collisions(2), 1);
    }

    proptest! {
        #[test]
        fn prop_wall_bounce_reflects_with_dampening(
            speed in 0.1f32..20.0,
            y in 200.0f32..600.0,
            seed in any::<u64>(),
        ) {
            let mut rng = rng::stream(seed, 0);
            let mut left = FallingObject::new("A", Vec2::new(110.0, y), Vec2::new(-speed, 0.0), 240.0, 50.0);
            left.can_bounce = true;
            left.bounce(SCREEN, &mut rng);
            prop_assert!((left.vel.x - speed * BOUNCE_DAMPENING).abs() < 1e-4);

            let mut right = FallingObject::new("A", Vec2::new(890.0, y), Vec2::new(speed, 0.0), 240.0, 50.0);
            right.can_bounce = true;
            right.bounce(SCREEN, &mut rng);
            prop_assert!((right.vel.x + speed * BOUNCE_DAMPENING).abs() < 1e-4);

            let mut bottom = FallingObject::new("A", Vec2::new(500.0, 700.0), Vec2::new(0.0, speed), 240.0, 50.0);
            bottom.can_bounce = true;
            bottom.bounce(SCREEN, &mut rng);
            prop_assert!((bottom.vel.y + speed * BOUNCE_DAMPENING).abs() < 1e-4);
        }
    }
}
