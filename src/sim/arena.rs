//! Fixed-capacity disc physics
//!
//! Every disc lives in a slot of a preallocated table. Slots are handed out
//! from a LIFO free-list, so allocate/release are O(1) and indices get reused
//! without fragmentation. Motion is position-based (Verlet): velocity is the
//! displacement since the previous step, damped by friction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lerp;
use crate::tuning::PhysicsTuning;

/// Overlaps closer than this are treated as coincident centers and skipped
const MIN_SEPARATION_SQ: f32 = 0.0001;

/// Index of a slot in the particle table.
///
/// Valid from [`PhysicsArena::allocate`] until [`PhysicsArena::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicsHandle(u32);

impl PhysicsHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned walls of the play field (y-up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Bounds {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Push a disc center back so the whole disc is inside the walls
    #[inline]
    pub fn clamp_disc(&self, mut pos: Vec2, radius: f32) -> Vec2 {
        if pos.y - radius < self.bottom {
            pos.y = self.bottom + radius;
        }
        if pos.y + radius > self.top {
            pos.y = self.top - radius;
        }
        if pos.x - radius < self.left {
            pos.x = self.left + radius;
        }
        if pos.x + radius > self.right {
            pos.x = self.right - radius;
        }
        pos
    }
}

/// One slot of the particle table
#[derive(Debug, Clone, Copy, Default)]
pub struct Particle {
    pub active: bool,
    /// Pinned: not integrated, absorbs no collision correction
    pub is_static: bool,
    /// Latched once the disc has come to rest
    pub settled: bool,
    pub radius: f32,
    pub position: Vec2,
    pub previous_position: Vec2,
    pub render_start_position: Vec2,
    pub render_end_position: Vec2,
    /// Degrees, unbounded
    pub rotation: f32,
    pub render_start_rotation: f32,
    pub render_end_rotation: f32,
}

/// Fixed-capacity table of discs with a free-list of slot indices
#[derive(Debug, Clone)]
pub struct PhysicsArena {
    particles: Vec<Particle>,
    free: Vec<u32>,
    params: PhysicsTuning,
}

impl PhysicsArena {
    pub fn new(params: PhysicsTuning) -> Self {
        let capacity = params.capacity;
        // Pushed in reverse so slot 0 is handed out first
        let free = (0..capacity as u32).rev().collect();
        Self {
            particles: vec![Particle::default(); capacity],
            free,
            params,
        }
    }

    pub fn params(&self) -> &PhysicsTuning {
        &self.params
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Number of slots currently handed out
    pub fn active_count(&self) -> usize {
        self.particles.len() - self.free.len()
    }

    /// Take a free slot, or `None` when the pool is full
    pub fn allocate(&mut self) -> Option<PhysicsHandle> {
        self.free.pop().map(PhysicsHandle)
    }

    /// Return a slot to the free-list and deactivate it
    pub fn release(&mut self, handle: PhysicsHandle) {
        let slot = &mut self.particles[handle.index()];
        debug_assert!(slot.active, "double release of physics slot {}", handle.0);
        if !slot.active && self.free.contains(&handle.0) {
            log::error!("Ignoring double release of physics slot {}", handle.0);
            return;
        }
        slot.active = false;
        slot.settled = false;
        self.free.push(handle.0);
    }

    /// Reset a freshly allocated slot to rest at `position`
    pub fn initialize(&mut self, handle: PhysicsHandle, position: Vec2, radius: f32) {
        self.particles[handle.index()] = Particle {
            active: true,
            is_static: false,
            settled: false,
            radius,
            position,
            previous_position: position,
            render_start_position: position,
            render_end_position: position,
            rotation: 0.0,
            render_start_rotation: 0.0,
            render_end_rotation: 0.0,
        };
    }

    #[inline]
    fn live(&self, handle: PhysicsHandle) -> &Particle {
        let p = &self.particles[handle.index()];
        debug_assert!(p.active, "stale physics handle {}", handle.0);
        p
    }

    #[inline]
    fn live_mut(&mut self, handle: PhysicsHandle) -> &mut Particle {
        let p = &mut self.particles[handle.index()];
        debug_assert!(p.active, "stale physics handle {}", handle.0);
        p
    }

    pub fn set_static(&mut self, handle: PhysicsHandle, is_static: bool) {
        self.live_mut(handle).is_static = is_static;
    }

    pub fn set_radius(&mut self, handle: PhysicsHandle, radius: f32) {
        self.live_mut(handle).radius = radius;
    }

    pub fn position(&self, handle: PhysicsHandle) -> Vec2 {
        self.live(handle).position
    }

    pub fn radius(&self, handle: PhysicsHandle) -> f32 {
        self.live(handle).radius
    }

    pub fn rotation(&self, handle: PhysicsHandle) -> f32 {
        self.live(handle).rotation
    }

    pub fn is_static(&self, handle: PhysicsHandle) -> bool {
        self.live(handle).is_static
    }

    pub fn is_settled(&self, handle: PhysicsHandle) -> bool {
        self.live(handle).settled
    }

    /// Position between the last two fixed steps, `alpha` in [0, 1]
    pub fn interpolated_position(&self, handle: PhysicsHandle, alpha: f32) -> Vec2 {
        let p = self.live(handle);
        p.render_start_position.lerp(p.render_end_position, alpha)
    }

    /// Rotation (degrees) between the last two fixed steps
    pub fn interpolated_rotation(&self, handle: PhysicsHandle, alpha: f32) -> f32 {
        let p = self.live(handle);
        lerp(p.render_start_rotation, p.render_end_rotation, alpha)
    }

    /// Advance every active disc by one fixed step
    pub fn step(&mut self, dt: f32, bounds: Bounds) {
        let gravity = Vec2::new(0.0, self.params.gravity);
        let friction = self.params.friction;

        for p in self.particles.iter_mut().filter(|p| p.active) {
            p.render_start_position = p.position;
            p.render_start_rotation = p.rotation;
        }

        // Semi-implicit Verlet
        for p in self.particles.iter_mut().filter(|p| p.active && !p.is_static) {
            let current = p.position;
            let velocity = (current - p.previous_position) * friction;
            p.previous_position = current;
            p.position = current + velocity + gravity * (dt * dt);
        }

        for _ in 0..self.params.constraint_iterations {
            self.clamp_to_bounds(bounds);
            self.resolve_overlaps();
        }
        self.clamp_to_bounds(bounds);

        // Rolling contact: horizontal slide turns the disc
        for p in self.particles.iter_mut().filter(|p| p.active && !p.is_static) {
            let dx = p.position.x - p.previous_position.x;
            p.rotation += -(dx / p.radius).to_degrees();
        }

        for p in self.particles.iter_mut().filter(|p| p.active) {
            p.render_end_position = p.position;
            p.render_end_rotation = p.rotation;
        }
    }

    fn clamp_to_bounds(&mut self, bounds: Bounds) {
        for p in self.particles.iter_mut().filter(|p| p.active && !p.is_static) {
            p.position = bounds.clamp_disc(p.position, p.radius);
        }
    }

    /// One O(n²) relaxation pass over all active pairs
    fn resolve_overlaps(&mut self) {
        let push_factor = self.params.push_factor;
        let max_push = self.params.max_push_distance;
        let n = self.particles.len();

        for i in 0..n {
            if !self.particles[i].active {
                continue;
            }
            for j in (i + 1)..n {
                let (a, b) = (self.particles[i], self.particles[j]);
                if !b.active || (a.is_static && b.is_static) {
                    continue;
                }

                let diff = a.position - b.position;
                let dist_sq = diff.length_squared();
                let min_dist = a.radius + b.radius;
                if dist_sq >= min_dist * min_dist || dist_sq <= MIN_SEPARATION_SQ {
                    continue;
                }

                let dist = dist_sq.sqrt();
                let normal = diff / dist;
                let push = ((min_dist - dist) * push_factor).min(max_push);
                let correction = normal * push;

                match (a.is_static, b.is_static) {
                    (false, false) => {
                        self.particles[i].position += correction * 0.5;
                        self.particles[j].position -= correction * 0.5;
                    }
                    (false, true) => self.particles[i].position += correction,
                    (true, false) => self.particles[j].position -= correction,
                    (true, true) => {}
                }
            }
        }
    }

    /// Collect indices of active discs whose center is within `radius` of `center`.
    ///
    /// Indices carry no ownership; callers resolve them through the piece registry.
    pub fn query_radius(&self, center: Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        let radius_sq = radius * radius;
        out.extend(
            self.particles
                .iter()
                .enumerate()
                .filter(|(_, p)| p.active && p.position.distance_squared(center) <= radius_sq)
                .map(|(i, _)| i),
        );
    }

    /// Latch discs that barely moved during the last step as settled.
    ///
    /// The threshold is half a frame of gravity, so a disc released from rest
    /// is not considered settled on its first step.
    pub fn mark_settled(&mut self, dt: f32) {
        let threshold = 0.5 * self.params.gravity.abs() * dt * dt;
        let threshold_sq = threshold * threshold;
        for p in self.particles.iter_mut().filter(|p| p.active && !p.settled) {
            if (p.position - p.previous_position).length_squared() < threshold_sq {
                p.settled = true;
            }
        }
    }

    /// Whether any settled disc pokes above `dead_line`
    pub fn exists_above_deadline(&self, dead_line: f32) -> bool {
        self.particles
            .iter()
            .any(|p| p.active && p.settled && p.position.y + p.radius > dead_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PhysicsTuning {
        PhysicsTuning {
            capacity: 4,
            ..PhysicsTuning::default()
        }
    }

    fn wide() -> Bounds {
        Bounds::new(-100.0, 100.0, -100.0, 100.0)
    }

    #[test]
    fn test_allocate_until_full() {
        let mut arena = PhysicsArena::new(params());
        let handles: Vec<_> = (0..4).map(|_| arena.allocate()).collect();
        assert!(handles.iter().all(Option::is_some));
        assert_eq!(handles[0].map(PhysicsHandle::index), Some(0));
        assert!(arena.allocate().is_none());
        assert_eq!(arena.active_count(), 4);
    }

    #[test]
    fn test_release_then_reuse() {
        let mut arena = PhysicsArena::new(params());
        let h = arena.allocate().unwrap();
        arena.initialize(h, Vec2::ZERO, 1.0);
        let _other = arena.allocate().unwrap();
        arena.release(h);
        assert_eq!(arena.allocate(), Some(h));
    }

    #[test]
    fn test_static_disc_does_not_fall() {
        let mut arena = PhysicsArena::new(params());
        let h = arena.allocate().unwrap();
        arena.initialize(h, Vec2::new(0.0, 10.0), 1.0);
        arena.set_static(h, true);
        for _ in 0..10 {
            arena.step(0.02, wide());
        }
        assert_eq!(arena.position(h), Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_falls_and_rests_on_floor() {
        let mut arena = PhysicsArena::new(params());
        let h = arena.allocate().unwrap();
        arena.initialize(h, Vec2::new(0.0, 5.0), 0.5);
        let bounds = Bounds::new(-5.0, 5.0, 0.0, 10.0);
        for _ in 0..500 {
            arena.step(0.02, bounds);
        }
        assert!((arena.position(h).y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_overlap_pushed_apart() {
        let mut p = params();
        p.gravity = 0.0;
        let mut arena = PhysicsArena::new(p);
        let a = arena.allocate().unwrap();
        let b = arena.allocate().unwrap();
        arena.initialize(a, Vec2::new(0.0, 0.0), 1.0);
        arena.initialize(b, Vec2::new(1.0, 0.0), 1.0);

        let mut last_overlap = 2.0 - 1.0;
        for _ in 0..200 {
            arena.step(0.02, wide());
            let overlap = 2.0 - arena.position(a).distance(arena.position(b));
            assert!(overlap <= last_overlap + 1e-6);
            last_overlap = overlap;
        }
        assert!(last_overlap < 1e-3);
    }

    #[test]
    fn test_static_partner_absorbs_nothing() {
        let mut p = params();
        p.gravity = 0.0;
        let mut arena = PhysicsArena::new(p);
        let pinned = arena.allocate().unwrap();
        let free = arena.allocate().unwrap();
        arena.initialize(pinned, Vec2::ZERO, 1.0);
        arena.initialize(free, Vec2::new(1.5, 0.0), 1.0);
        arena.set_static(pinned, true);
        arena.step(0.02, wide());
        assert_eq!(arena.position(pinned), Vec2::ZERO);
        assert!(arena.position(free).x > 1.5);
    }

    #[test]
    fn test_rolling_rotation_sign() {
        let mut p = params();
        p.gravity = 0.0;
        p.friction = 1.0;
        let mut arena = PhysicsArena::new(p);
        let h = arena.allocate().unwrap();
        arena.initialize(h, Vec2::ZERO, 1.0);
        // Give it a rightward velocity
        arena.particles[h.index()].previous_position = Vec2::new(-0.1, 0.0);
        arena.step(0.02, wide());
        // Moving right rolls clockwise (negative degrees)
        assert!(arena.rotation(h) < 0.0);
        assert!((arena.rotation(h) + 0.1_f32.to_degrees()).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_between_snapshots() {
        let mut p = params();
        p.friction = 1.0;
        p.gravity = 0.0;
        let mut arena = PhysicsArena::new(p);
        let h = arena.allocate().unwrap();
        arena.initialize(h, Vec2::ZERO, 1.0);
        arena.particles[h.index()].previous_position = Vec2::new(-1.0, 0.0);
        arena.step(0.02, wide());
        let mid = arena.interpolated_position(h, 0.5);
        assert!((mid.x - 0.5).abs() < 1e-5);
        assert_eq!(arena.interpolated_position(h, 1.0), arena.position(h));
    }

    #[test]
    fn test_query_radius() {
        let mut arena = PhysicsArena::new(params());
        for (i, x) in [0.0, 1.0, 5.0].into_iter().enumerate() {
            let h = arena.allocate().unwrap();
            assert_eq!(h.index(), i);
            arena.initialize(h, Vec2::new(x, 0.0), 0.1);
        }
        let mut out = vec![99];
        arena.query_radius(Vec2::ZERO, 2.0, &mut out);
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn test_settle_latch_and_deadline() {
        let mut arena = PhysicsArena::new(params());
        let h = arena.allocate().unwrap();
        let bounds = Bounds::new(-5.0, 5.0, 0.0, 3.0);
        arena.initialize(h, Vec2::new(0.0, 2.0), 1.0);

        // First step from rest moves a full frame of gravity: not settled
        arena.step(0.02, bounds);
        arena.mark_settled(0.02);
        assert!(!arena.is_settled(h));
        assert!(!arena.exists_above_deadline(1.5));

        // Resting on the floor its top edge sits at 2.0
        for _ in 0..300 {
            arena.step(0.02, bounds);
            arena.mark_settled(0.02);
        }
        assert!(arena.is_settled(h));
        assert!(arena.exists_above_deadline(1.5));
        assert!(!arena.exists_above_deadline(2.5));

        arena.release(h);
        assert!(!arena.exists_above_deadline(1.5));
    }
}
