//! Verlet point masses.
//!
//! A [`Particle`] never stores its velocity. Velocity is reconstructed every
//! step from the difference between the current and previous position, so
//! writing the same value into both (see [`Particle::teleport`]) cancels any
//! momentum the particle had.

use glam::Vec2;

use crate::config::PhysicsConfig;

/// A point mass in the fabric mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Current position in viewport units.
    pub position: Vec2,
    /// Position at the previous step.
    pub previous: Vec2,
    /// Rest position the particle returns to when ironed.
    pub rest: Vec2,
    /// Pinned particles are anchors: integration and relaxation never move them.
    pub pinned: bool,
}

impl Particle {
    /// Create a free particle at rest at `position`.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            previous: position,
            rest: position,
            pinned: false,
        }
    }

    /// Create a pinned anchor at `position`.
    pub fn pinned(position: Vec2) -> Self {
        Self {
            pinned: true,
            ..Self::new(position)
        }
    }

    /// Advance one damped Verlet step.
    ///
    /// Pinned particles are left untouched. Callers skip particles that are
    /// held by an interaction this frame.
    #[inline]
    pub fn integrate(&mut self, physics: &PhysicsConfig) {
        if self.pinned {
            return;
        }

        let velocity = (self.position - self.previous) * physics.damping;
        self.previous = self.position;
        self.position += velocity + Vec2::new(0.0, physics.gravity);
    }

    /// Move to `target` with zero velocity.
    ///
    /// This is a direct assignment and bypasses the pinned flag: a pinned
    /// particle grabbed by a normal drag follows the pointer.
    #[inline]
    pub fn teleport(&mut self, target: Vec2) {
        self.position = target;
        self.previous = target;
    }

    /// Snap back to the rest position with zero velocity.
    #[inline]
    pub fn reset_to_rest(&mut self) {
        if !self.pinned {
            self.teleport(self.rest);
        }
    }

    /// Move the particle and make the new position its rest state.
    pub fn set_rest(&mut self, rest: Vec2) {
        self.rest = rest;
        self.teleport(rest);
    }

    /// Implicit velocity, `position - previous`.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.position - self.previous
    }

    /// Distance from the rest position.
    #[inline]
    pub fn displacement(&self) -> f32 {
        self.position.distance(self.rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_from_rest_falls_by_gravity() {
        let physics = PhysicsConfig::default();
        let mut p = Particle::new(Vec2::new(10.0, 20.0));

        p.integrate(&physics);

        assert_eq!(p.position.x, 10.0);
        assert!((p.position.y - 20.0 - physics.gravity).abs() < 1e-6);
        assert_eq!(p.previous, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_integrate_applies_damping() {
        let physics = PhysicsConfig::default();
        let mut p = Particle::new(Vec2::ZERO);
        p.previous = Vec2::new(-1.0, 0.0);

        p.integrate(&physics);

        assert!((p.position.x - 0.99).abs() < 1e-6);
        assert!((p.position.y - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_pinned_never_moves() {
        let physics = PhysicsConfig::default();
        let mut p = Particle::pinned(Vec2::new(3.0, 4.0));
        p.previous = Vec2::new(0.0, 0.0);

        for _ in 0..100 {
            p.integrate(&physics);
        }

        assert_eq!(p.position, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_teleport_zeroes_velocity() {
        let physics = PhysicsConfig::default();
        let mut p = Particle::new(Vec2::ZERO);
        p.previous = Vec2::new(-5.0, -5.0);

        p.teleport(Vec2::new(1.0, 1.0));
        assert_eq!(p.velocity(), Vec2::ZERO);

        p.integrate(&physics);
        assert_eq!(p.position.x, 1.0);
    }

    #[test]
    fn test_teleport_moves_pinned() {
        let mut p = Particle::pinned(Vec2::ZERO);
        p.teleport(Vec2::new(2.0, 2.0));
        assert_eq!(p.position, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_reset_to_rest() {
        let mut p = Particle::new(Vec2::new(5.0, 5.0));
        p.position = Vec2::new(9.0, 1.0);
        p.previous = Vec2::new(8.0, 0.0);

        assert!((p.displacement() - (16.0f32 + 16.0).sqrt()).abs() < 1e-5);

        p.reset_to_rest();
        assert_eq!(p.position, p.rest);
        assert_eq!(p.velocity(), Vec2::ZERO);
        assert_eq!(p.displacement(), 0.0);
    }
}
