//! Distance constraints between particles.

use crate::particle::Particle;

/// Default relaxation strength of mesh springs.
pub const DEFAULT_STRENGTH: f32 = 0.5;

/// A distance constraint between two particles of the same mesh.
///
/// Endpoints are indices into the mesh's particle list; the spring does not
/// own them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// Index of the first endpoint.
    pub a: usize,
    /// Index of the second endpoint.
    pub b: usize,
    /// Distance the spring tries to restore, measured at construction.
    pub rest_length: f32,
    /// Fraction of the correction applied per pass, in `(0, 1]`.
    pub strength: f32,
}

impl Spring {
    /// Connect `a` and `b`, using their current distance as rest length.
    pub fn new(particles: &[Particle], a: usize, b: usize, strength: f32) -> Self {
        Self {
            a,
            b,
            rest_length: particles[a].position.distance(particles[b].position),
            strength: strength.clamp(f32::EPSILON, 1.0),
        }
    }

    /// Run one relaxation pass on this spring.
    ///
    /// Coincident endpoints are skipped. Pinned endpoints are not displaced,
    /// and the free endpoint only receives its own half of the correction.
    #[inline]
    pub fn relax(&self, particles: &mut [Particle]) {
        let pa = particles[self.a];
        let pb = particles[self.b];

        let delta = pb.position - pa.position;
        let distance = delta.length();
        if distance == 0.0 {
            return;
        }

        let diff = (self.rest_length - distance) / distance / 2.0;
        let offset = delta * diff * self.strength;

        if !pa.pinned {
            particles[self.a].position -= offset;
        }
        if !pb.pinned {
            particles[self.b].position += offset;
        }
    }

    /// Signed deviation from the rest length (positive = stretched).
    pub fn stretch(&self, particles: &[Particle]) -> f32 {
        particles[self.a].position.distance(particles[self.b].position) - self.rest_length
    }
}
