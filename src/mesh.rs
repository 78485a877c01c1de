//! The fabric grid.
//!
//! A [`Mesh`] is a `cols × rows` lattice of particles stored row-major,
//! braced by four families of springs:
//!
//! ```text
//!   o---o      horizontal  (col, row) -> (col + 1, row)
//!   |\ /|      vertical    (col, row) -> (col, row + 1)
//!   | X |      diagonal    (col, row) -> (col + 1, row + 1)
//!   |/ \|      anti-diag   (col, row) -> (col - 1, row + 1)
//!   o---o
//! ```
//!
//! Every particle on the outer border is pinned. Meshes are never resized in
//! place: a viewport change builds a new one.

use glam::Vec2;

use crate::particle::Particle;
use crate::spring::Spring;

/// Smallest grid dimension; a mesh always has at least a 2×2 frame.
pub const MIN_DIMENSION: usize = 2;

/// A rectangular particle-spring grid.
#[derive(Debug, Clone)]
pub struct Mesh {
    cols: usize,
    rows: usize,
    spacing: Vec2,
    particles: Vec<Particle>,
    springs: Vec<Spring>,
}

impl Mesh {
    /// Build a grid with the given dimensions and particle spacing.
    ///
    /// Dimensions below [`MIN_DIMENSION`] are raised to it.
    pub fn new(cols: usize, rows: usize, spacing: Vec2, strength: f32) -> Self {
        let cols = cols.max(MIN_DIMENSION);
        let rows = rows.max(MIN_DIMENSION);

        let mut particles = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let position = Vec2::new(col as f32 * spacing.x, row as f32 * spacing.y);
                let border = row == 0 || row == rows - 1 || col == 0 || col == cols - 1;
                particles.push(if border {
                    Particle::pinned(position)
                } else {
                    Particle::new(position)
                });
            }
        }

        let mut springs = Vec::with_capacity(Self::spring_count(cols, rows));
        for row in 0..rows {
            for col in 0..cols {
                let i = row * cols + col;
                if col + 1 < cols {
                    springs.push(Spring::new(&particles, i, i + 1, strength));
                }
                if row + 1 < rows {
                    springs.push(Spring::new(&particles, i, i + cols, strength));
                }
                if col + 1 < cols && row + 1 < rows {
                    springs.push(Spring::new(&particles, i, i + cols + 1, strength));
                }
                if col > 0 && row + 1 < rows {
                    springs.push(Spring::new(&particles, i, i + cols - 1, strength));
                }
            }
        }

        Self {
            cols,
            rows,
            spacing,
            particles,
            springs,
        }
    }

    /// Build a grid that exactly covers a `width × height` viewport.
    ///
    /// The column count is `floor(width / target_spacing)` (likewise for
    /// rows), and the spacing is then stretched so the outermost particles
    /// sit on the viewport edges.
    pub fn fit_viewport(width: f32, height: f32, target_spacing: f32, strength: f32) -> Self {
        let target = target_spacing.max(1.0);
        let cols = ((width / target).floor().max(0.0) as usize).max(MIN_DIMENSION);
        let rows = ((height / target).floor().max(0.0) as usize).max(MIN_DIMENSION);
        let spacing = Vec2::new(
            width.max(0.0) / (cols - 1) as f32,
            height.max(0.0) / (rows - 1) as f32,
        );

        log::debug!(
            "fitting {}x{} mesh to {}x{} viewport (spacing {:.2}, {:.2})",
            cols,
            rows,
            width,
            height,
            spacing.x,
            spacing.y
        );

        Self::new(cols, rows, spacing, strength)
    }

    /// Number of springs a `cols × rows` grid is braced with.
    pub fn spring_count(cols: usize, rows: usize) -> usize {
        let (c, r) = (cols.saturating_sub(1), rows.saturating_sub(1));
        c * rows + r * cols + 2 * c * r
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Distance between neighbouring grid positions.
    #[inline]
    pub fn spacing(&self) -> Vec2 {
        self.spacing
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    #[inline]
    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    /// Row-major index of the particle at `(col, row)`.
    pub fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    /// Undeformed lattice position of `(col, row)`.
    pub fn grid_position(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(col as f32 * self.spacing.x, row as f32 * self.spacing.y)
    }

    /// Run `iterations` relaxation passes over every spring.
    pub fn relax(&mut self, iterations: u32) {
        for _ in 0..iterations {
            for spring in &self.springs {
                spring.relax(&mut self.particles);
            }
        }
    }

    /// Reset every free particle to its rest position with zero velocity.
    pub fn iron_all(&mut self) {
        for particle in &mut self.particles {
            particle.reset_to_rest();
        }
    }

    /// Indices of particles within `radius` of `point` (inclusive).
    pub fn within(&self, point: Vec2, radius: f32) -> impl Iterator<Item = usize> + '_ {
        within(&self.particles, point, radius)
    }

    /// Grid cells as `[top_left, top_right, bottom_right, bottom_left]` indices.
    pub fn cells(&self) -> impl Iterator<Item = [usize; 4]> + '_ {
        let cols = self.cols;
        (0..self.rows - 1).flat_map(move |row| {
            (0..cols - 1).map(move |col| {
                let tl = row * cols + col;
                [tl, tl + 1, tl + cols + 1, tl + cols]
            })
        })
    }
}

/// Indices into `particles` of those within `radius` of `point` (inclusive).
pub fn within(particles: &[Particle], point: Vec2, radius: f32) -> impl Iterator<Item = usize> + '_ {
    particles
        .iter()
        .enumerate()
        .filter(move |(_, p)| p.position.distance(point) <= radius)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spring::DEFAULT_STRENGTH;

    fn grid(cols: usize, rows: usize) -> Mesh {
        Mesh::new(cols, rows, Vec2::splat(10.0), DEFAULT_STRENGTH)
    }

    #[test]
    fn test_5x5_pins_exactly_the_border() {
        let mesh = grid(5, 5);
        for row in 0..5 {
            for col in 0..5 {
                let p = &mesh.particles()[mesh.index(col, row).unwrap()];
                let border = col == 0 || col == 4 || row == 0 || row == 4;
                assert_eq!(p.pinned, border, "({}, {})", col, row);
            }
        }
        assert_eq!(mesh.particles().iter().filter(|p| p.pinned).count(), 16);
    }

    #[test]
    fn test_5x5_spring_count() {
        let mesh = grid(5, 5);
        assert_eq!(mesh.springs().len(), 4 * 5 + 4 * 5 + 2 * 4 * 4);
        assert_eq!(mesh.springs().len(), Mesh::spring_count(5, 5));
    }

    #[test]
    fn test_non_square_spring_count() {
        let mesh = grid(7, 3);
        assert_eq!(mesh.springs().len(), 6 * 3 + 2 * 7 + 2 * 6 * 2);
    }

    #[test]
    fn test_spring_rest_lengths() {
        let mesh = grid(3, 3);
        let diagonal = (200.0f32).sqrt();
        for spring in mesh.springs() {
            let ok = (spring.rest_length - 10.0).abs() < 1e-5
                || (spring.rest_length - diagonal).abs() < 1e-4;
            assert!(ok, "unexpected rest length {}", spring.rest_length);
        }
    }

    #[test]
    fn test_minimum_dimensions() {
        let mesh = grid(0, 1);
        assert_eq!(mesh.cols(), 2);
        assert_eq!(mesh.rows(), 2);
        assert!(mesh.particles().iter().all(|p| p.pinned));
    }

    #[test]
    fn test_fit_viewport_covers_edges() {
        let mesh = Mesh::fit_viewport(300.0, 150.0, 15.0, DEFAULT_STRENGTH);
        assert_eq!(mesh.cols(), 20);
        assert_eq!(mesh.rows(), 10);

        let last = mesh.particles()[mesh.particles().len() - 1].position;
        assert!((last.x - 300.0).abs() < 1e-3);
        assert!((last.y - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_index_bounds() {
        let mesh = grid(4, 3);
        assert_eq!(mesh.index(3, 2), Some(11));
        assert_eq!(mesh.index(4, 0), None);
        assert_eq!(mesh.index(0, 3), None);
    }

    #[test]
    fn test_within_is_inclusive() {
        let mesh = grid(3, 3);
        let hits: Vec<usize> = mesh.within(Vec2::new(10.0, 10.0), 10.0).collect();
        assert_eq!(hits, vec![1, 3, 4, 5, 7]);
    }

    #[test]
    fn test_cells() {
        let mesh = grid(3, 3);
        let cells: Vec<[usize; 4]> = mesh.cells().collect();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], [0, 1, 4, 3]);
        assert_eq!(cells[3], [4, 5, 8, 7]);
    }

    #[test]
    fn test_relax_keeps_pinned_and_iron_all_restores() {
        let mut mesh = grid(4, 4);
        let before: Vec<Particle> = mesh.particles().to_vec();
        let center = mesh.index(1, 1).unwrap();
        mesh.particles_mut()[center].position += Vec2::new(6.0, -4.0);

        mesh.relax(3);

        for (p, b) in mesh.particles().iter().zip(&before) {
            if p.pinned {
                assert_eq!(p.position, b.position);
            }
        }

        mesh.iron_all();
        for (p, b) in mesh.particles().iter().zip(&before) {
            assert_eq!(p.position, b.rest);
            assert_eq!(p.velocity(), Vec2::ZERO);
        }
    }
}
